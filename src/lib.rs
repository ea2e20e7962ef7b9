//! # Playkit
//!
//! Media playback for desktop applications, with the operating system's
//! "Now Playing" display and remote controls kept in sync.
//!
//! ## Features
//!
//! - `audio`: The [`AudioPlayer`](audio::AudioPlayer) facade, its `rodio`
//!   engine and the MPRIS / SMTC integrations.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! playkit = { version = "0.1", features = ["audio"] }
//! ```
//!
//! ```no_run
//! use playkit::audio::{AudioPlayer, DefaultAudioItem, SourceType};
//! use std::sync::Arc;
//!
//! let player = AudioPlayer::builder().build()?;
//! let item = DefaultAudioItem::new("https://example.com/stream.mp3", SourceType::Stream)
//!     .title("Live");
//! player.load(Arc::new(item), Some(true))?;
//! # Ok::<(), playkit::audio::AudioPlayerError>(())
//! ```

#[cfg(feature = "audio")]
pub use playkit_audio as audio;
