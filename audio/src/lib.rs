//! Audio playback facade with now-playing and remote command integration.
//!
//! This crate provides:
//! - **[`AudioPlayer`]**: loads [`AudioItem`]s into a playback engine and
//!   re-emits everything the engine reports as typed [`events`](AudioPlayerEvents)
//! - **Now playing**: keeps the system's "Now Playing" display in sync
//! - **Remote commands**: routes media keys and lock screen controls back
//!   into the player
//!
//! Playback uses `rodio` by default. The system integration is MPRIS on Linux
//! and `SystemMediaTransportControls` on Windows.

#![warn(missing_docs)]

mod engine;
mod error;
mod event;
mod item;
mod now_playing;
mod player;
mod remote;
mod shutdown;
mod sys;
mod wrapper;

pub use engine::RodioWrapper;
pub use error::{AudioPlayerError, MediaError, PlaybackError};
pub use event::{AudioPlayerEvents, Event, PlaybackEndedReason, SeekEvent, SubscriptionId};
pub use item::{
    Artwork, ArtworkHandler, ArtworkSource, AssetOptionsProviding, AudioItem, DefaultAudioItem,
    InitialTiming, LoadOptions, RemoteCommandProviding, SourceType, TimePitching, resolve_source,
};
pub use now_playing::{
    NowPlayingEntry, NowPlayingInfo, NowPlayingInfoCenter, NowPlayingInfoController,
    NowPlayingKey, NowPlayingValue,
};
pub use player::{AudioController, AudioPlayer, AudioPlayerBuilder};
pub use remote::{
    CommandOutcome, MediaCommand, RemoteCommand, RemoteCommandController, RemoteCommandKind,
    RemoteCommandRouter, find_command,
};
pub use sys::MediaCenterIntegration;
pub use wrapper::{
    AudioPlayerState, AudioPlayerWrapper, AudioPlayerWrapperDelegate, LoadRequest, MediaSource,
    TimeEventFrequency, TimePitchAlgorithm, TimedMetadata,
};

// Re-export rodio for advanced users
pub use rodio;
