//! The playback engine seam.
//!
//! [`AudioPlayer`](crate::AudioPlayer) drives an [`AudioPlayerWrapper`] and
//! learns about everything that happens inside it through
//! [`AudioPlayerWrapperDelegate`] callbacks.

use crate::error::PlaybackError;
use crate::item::LoadOptions;
use std::path::PathBuf;
use std::sync::Weak;
use std::time::Duration;
use url::Url;

/// Engine state. Only the engine transitions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioPlayerState {
    /// Nothing loaded.
    #[default]
    Idle,
    /// Media is being acquired.
    Loading,
    /// Media is loaded and can play.
    Ready,
    /// Audio is playing.
    Playing,
    /// Audio is paused.
    Paused,
    /// Playback stopped, on request or at the end of the media.
    Stopped,
    /// The engine failed to load or play the media.
    Failed,
}

/// How the engine preserves pitch when the rate is not `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimePitchAlgorithm {
    /// Cheap, low latency. Suited to fast scrubbing.
    LowQualityZeroLatency,
    /// Good for speech.
    #[default]
    TimeDomain,
    /// Highest quality, most expensive.
    Spectral,
    /// No pitch correction; pitch follows the rate.
    Varispeed,
}

/// How often the engine reports elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeEventFrequency {
    /// Once per second.
    #[default]
    EverySecond,
    /// Twice per second.
    EveryHalfSecond,
    /// Four times per second.
    EveryQuarterSecond,
    /// A custom interval.
    Custom(Duration),
}

impl TimeEventFrequency {
    /// The interval between two time events.
    #[must_use]
    pub const fn interval(self) -> Duration {
        match self {
            Self::EverySecond => Duration::from_secs(1),
            Self::EveryHalfSecond => Duration::from_millis(500),
            Self::EveryQuarterSecond => Duration::from_millis(250),
            Self::Custom(interval) => interval,
        }
    }
}

/// A resolved media locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// A remote stream.
    Remote(Url),
    /// A file on the local file system.
    File(PathBuf),
}

impl std::fmt::Display for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Everything the engine needs to start loading an item.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    /// Where to read the media from.
    pub source: MediaSource,
    /// Start playing as soon as the media is ready.
    pub play_when_ready: bool,
    /// Position, in seconds, to start from.
    pub initial_time: Option<f64>,
    /// Item-supplied options for acquiring the media.
    pub options: Option<LoadOptions>,
}

/// A single piece of timed metadata found in the media.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimedMetadata {
    /// Metadata key, e.g. `StreamTitle`.
    pub key: String,
    /// Metadata value.
    pub value: String,
}

/// Callbacks from the engine into its owner.
///
/// Callbacks may arrive on any thread, including the one that called into
/// the engine.
pub trait AudioPlayerWrapperDelegate: Send + Sync {
    /// The engine changed state.
    fn state_did_change(&self, state: AudioPlayerState);
    /// Playback advanced to `seconds`.
    fn seconds_elapsed(&self, seconds: f64);
    /// The engine failed.
    fn did_fail(&self, error: Option<PlaybackError>);
    /// A seek to `seconds` completed.
    fn seek_did_complete(&self, seconds: f64, did_finish: bool);
    /// The duration of the current media became known.
    fn did_update_duration(&self, duration: f64);
    /// The media carried timed metadata.
    fn did_receive_metadata(&self, metadata: Vec<TimedMetadata>);
    /// The engine reached the end of the media.
    fn did_play_to_end(&self);
    /// The engine recreated its output internally.
    fn did_recreate_engine(&self);
}

/// A playback engine.
///
/// Implementations report asynchronously through the delegate installed with
/// [`set_delegate`](Self::set_delegate). The delegate is a non-owning back
/// reference; calls on a dropped delegate are silently discarded.
pub trait AudioPlayerWrapper: Send + Sync {
    /// Install the delegate that receives engine callbacks.
    fn set_delegate(&self, delegate: Weak<dyn AudioPlayerWrapperDelegate>);

    /// Current engine state.
    fn state(&self) -> AudioPlayerState;

    /// Whether playback starts automatically once the media is ready.
    fn play_when_ready(&self) -> bool;
    /// Set whether playback starts automatically once the media is ready.
    fn set_play_when_ready(&self, play_when_ready: bool);

    /// Current position in seconds.
    fn current_time(&self) -> f64;
    /// Duration of the current media in seconds, `0.0` when unknown.
    fn duration(&self) -> f64;
    /// How far the media is buffered, in seconds.
    fn buffered_position(&self) -> f64;

    /// Live playback rate; `0.0` whenever the engine is not playing.
    fn rate(&self) -> f32;
    /// Set the playback rate.
    fn set_rate(&self, rate: f32);

    /// Output volume in `0.0..=1.0`.
    fn volume(&self) -> f32;
    /// Set the output volume.
    fn set_volume(&self, volume: f32);
    /// Whether output is muted.
    fn is_muted(&self) -> bool;
    /// Mute or unmute output.
    fn set_muted(&self, muted: bool);

    /// Preferred forward buffer, in seconds. `0.0` lets the engine decide.
    fn buffer_duration(&self) -> f64;
    /// Set the preferred forward buffer.
    fn set_buffer_duration(&self, seconds: f64);
    /// How often elapsed time is reported.
    fn time_event_frequency(&self) -> TimeEventFrequency;
    /// Set how often elapsed time is reported.
    fn set_time_event_frequency(&self, frequency: TimeEventFrequency);
    /// Whether the engine delays playback to avoid stalls.
    fn automatically_waits_to_minimize_stalling(&self) -> bool;
    /// Set whether the engine delays playback to avoid stalls.
    fn set_automatically_waits_to_minimize_stalling(&self, value: bool);
    /// Set the pitch algorithm used when the rate is not `1.0`.
    fn set_time_pitch_algorithm(&self, algorithm: TimePitchAlgorithm);

    /// Begin loading media. Completion is reported through the delegate.
    fn load(&self, request: LoadRequest);
    /// Start or resume playback.
    fn play(&self);
    /// Pause playback.
    fn pause(&self);
    /// Toggle between playing and paused.
    fn toggle_playing(&self);
    /// Stop playback and unload the media.
    fn stop(&self);
    /// Seek to an absolute position in seconds.
    fn seek(&self, seconds: f64);
    /// Seek relative to the current position.
    fn seek_by(&self, offset: f64);
    /// Reload the current media, optionally from the current position.
    fn reload(&self, start_from_current_time: bool);
}
