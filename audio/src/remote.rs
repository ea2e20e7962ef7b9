//! Remote commands from media keys, lock screens and desktop media widgets.

use crate::sys::MediaCenterIntegration;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// A command the player can advertise to the system.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    /// Start playback.
    Play,
    /// Pause playback.
    Pause,
    /// Stop playback.
    Stop,
    /// Toggle between playing and paused.
    TogglePlayPause,
    /// Skip to the next track.
    Next,
    /// Skip to the previous track.
    Previous,
    /// Scrub to an absolute position.
    ChangePlaybackPosition,
    /// Skip forward by one of the preferred intervals, in seconds.
    SkipForward {
        /// Intervals offered to the user; the first is the default.
        preferred_intervals: Vec<f64>,
    },
    /// Skip backward by one of the preferred intervals, in seconds.
    SkipBackward {
        /// Intervals offered to the user; the first is the default.
        preferred_intervals: Vec<f64>,
    },
    /// Mark the track as liked.
    Like {
        /// Whether the feedback is currently active.
        is_active: bool,
        /// Full label.
        localized_title: String,
        /// Short label.
        localized_short_title: String,
    },
    /// Mark the track as disliked.
    Dislike {
        /// Whether the feedback is currently active.
        is_active: bool,
        /// Full label.
        localized_title: String,
        /// Short label.
        localized_short_title: String,
    },
    /// Bookmark the track.
    Bookmark {
        /// Whether the feedback is currently active.
        is_active: bool,
        /// Full label.
        localized_title: String,
        /// Short label.
        localized_short_title: String,
    },
}

/// The identity of a [`RemoteCommand`], without its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCommandKind {
    /// See [`RemoteCommand::Play`].
    Play,
    /// See [`RemoteCommand::Pause`].
    Pause,
    /// See [`RemoteCommand::Stop`].
    Stop,
    /// See [`RemoteCommand::TogglePlayPause`].
    TogglePlayPause,
    /// See [`RemoteCommand::Next`].
    Next,
    /// See [`RemoteCommand::Previous`].
    Previous,
    /// See [`RemoteCommand::ChangePlaybackPosition`].
    ChangePlaybackPosition,
    /// See [`RemoteCommand::SkipForward`].
    SkipForward,
    /// See [`RemoteCommand::SkipBackward`].
    SkipBackward,
    /// See [`RemoteCommand::Like`].
    Like,
    /// See [`RemoteCommand::Dislike`].
    Dislike,
    /// See [`RemoteCommand::Bookmark`].
    Bookmark,
}

impl RemoteCommand {
    /// Default command set: play, pause, scrubbing and 15 second skips.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::Play,
            Self::Pause,
            Self::TogglePlayPause,
            Self::ChangePlaybackPosition,
            Self::SkipForward {
                preferred_intervals: vec![15.0],
            },
            Self::SkipBackward {
                preferred_intervals: vec![15.0],
            },
        ]
    }

    /// The command's identity.
    #[must_use]
    pub const fn kind(&self) -> RemoteCommandKind {
        match self {
            Self::Play => RemoteCommandKind::Play,
            Self::Pause => RemoteCommandKind::Pause,
            Self::Stop => RemoteCommandKind::Stop,
            Self::TogglePlayPause => RemoteCommandKind::TogglePlayPause,
            Self::Next => RemoteCommandKind::Next,
            Self::Previous => RemoteCommandKind::Previous,
            Self::ChangePlaybackPosition => RemoteCommandKind::ChangePlaybackPosition,
            Self::SkipForward { .. } => RemoteCommandKind::SkipForward,
            Self::SkipBackward { .. } => RemoteCommandKind::SkipBackward,
            Self::Like { .. } => RemoteCommandKind::Like,
            Self::Dislike { .. } => RemoteCommandKind::Dislike,
            Self::Bookmark { .. } => RemoteCommandKind::Bookmark,
        }
    }

    /// The default interval of a skip command, in seconds.
    #[must_use]
    pub fn default_interval(&self) -> Option<f64> {
        match self {
            Self::SkipForward {
                preferred_intervals,
            }
            | Self::SkipBackward {
                preferred_intervals,
            } => preferred_intervals.first().copied(),
            _ => None,
        }
    }
}

/// A command received from system media controls.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MediaCommand {
    /// Play command.
    Play,
    /// Pause command.
    Pause,
    /// Toggle play/pause.
    PlayPause,
    /// Stop command.
    Stop,
    /// Skip to next track.
    Next,
    /// Skip to previous track.
    Previous,
    /// Seek to a specific position.
    Seek(Duration),
    /// Seek forward, by the given amount or the command's default interval.
    SeekForward(Option<Duration>),
    /// Seek backward, by the given amount or the command's default interval.
    SeekBackward(Option<Duration>),
    /// Like the current track.
    Like,
    /// Dislike the current track.
    Dislike,
    /// Bookmark the current track.
    Bookmark,
}

impl MediaCommand {
    /// The remote command that must be enabled for this command to be honoured.
    #[must_use]
    pub const fn required_kind(&self) -> RemoteCommandKind {
        match self {
            Self::Play => RemoteCommandKind::Play,
            Self::Pause => RemoteCommandKind::Pause,
            Self::PlayPause => RemoteCommandKind::TogglePlayPause,
            Self::Stop => RemoteCommandKind::Stop,
            Self::Next => RemoteCommandKind::Next,
            Self::Previous => RemoteCommandKind::Previous,
            Self::Seek(_) => RemoteCommandKind::ChangePlaybackPosition,
            Self::SeekForward(_) => RemoteCommandKind::SkipForward,
            Self::SeekBackward(_) => RemoteCommandKind::SkipBackward,
            Self::Like => RemoteCommandKind::Like,
            Self::Dislike => RemoteCommandKind::Dislike,
            Self::Bookmark => RemoteCommandKind::Bookmark,
        }
    }
}

/// Result of routing a [`MediaCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandOutcome {
    /// The command was carried out.
    Handled,
    /// The matching remote command is not enabled.
    Disabled,
    /// No handler is installed for this command.
    NoHandler,
    /// A handler rejected the command.
    Failed,
}

/// Enables remote commands with the system.
pub trait RemoteCommandRouter: Send + Sync {
    /// Replace the enabled command set.
    fn enable_remote_commands(&self, commands: &[RemoteCommand]);

    /// The currently enabled command set.
    fn enabled_commands(&self) -> Vec<RemoteCommand>;
}

/// Default [`RemoteCommandRouter`] that advertises commands to the platform
/// media center.
#[derive(Debug)]
pub struct RemoteCommandController {
    enabled: RwLock<Vec<RemoteCommand>>,
    media_center: Option<Arc<MediaCenterIntegration>>,
}

impl RemoteCommandController {
    /// Create a controller that advertises to `media_center`.
    #[must_use]
    pub const fn new(media_center: Arc<MediaCenterIntegration>) -> Self {
        Self {
            enabled: RwLock::new(Vec::new()),
            media_center: Some(media_center),
        }
    }

    /// Create a controller that only tracks the enabled set.
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            enabled: RwLock::new(Vec::new()),
            media_center: None,
        }
    }

    /// Find the enabled command matching `kind`.
    #[must_use]
    pub fn command(&self, kind: RemoteCommandKind) -> Option<RemoteCommand> {
        find_command(&self.enabled_commands(), kind)
    }
}

impl RemoteCommandRouter for RemoteCommandController {
    fn enable_remote_commands(&self, commands: &[RemoteCommand]) {
        log::debug!("enabling remote commands: {commands:?}");
        *self.enabled.write().unwrap_or_else(PoisonError::into_inner) = commands.to_vec();
        if let Some(media_center) = &self.media_center {
            media_center.set_enabled_commands(commands);
        }
    }

    fn enabled_commands(&self) -> Vec<RemoteCommand> {
        self.enabled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Find the command matching `kind` in `commands`.
#[must_use]
pub fn find_command(commands: &[RemoteCommand], kind: RemoteCommandKind) -> Option<RemoteCommand> {
    commands.iter().find(|c| c.kind() == kind).cloned()
}
