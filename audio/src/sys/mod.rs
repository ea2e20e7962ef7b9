//! Platform-specific media center integrations.
//!
//! - Linux: MPRIS over D-Bus
//! - Windows: `SystemMediaTransportControls`
//! - elsewhere: a no-op fallback that still queues commands injected by tests
//!   or the application

use crate::error::MediaError;
use crate::item::Artwork;
use crate::now_playing::{NowPlayingInfo, NowPlayingKey};
use crate::remote::{MediaCommand, RemoteCommand};
use async_channel::{Receiver, Sender};

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
use self::windows::MediaCenterInner;

#[cfg(target_os = "linux")]
use self::linux::MediaCenterInner;

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
use self::fallback::MediaCenterInner;

/// Playback status as the system displays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

/// Flattened view of the now-playing bag for platform code.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NowPlayingSnapshot {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub artwork: Option<Artwork>,
    pub duration: Option<f64>,
    pub elapsed: Option<f64>,
    pub rate: Option<f64>,
}

impl NowPlayingSnapshot {
    pub fn status(&self) -> PlaybackStatus {
        match (self.rate, self.elapsed) {
            (Some(rate), _) if rate > 0.0 => PlaybackStatus::Playing,
            (_, Some(_)) => PlaybackStatus::Paused,
            _ => PlaybackStatus::Stopped,
        }
    }
}

impl From<&NowPlayingInfo> for NowPlayingSnapshot {
    fn from(info: &NowPlayingInfo) -> Self {
        let text = |key: NowPlayingKey| info.text(key).map(str::to_string);
        Self {
            title: text(NowPlayingKey::Title),
            artist: text(NowPlayingKey::Artist),
            album: text(NowPlayingKey::AlbumTitle),
            artwork: info.artwork().cloned(),
            duration: info.number(NowPlayingKey::PlaybackDuration),
            elapsed: info.number(NowPlayingKey::ElapsedPlaybackTime),
            rate: info.number(NowPlayingKey::PlaybackRate),
        }
    }
}

/// Connection to the system's "Now Playing" surface and remote controls.
///
/// Incoming commands are queued; drain them with
/// [`poll_command`](Self::poll_command) or [`next_command`](Self::next_command).
pub struct MediaCenterIntegration {
    inner: MediaCenterInner,
    sender: Sender<MediaCommand>,
    commands: Receiver<MediaCommand>,
}

impl std::fmt::Debug for MediaCenterIntegration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCenterIntegration")
            .field("pending_commands", &self.commands.len())
            .finish_non_exhaustive()
    }
}

impl MediaCenterIntegration {
    /// Register with the platform media center.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::InitializationFailed`] if the platform refuses
    /// the session.
    pub fn new() -> Result<Self, MediaError> {
        let (sender, commands) = async_channel::unbounded();
        let inner = MediaCenterInner::new(sender.clone())?;
        Ok(Self {
            inner,
            sender,
            commands,
        })
    }

    /// Publish the now-playing bag.
    pub fn publish(&self, info: &NowPlayingInfo) {
        if let Err(e) = self.inner.update(&NowPlayingSnapshot::from(info)) {
            log::warn!("failed to publish now playing info: {e}");
        }
    }

    /// Remove the now-playing display.
    pub fn clear(&self) {
        if let Err(e) = self.inner.clear() {
            log::warn!("failed to clear now playing info: {e}");
        }
    }

    /// Advertise the enabled remote commands.
    pub fn set_enabled_commands(&self, commands: &[RemoteCommand]) {
        if let Err(e) = self.inner.set_enabled_commands(commands) {
            log::warn!("failed to update remote commands: {e}");
        }
    }

    /// Queue a command as if the system had sent it.
    pub fn inject_command(&self, command: MediaCommand) {
        // Both ends live in `self`, so the channel cannot be closed here.
        let _ = self.sender.try_send(command);
    }

    /// Take the next pending command, if any.
    #[must_use]
    pub fn poll_command(&self) -> Option<MediaCommand> {
        self.commands.try_recv().ok()
    }

    /// Wait for the next command.
    pub async fn next_command(&self) -> Option<MediaCommand> {
        self.commands.recv().await.ok()
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
mod fallback {
    use super::NowPlayingSnapshot;
    use crate::error::MediaError;
    use crate::remote::{MediaCommand, RemoteCommand};
    use async_channel::Sender;

    pub struct MediaCenterInner;

    impl MediaCenterInner {
        #[allow(clippy::unnecessary_wraps)]
        pub fn new(_sender: Sender<MediaCommand>) -> Result<Self, MediaError> {
            log::debug!("no media center integration on this platform");
            Ok(Self)
        }

        #[allow(clippy::unnecessary_wraps)]
        pub fn update(&self, _snapshot: &NowPlayingSnapshot) -> Result<(), MediaError> {
            Ok(())
        }

        #[allow(clippy::unnecessary_wraps)]
        pub fn clear(&self) -> Result<(), MediaError> {
            Ok(())
        }

        #[allow(clippy::unnecessary_wraps)]
        pub fn set_enabled_commands(&self, _commands: &[RemoteCommand]) -> Result<(), MediaError> {
            Ok(())
        }
    }
}
