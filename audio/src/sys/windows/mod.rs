//! Windows media control implementation using `SystemMediaTransportControls`.

use super::{NowPlayingSnapshot, PlaybackStatus};
use crate::error::MediaError;
use crate::item::Artwork;
use crate::remote::{MediaCommand, RemoteCommand, RemoteCommandKind};
use async_channel::Sender;
use std::sync::{Mutex, PoisonError};
use windows::Foundation::{TimeSpan, TypedEventHandler};
use windows::Media::Playback::MediaPlayer;
use windows::Media::{
    MediaPlaybackStatus, MediaPlaybackType, SystemMediaTransportControls,
    SystemMediaTransportControlsButton, SystemMediaTransportControlsButtonPressedEventArgs,
    SystemMediaTransportControlsTimelineProperties,
};
use windows::Storage::Streams::{
    DataWriter, InMemoryRandomAccessStream, RandomAccessStreamReference,
};
use windows::core::HSTRING;

fn init_err(e: &windows::core::Error) -> MediaError {
    MediaError::InitializationFailed(e.message().to_string())
}

fn update_err(e: &windows::core::Error) -> MediaError {
    MediaError::UpdateFailed(e.message().to_string())
}

#[allow(clippy::cast_possible_truncation)]
fn time_span(seconds: f64) -> TimeSpan {
    // 100 ns ticks
    TimeSpan {
        Duration: (seconds.max(0.0) * 10_000_000.0) as i64,
    }
}

/// Copy encoded artwork into a stream the display can read.
fn artwork_stream(artwork: &Artwork) -> windows::core::Result<InMemoryRandomAccessStream> {
    let stream = InMemoryRandomAccessStream::new()?;
    let writer = DataWriter::CreateDataWriter(&stream)?;
    writer.WriteBytes(artwork.bytes())?;
    writer.StoreAsync()?.get()?;
    writer.FlushAsync()?.get()?;
    writer.DetachStream()?;
    stream.Seek(0)?;
    Ok(stream)
}

pub struct MediaCenterInner {
    // The controls belong to this player; it must stay alive with them.
    _media_player: MediaPlayer,
    controls: SystemMediaTransportControls,
    thumbnail: Mutex<Option<(Artwork, RandomAccessStreamReference)>>,
}

impl MediaCenterInner {
    pub fn new(sender: Sender<MediaCommand>) -> Result<Self, MediaError> {
        let media_player = MediaPlayer::new().map_err(|e| init_err(&e))?;
        // Detach the system controls from the player's own (empty) playback.
        media_player
            .CommandManager()
            .and_then(|manager| manager.SetIsEnabled(false))
            .map_err(|e| init_err(&e))?;

        let controls = media_player
            .SystemMediaTransportControls()
            .map_err(|e| init_err(&e))?;
        controls.SetIsEnabled(true).map_err(|e| init_err(&e))?;

        let handler = TypedEventHandler::new(
            move |_sender: &Option<SystemMediaTransportControls>,
                  args: &Option<SystemMediaTransportControlsButtonPressedEventArgs>| {
                if let Some(args) = args {
                    let command = match args.Button()? {
                        SystemMediaTransportControlsButton::Play => Some(MediaCommand::Play),
                        SystemMediaTransportControlsButton::Pause => Some(MediaCommand::Pause),
                        SystemMediaTransportControlsButton::Stop => Some(MediaCommand::Stop),
                        SystemMediaTransportControlsButton::Next => Some(MediaCommand::Next),
                        SystemMediaTransportControlsButton::Previous => {
                            Some(MediaCommand::Previous)
                        }
                        SystemMediaTransportControlsButton::FastForward => {
                            Some(MediaCommand::SeekForward(None))
                        }
                        SystemMediaTransportControlsButton::Rewind => {
                            Some(MediaCommand::SeekBackward(None))
                        }
                        _ => None,
                    };
                    if let Some(command) = command {
                        let _ = sender.try_send(command);
                    }
                }
                Ok(())
            },
        );
        controls.ButtonPressed(&handler).map_err(|e| init_err(&e))?;

        Ok(Self {
            _media_player: media_player,
            controls,
            thumbnail: Mutex::new(None),
        })
    }

    /// The thumbnail for `artwork`, reusing the last one if it is unchanged.
    fn thumbnail(&self, artwork: &Artwork) -> windows::core::Result<RandomAccessStreamReference> {
        let mut cached = self.thumbnail.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((current, reference)) = cached.as_ref() {
            if current == artwork {
                return Ok(reference.clone());
            }
        }
        let reference = RandomAccessStreamReference::CreateFromStream(&artwork_stream(artwork)?)?;
        *cached = Some((artwork.clone(), reference.clone()));
        Ok(reference)
    }

    pub fn update(&self, snapshot: &NowPlayingSnapshot) -> Result<(), MediaError> {
        let updater = self.controls.DisplayUpdater().map_err(|e| update_err(&e))?;
        // Start from an empty display so cleared fields and artwork disappear.
        updater.ClearAll().map_err(|e| update_err(&e))?;
        updater
            .SetType(MediaPlaybackType::Music)
            .map_err(|e| update_err(&e))?;

        let music = updater.MusicProperties().map_err(|e| update_err(&e))?;
        music
            .SetTitle(&HSTRING::from(snapshot.title.as_deref().unwrap_or_default()))
            .map_err(|e| update_err(&e))?;
        music
            .SetArtist(&HSTRING::from(snapshot.artist.as_deref().unwrap_or_default()))
            .map_err(|e| update_err(&e))?;
        music
            .SetAlbumTitle(&HSTRING::from(snapshot.album.as_deref().unwrap_or_default()))
            .map_err(|e| update_err(&e))?;
        if let Some(artwork) = &snapshot.artwork {
            match self.thumbnail(artwork) {
                Ok(reference) => updater
                    .SetThumbnail(&reference)
                    .map_err(|e| update_err(&e))?,
                Err(e) => log::warn!("failed to prepare artwork: {}", e.message()),
            }
        }
        updater.Update().map_err(|e| update_err(&e))?;

        let status = match snapshot.status() {
            PlaybackStatus::Playing => MediaPlaybackStatus::Playing,
            PlaybackStatus::Paused => MediaPlaybackStatus::Paused,
            PlaybackStatus::Stopped => MediaPlaybackStatus::Stopped,
        };
        self.controls
            .SetPlaybackStatus(status)
            .map_err(|e| update_err(&e))?;

        if let Some(duration) = snapshot.duration.filter(|d| d.is_finite() && *d > 0.0) {
            let timeline =
                SystemMediaTransportControlsTimelineProperties::new().map_err(|e| update_err(&e))?;
            timeline
                .SetStartTime(time_span(0.0))
                .map_err(|e| update_err(&e))?;
            timeline
                .SetEndTime(time_span(duration))
                .map_err(|e| update_err(&e))?;
            timeline
                .SetPosition(time_span(snapshot.elapsed.unwrap_or_default()))
                .map_err(|e| update_err(&e))?;
            self.controls
                .UpdateTimelineProperties(&timeline)
                .map_err(|e| update_err(&e))?;
        }

        Ok(())
    }

    pub fn clear(&self) -> Result<(), MediaError> {
        let updater = self.controls.DisplayUpdater().map_err(|e| update_err(&e))?;
        updater.ClearAll().map_err(|e| update_err(&e))?;
        updater.Update().map_err(|e| update_err(&e))?;
        *self.thumbnail.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.controls
            .SetPlaybackStatus(MediaPlaybackStatus::Closed)
            .map_err(|e| update_err(&e))?;
        Ok(())
    }

    pub fn set_enabled_commands(&self, commands: &[RemoteCommand]) -> Result<(), MediaError> {
        let enabled = |kind| commands.iter().any(|c| c.kind() == kind);
        let toggle = enabled(RemoteCommandKind::TogglePlayPause);
        let controls = &self.controls;
        controls
            .SetIsPlayEnabled(toggle || enabled(RemoteCommandKind::Play))
            .map_err(|e| update_err(&e))?;
        controls
            .SetIsPauseEnabled(toggle || enabled(RemoteCommandKind::Pause))
            .map_err(|e| update_err(&e))?;
        controls
            .SetIsStopEnabled(enabled(RemoteCommandKind::Stop))
            .map_err(|e| update_err(&e))?;
        controls
            .SetIsNextEnabled(enabled(RemoteCommandKind::Next))
            .map_err(|e| update_err(&e))?;
        controls
            .SetIsPreviousEnabled(enabled(RemoteCommandKind::Previous))
            .map_err(|e| update_err(&e))?;
        controls
            .SetIsFastForwardEnabled(enabled(RemoteCommandKind::SkipForward))
            .map_err(|e| update_err(&e))?;
        controls
            .SetIsRewindEnabled(enabled(RemoteCommandKind::SkipBackward))
            .map_err(|e| update_err(&e))?;
        Ok(())
    }
}
