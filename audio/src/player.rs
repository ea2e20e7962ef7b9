//! The audio player facade.
//!
//! [`AudioPlayer`] forwards playback commands to an [`AudioPlayerWrapper`],
//! re-emits what the engine reports through [`AudioPlayerEvents`], and keeps
//! the system's now-playing display and remote commands in sync with the
//! current item.

use crate::engine::RodioWrapper;
use crate::error::{AudioPlayerError, PlaybackError};
use crate::event::{AudioPlayerEvents, PlaybackEndedReason, SeekEvent};
use crate::item::{AudioItem, resolve_source};
use crate::now_playing::{NowPlayingEntry, NowPlayingInfoCenter, NowPlayingInfoController};
use crate::remote::{
    CommandOutcome, MediaCommand, RemoteCommand, RemoteCommandController, RemoteCommandKind,
    RemoteCommandRouter, find_command,
};
use crate::shutdown::{ShutdownHandle, ShutdownReceiver};
use crate::sys::MediaCenterIntegration;
use crate::wrapper::{
    AudioPlayerState, AudioPlayerWrapper, AudioPlayerWrapperDelegate, LoadRequest,
    TimeEventFrequency, TimePitchAlgorithm, TimedMetadata,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;

/// How often the command pump drains the platform media center.
const COMMAND_POLL: Duration = Duration::from_millis(50);

type CommandHandler = Arc<dyn Fn(&MediaCommand) -> CommandOutcome + Send + Sync>;

/// Builder for creating an [`AudioPlayer`].
///
/// Every collaborator is optional. Without overrides the player plays through
/// [`RodioWrapper`] and publishes to the platform media center.
#[derive(Default)]
pub struct AudioPlayerBuilder {
    wrapper: Option<Box<dyn AudioPlayerWrapper>>,
    now_playing: Option<Arc<dyn NowPlayingInfoController>>,
    remote_command_router: Option<Arc<dyn RemoteCommandRouter>>,
    remote_commands: Option<Vec<RemoteCommand>>,
    automatically_update_now_playing_info: Option<bool>,
    audio_time_pitch_algorithm: Option<TimePitchAlgorithm>,
}

impl std::fmt::Debug for AudioPlayerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPlayerBuilder")
            .field("custom_wrapper", &self.wrapper.is_some())
            .field("custom_now_playing", &self.now_playing.is_some())
            .field("custom_router", &self.remote_command_router.is_some())
            .field("remote_commands", &self.remote_commands)
            .finish_non_exhaustive()
    }
}

impl AudioPlayerBuilder {
    /// Create a new audio player builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom playback engine.
    #[must_use]
    pub fn wrapper(mut self, wrapper: Box<dyn AudioPlayerWrapper>) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    /// Use a custom now-playing sink.
    #[must_use]
    pub fn now_playing(mut self, now_playing: Arc<dyn NowPlayingInfoController>) -> Self {
        self.now_playing = Some(now_playing);
        self
    }

    /// Use a custom remote command router.
    #[must_use]
    pub fn remote_command_router(mut self, router: Arc<dyn RemoteCommandRouter>) -> Self {
        self.remote_command_router = Some(router);
        self
    }

    /// Default remote commands, used for items without their own set.
    #[must_use]
    pub fn remote_commands(mut self, commands: Vec<RemoteCommand>) -> Self {
        self.remote_commands = Some(commands);
        self
    }

    /// Whether the player keeps the now-playing display in sync. Defaults to `true`.
    #[must_use]
    pub const fn automatically_update_now_playing_info(mut self, value: bool) -> Self {
        self.automatically_update_now_playing_info = Some(value);
        self
    }

    /// Default time-pitch algorithm, used for items without their own.
    #[must_use]
    pub const fn audio_time_pitch_algorithm(mut self, algorithm: TimePitchAlgorithm) -> Self {
        self.audio_time_pitch_algorithm = Some(algorithm);
        self
    }

    /// Build the audio player.
    ///
    /// A platform media center that fails to start is logged and skipped;
    /// playback still works.
    ///
    /// # Errors
    ///
    /// Returns [`AudioPlayerError::OutputInitFailed`] if no engine was supplied
    /// and the default audio output cannot be opened.
    pub fn build(self) -> Result<AudioPlayer, AudioPlayerError> {
        let needs_media_center = self.now_playing.is_none() || self.remote_command_router.is_none();
        let media_center = if needs_media_center {
            match MediaCenterIntegration::new() {
                Ok(media_center) => Some(Arc::new(media_center)),
                Err(e) => {
                    log::warn!("media center unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };

        let wrapper = match self.wrapper {
            Some(wrapper) => wrapper,
            None => Box::new(RodioWrapper::new()?),
        };
        let now_playing: Arc<dyn NowPlayingInfoController> = match self.now_playing {
            Some(now_playing) => now_playing,
            None => Arc::new(
                media_center
                    .clone()
                    .map_or_else(NowPlayingInfoCenter::detached, NowPlayingInfoCenter::new),
            ),
        };
        let remote_command_router: Arc<dyn RemoteCommandRouter> = match self.remote_command_router
        {
            Some(router) => router,
            None => Arc::new(
                media_center
                    .clone()
                    .map_or_else(RemoteCommandController::detached, RemoteCommandController::new),
            ),
        };

        let controller = Arc::new(AudioController {
            wrapper,
            now_playing,
            remote_command_router,
            events: AudioPlayerEvents::default(),
            state: Mutex::new(ControllerState {
                current_item: None,
                rate: 1.0,
                remote_commands: self.remote_commands.unwrap_or_else(RemoteCommand::defaults),
                automatically_update_now_playing_info: self
                    .automatically_update_now_playing_info
                    .unwrap_or(true),
                audio_time_pitch_algorithm: self.audio_time_pitch_algorithm.unwrap_or_default(),
            }),
            artwork_generation: Arc::new(AtomicU64::new(0)),
            command_handler: RwLock::new(None),
        });

        let reactor = Arc::new(EngineReactor {
            controller: Arc::downgrade(&controller),
        });
        let delegate: Weak<EngineReactor> = Arc::downgrade(&reactor);
        controller.wrapper.set_delegate(delegate);

        let command_pump = media_center.as_ref().map(|media_center| {
            let (handle, receiver) = ShutdownHandle::new();
            spawn_command_pump(
                Arc::downgrade(&controller),
                Arc::clone(media_center),
                receiver,
            );
            handle
        });

        Ok(AudioPlayer {
            controller,
            _reactor: reactor,
            media_center,
            _command_pump: command_pump,
        })
    }
}

fn spawn_command_pump(
    controller: Weak<AudioController>,
    media_center: Arc<MediaCenterIntegration>,
    shutdown: ShutdownReceiver,
) {
    std::thread::spawn(move || {
        while shutdown.sleep(COMMAND_POLL) {
            let Some(controller) = controller.upgrade() else {
                break;
            };
            while let Some(command) = media_center.poll_command() {
                let outcome = controller.handle_remote_command(&command);
                log::debug!("remote command {command:?}: {outcome:?}");
            }
        }
    });
}

struct ControllerState {
    current_item: Option<Arc<dyn AudioItem>>,
    rate: f32,
    remote_commands: Vec<RemoteCommand>,
    automatically_update_now_playing_info: bool,
    audio_time_pitch_algorithm: TimePitchAlgorithm,
}

/// Playback control, reached through [`AudioPlayer`].
///
/// The controller's own state sits behind a mutex that is never held while
/// calling the engine, the now-playing sink, the router or event handlers, so
/// each of them may call back into the controller.
pub struct AudioController {
    wrapper: Box<dyn AudioPlayerWrapper>,
    now_playing: Arc<dyn NowPlayingInfoController>,
    remote_command_router: Arc<dyn RemoteCommandRouter>,
    events: AudioPlayerEvents,
    state: Mutex<ControllerState>,
    artwork_generation: Arc<AtomicU64>,
    command_handler: RwLock<Option<CommandHandler>>,
}

impl std::fmt::Debug for AudioController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("AudioController")
            .field("has_current_item", &state.current_item.is_some())
            .field("rate", &state.rate)
            .field("remote_commands", &state.remote_commands)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl AudioController {
    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn automatically_syncs(&self) -> bool {
        self.state().automatically_update_now_playing_info
    }

    /// Load `item` and begin playing it once ready.
    ///
    /// `play_when_ready` overrides the engine's current setting when given.
    /// Loading continues in the background; its progress and failures are
    /// reported through [`events`](Self::events).
    ///
    /// # Errors
    ///
    /// Returns [`AudioPlayerError::InvalidSourceUrl`] if a stream item's
    /// locator is not a URL. Nothing changes in that case.
    pub fn load(
        &self,
        item: Arc<dyn AudioItem>,
        play_when_ready: Option<bool>,
    ) -> Result<(), AudioPlayerError> {
        let source = resolve_source(item.as_ref())?;
        log::debug!("load {source}");

        let automatically_syncs = {
            let mut state = self.state();
            state.current_item = Some(Arc::clone(&item));
            state.automatically_update_now_playing_info
        };
        if let Some(play_when_ready) = play_when_ready {
            self.wrapper.set_play_when_ready(play_when_ready);
        }

        if automatically_syncs {
            self.now_playing.set_many_without_update(vec![
                NowPlayingEntry::duration(None),
                NowPlayingEntry::rate(None),
                NowPlayingEntry::elapsed_time(None),
            ]);
            self.load_now_playing_meta_values();
        }
        self.enable_remote_commands(item.as_ref());

        self.wrapper.load(LoadRequest {
            source,
            play_when_ready: self.wrapper.play_when_ready(),
            initial_time: item.as_initial_timing().map(|timing| timing.initial_time()),
            options: item
                .as_asset_options_providing()
                .map(|provider| provider.asset_options()),
        });
        Ok(())
    }

    /// Toggle between playing and paused.
    pub fn toggle_playing(&self) {
        self.wrapper.toggle_playing();
    }

    /// Start or resume playback.
    pub fn play(&self) {
        self.wrapper.play();
    }

    /// Pause playback.
    pub fn pause(&self) {
        self.wrapper.pause();
    }

    /// Seek to `seconds`.
    pub fn seek(&self, seconds: f64) {
        self.wrapper.seek(seconds);
    }

    /// Seek by `offset` seconds; negative values seek backward.
    pub fn seek_by(&self, offset: f64) {
        self.wrapper.seek_by(offset);
    }

    /// Stop playback and forget the current item.
    ///
    /// Emits [`PlaybackEndedReason::PlayerStopped`].
    pub fn stop(&self) {
        log::debug!("stop");
        let automatically_syncs = {
            let mut state = self.state();
            state.current_item = None;
            state.automatically_update_now_playing_info
        };
        self.artwork_generation.fetch_add(1, Ordering::SeqCst);
        self.wrapper.stop();
        if automatically_syncs {
            self.now_playing.clear();
        }
        self.events.playback_end.emit(&PlaybackEndedReason::PlayerStopped);
    }

    /// Reload the current item, from the current position or from the start.
    pub fn reload(&self, start_from_current_time: bool) {
        self.wrapper.reload(start_from_current_time);
    }

    /// The loaded item.
    #[must_use]
    pub fn current_item(&self) -> Option<Arc<dyn AudioItem>> {
        self.state().current_item.clone()
    }

    /// Events emitted by the player.
    #[must_use]
    pub const fn events(&self) -> &AudioPlayerEvents {
        &self.events
    }

    /// Engine state.
    #[must_use]
    pub fn player_state(&self) -> AudioPlayerState {
        self.wrapper.state()
    }

    /// Current position in seconds.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.wrapper.current_time()
    }

    /// Duration of the current item in seconds, `0.0` when unknown.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.wrapper.duration()
    }

    /// How far the current item is buffered, in seconds.
    #[must_use]
    pub fn buffered_position(&self) -> f64 {
        self.wrapper.buffered_position()
    }

    /// The desired playback rate.
    ///
    /// This is the rate last asked for, not the engine's live rate, which
    /// is `0.0` while paused.
    #[must_use]
    pub fn rate(&self) -> f32 {
        self.state().rate
    }

    /// Set the desired playback rate.
    ///
    /// Applied right away while the engine is playing, otherwise on the next
    /// transition to [`AudioPlayerState::Playing`].
    pub fn set_rate(&self, rate: f32) {
        self.state().rate = rate;
        if self.wrapper.rate() > 0.0 {
            self.wrapper.set_rate(rate);
        }
    }

    /// Output volume.
    #[must_use]
    pub fn volume(&self) -> f32 {
        self.wrapper.volume()
    }

    /// Set the output volume, `0.0..=1.0`.
    pub fn set_volume(&self, volume: f32) {
        self.wrapper.set_volume(volume);
    }

    /// Whether output is muted.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.wrapper.is_muted()
    }

    /// Mute or unmute output.
    pub fn set_muted(&self, muted: bool) {
        self.wrapper.set_muted(muted);
    }

    /// Preferred forward buffer in seconds.
    #[must_use]
    pub fn buffer_duration(&self) -> f64 {
        self.wrapper.buffer_duration()
    }

    /// Set the preferred forward buffer.
    pub fn set_buffer_duration(&self, seconds: f64) {
        self.wrapper.set_buffer_duration(seconds);
    }

    /// How often [`AudioPlayerEvents::seconds_elapse`] fires.
    #[must_use]
    pub fn time_event_frequency(&self) -> TimeEventFrequency {
        self.wrapper.time_event_frequency()
    }

    /// Set how often [`AudioPlayerEvents::seconds_elapse`] fires.
    pub fn set_time_event_frequency(&self, frequency: TimeEventFrequency) {
        self.wrapper.set_time_event_frequency(frequency);
    }

    /// Whether the engine delays playback to avoid stalls.
    #[must_use]
    pub fn automatically_waits_to_minimize_stalling(&self) -> bool {
        self.wrapper.automatically_waits_to_minimize_stalling()
    }

    /// Set whether the engine delays playback to avoid stalls.
    pub fn set_automatically_waits_to_minimize_stalling(&self, value: bool) {
        self.wrapper.set_automatically_waits_to_minimize_stalling(value);
    }

    /// Whether playback starts as soon as an item is ready.
    #[must_use]
    pub fn play_when_ready(&self) -> bool {
        self.wrapper.play_when_ready()
    }

    /// Set whether playback starts as soon as an item is ready.
    pub fn set_play_when_ready(&self, play_when_ready: bool) {
        self.wrapper.set_play_when_ready(play_when_ready);
    }

    /// Whether the player keeps the now-playing display in sync.
    #[must_use]
    pub fn automatically_update_now_playing_info(&self) -> bool {
        self.automatically_syncs()
    }

    /// Turn automatic now-playing sync on or off.
    pub fn set_automatically_update_now_playing_info(&self, value: bool) {
        self.state().automatically_update_now_playing_info = value;
    }

    /// The default time-pitch algorithm.
    #[must_use]
    pub fn audio_time_pitch_algorithm(&self) -> TimePitchAlgorithm {
        self.state().audio_time_pitch_algorithm
    }

    /// Set the default time-pitch algorithm. Takes effect on the next load.
    pub fn set_audio_time_pitch_algorithm(&self, algorithm: TimePitchAlgorithm) {
        self.state().audio_time_pitch_algorithm = algorithm;
    }

    /// The default remote commands.
    #[must_use]
    pub fn remote_commands(&self) -> Vec<RemoteCommand> {
        self.state().remote_commands.clone()
    }

    /// Replace the default remote commands.
    ///
    /// With an item loaded, its active command set is pushed again right away.
    pub fn set_remote_commands(&self, commands: Vec<RemoteCommand>) {
        let current_item = {
            let mut state = self.state();
            state.remote_commands = commands;
            state.current_item.clone()
        };
        if let Some(item) = current_item {
            self.enable_remote_commands(item.as_ref());
        }
    }

    fn enable_remote_commands(&self, item: &dyn AudioItem) {
        let commands = match item.as_remote_command_providing() {
            Some(provider) => provider.remote_commands(),
            None => self.remote_commands(),
        };
        self.remote_command_router.enable_remote_commands(&commands);
    }

    /// Push the current item's artist, title and album, then fetch its
    /// artwork in the background.
    ///
    /// Only the fetch started last may set the artwork.
    pub fn load_now_playing_meta_values(&self) {
        let Some(item) = self.current_item() else {
            return;
        };

        self.now_playing.set_many(vec![
            NowPlayingEntry::artist(item.artist()),
            NowPlayingEntry::title(item.title()),
            NowPlayingEntry::album_title(item.album_title()),
        ]);

        let generation = self.artwork_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.artwork_generation);
        let now_playing = Arc::clone(&self.now_playing);
        item.load_artwork(Box::new(move |artwork| {
            if current.load(Ordering::SeqCst) != generation {
                log::debug!("dropping artwork from a superseded fetch");
                return;
            }
            now_playing.set(NowPlayingEntry::artwork(artwork));
        }));
    }

    /// Push duration, live rate and elapsed time to the now-playing display.
    pub fn update_now_playing_playback_values(&self) {
        self.now_playing.set_many(vec![
            NowPlayingEntry::duration(Some(self.wrapper.duration())),
            NowPlayingEntry::rate(Some(f64::from(self.wrapper.rate()))),
            NowPlayingEntry::elapsed_time(Some(self.wrapper.current_time())),
        ]);
    }

    /// Install the handler for commands the player does not carry out
    /// itself: next, previous, like, dislike and bookmark.
    pub fn set_remote_command_handler<F>(&self, handler: F)
    where
        F: Fn(&MediaCommand) -> CommandOutcome + Send + Sync + 'static,
    {
        *self
            .command_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// Carry out a command received from the system.
    ///
    /// Commands whose remote command is not enabled are rejected with
    /// [`CommandOutcome::Disabled`].
    pub fn handle_remote_command(&self, command: &MediaCommand) -> CommandOutcome {
        let Some(enabled) = self.enabled_command(command) else {
            return CommandOutcome::Disabled;
        };

        match command {
            MediaCommand::Play => self.play(),
            MediaCommand::Pause => self.pause(),
            MediaCommand::PlayPause => self.toggle_playing(),
            MediaCommand::Stop => self.stop(),
            MediaCommand::Seek(position) => self.seek(position.as_secs_f64()),
            MediaCommand::SeekForward(amount) => {
                let Some(seconds) = skip_amount(*amount, &enabled) else {
                    return CommandOutcome::Failed;
                };
                self.seek_by(seconds);
            }
            MediaCommand::SeekBackward(amount) => {
                let Some(seconds) = skip_amount(*amount, &enabled) else {
                    return CommandOutcome::Failed;
                };
                self.seek_by(-seconds);
            }
            MediaCommand::Next
            | MediaCommand::Previous
            | MediaCommand::Like
            | MediaCommand::Dislike
            | MediaCommand::Bookmark => {
                let handler = self
                    .command_handler
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                return handler.map_or(CommandOutcome::NoHandler, |handler| handler(command));
            }
        }
        CommandOutcome::Handled
    }

    fn enabled_command(&self, command: &MediaCommand) -> Option<RemoteCommand> {
        let enabled = self.remote_command_router.enabled_commands();
        find_command(&enabled, command.required_kind()).or_else(|| match command {
            // Play and pause keys also work when only the toggle is enabled.
            MediaCommand::Play | MediaCommand::Pause => {
                find_command(&enabled, RemoteCommandKind::TogglePlayPause)
            }
            _ => None,
        })
    }

    fn apply_time_pitch_algorithm(&self) {
        let (item, default) = {
            let state = self.state();
            (state.current_item.clone(), state.audio_time_pitch_algorithm)
        };
        let algorithm = item
            .as_deref()
            .and_then(|item| item.as_time_pitching().map(|p| p.pitch_algorithm()))
            .unwrap_or(default);
        self.wrapper.set_time_pitch_algorithm(algorithm);
    }

    fn on_state_change(&self, state: AudioPlayerState) {
        log::debug!("player state {state:?}");
        match state {
            AudioPlayerState::Ready | AudioPlayerState::Loading => {
                self.apply_time_pitch_algorithm();
            }
            AudioPlayerState::Playing => {
                let rate = self.rate();
                self.wrapper.set_rate(rate);
            }
            _ => {}
        }

        if matches!(
            state,
            AudioPlayerState::Ready
                | AudioPlayerState::Loading
                | AudioPlayerState::Playing
                | AudioPlayerState::Paused
        ) && self.automatically_syncs()
        {
            self.update_now_playing_playback_values();
        }

        self.events.state_change.emit(&state);
    }

    fn on_seek_complete(&self, seconds: f64, did_finish: bool) {
        if self.automatically_syncs() {
            self.now_playing
                .set(NowPlayingEntry::elapsed_time(Some(self.wrapper.current_time())));
        }
        self.events.seek.emit(&SeekEvent {
            seconds,
            did_finish,
        });
    }
}

fn skip_amount(amount: Option<Duration>, command: &RemoteCommand) -> Option<f64> {
    amount
        .map(|amount| amount.as_secs_f64())
        .or_else(|| command.default_interval())
}

/// Receives engine callbacks on behalf of an [`AudioController`].
///
/// Kept apart from the controller so the callbacks are not part of the
/// player's public surface.
struct EngineReactor {
    controller: Weak<AudioController>,
}

impl EngineReactor {
    fn with(&self, f: impl FnOnce(&AudioController)) {
        if let Some(controller) = self.controller.upgrade() {
            f(&controller);
        }
    }
}

impl AudioPlayerWrapperDelegate for EngineReactor {
    fn state_did_change(&self, state: AudioPlayerState) {
        self.with(|c| c.on_state_change(state));
    }

    fn seconds_elapsed(&self, seconds: f64) {
        self.with(|c| c.events.seconds_elapse.emit(&seconds));
    }

    fn did_fail(&self, error: Option<PlaybackError>) {
        self.with(|c| c.events.fail.emit(&error));
    }

    fn seek_did_complete(&self, seconds: f64, did_finish: bool) {
        self.with(|c| c.on_seek_complete(seconds, did_finish));
    }

    fn did_update_duration(&self, duration: f64) {
        self.with(|c| c.events.update_duration.emit(&duration));
    }

    fn did_receive_metadata(&self, metadata: Vec<TimedMetadata>) {
        self.with(|c| c.events.received_metadata.emit(&metadata));
    }

    fn did_play_to_end(&self) {
        self.with(|c| {
            c.events
                .playback_end
                .emit(&PlaybackEndedReason::PlayedUntilEnd);
        });
    }

    fn did_recreate_engine(&self) {
        self.with(|c| c.events.did_recreate_engine.emit(&()));
    }
}

/// Audio player with now-playing and remote command integration.
///
/// Dereferences to [`AudioController`], which carries the playback API.
///
/// # Example
///
/// ```no_run
/// use playkit_audio::{AudioPlayer, DefaultAudioItem, SourceType};
/// use std::sync::Arc;
///
/// let player = AudioPlayer::builder().build()?;
/// player.events().state_change.subscribe(|state| println!("{state:?}"));
///
/// let item = DefaultAudioItem::new("song.mp3", SourceType::File)
///     .title("My Song")
///     .artist("My Artist");
/// player.load(Arc::new(item), Some(true))?;
/// # Ok::<(), playkit_audio::AudioPlayerError>(())
/// ```
pub struct AudioPlayer {
    controller: Arc<AudioController>,
    _reactor: Arc<EngineReactor>,
    media_center: Option<Arc<MediaCenterIntegration>>,
    _command_pump: Option<ShutdownHandle>,
}

impl std::fmt::Debug for AudioPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPlayer")
            .field("controller", &self.controller)
            .field("media_center", &self.media_center)
            .finish_non_exhaustive()
    }
}

impl AudioPlayer {
    /// Create a new audio player builder.
    #[must_use]
    pub fn builder() -> AudioPlayerBuilder {
        AudioPlayerBuilder::new()
    }

    /// The platform media center, when the player created one.
    #[must_use]
    pub const fn media_center(&self) -> Option<&Arc<MediaCenterIntegration>> {
        self.media_center.as_ref()
    }
}

impl std::ops::Deref for AudioPlayer {
    type Target = AudioController;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        // RAII: Clear media center when player is dropped
        if let Some(media_center) = &self.media_center {
            media_center.clear();
        }
    }
}
