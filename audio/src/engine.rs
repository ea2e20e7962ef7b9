//! Playback engine built on `rodio`.
//!
//! The output stream is `!Send`, so it lives on a dedicated thread for the
//! whole life of the engine. Media is acquired and decoded on a loader thread
//! per load, and a ticker thread reports elapsed time and detects the end of
//! the media.

use crate::error::{AudioPlayerError, PlaybackError};
use crate::item::LoadOptions;
use crate::shutdown::{ShutdownHandle, ShutdownReceiver};
use crate::wrapper::{
    AudioPlayerState, AudioPlayerWrapper, AudioPlayerWrapperDelegate, LoadRequest, MediaSource,
    TimeEventFrequency, TimePitchAlgorithm,
};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::{Duration, Instant};
use url::Url;

/// How often the ticker checks for the end of the media.
const TICK: Duration = Duration::from_millis(100);

/// The playback surface the engine drives. [`Sink`] in production.
trait Output: Send + Sync {
    fn append(&self, source: Decoder<Box<dyn MediaReader>>);
    fn play(&self);
    fn pause(&self);
    fn stop(&self);
    fn try_seek(&self, position: Duration) -> Result<(), String>;
    fn position(&self) -> Duration;
    fn is_empty(&self) -> bool;
    fn set_speed(&self, speed: f32);
    fn set_volume(&self, volume: f32);
}

impl Output for Sink {
    fn append(&self, source: Decoder<Box<dyn MediaReader>>) {
        Self::append(self, source);
    }

    fn play(&self) {
        Self::play(self);
    }

    fn pause(&self) {
        Self::pause(self);
    }

    fn stop(&self) {
        Self::stop(self);
    }

    fn try_seek(&self, position: Duration) -> Result<(), String> {
        Self::try_seek(self, position).map_err(|e| e.to_string())
    }

    fn position(&self) -> Duration {
        self.get_pos()
    }

    fn is_empty(&self) -> bool {
        self.empty()
    }

    fn set_speed(&self, speed: f32) {
        Self::set_speed(self, speed);
    }

    fn set_volume(&self, volume: f32) {
        Self::set_volume(self, volume);
    }
}

/// Opens outputs. Called once at startup and again to recover from a failure.
trait OutputDevice: Send + Sync {
    fn open(&self) -> Result<Arc<dyn Output>, PlaybackError>;
}

impl OutputDevice for OutputStreamHandle {
    fn open(&self) -> Result<Arc<dyn Output>, PlaybackError> {
        let sink = Sink::try_new(self).map_err(|e| PlaybackError::Output(e.to_string()))?;
        Ok(Arc::new(sink))
    }
}

struct EngineState {
    state: AudioPlayerState,
    output: Arc<dyn Output>,
    /// Bumped by every load and stop; loads tagged with an older value are
    /// dropped.
    generation: u64,
    play_when_ready: bool,
    loaded: bool,
    rate: f32,
    volume: f32,
    muted: bool,
    duration: f64,
    buffer_duration: f64,
    time_event_frequency: TimeEventFrequency,
    waits_to_minimize_stalling: bool,
    pitch_algorithm: TimePitchAlgorithm,
    last_request: Option<LoadRequest>,
    last_time_event: Instant,
}

impl EngineState {
    fn new(output: Arc<dyn Output>) -> Self {
        Self {
            state: AudioPlayerState::Idle,
            output,
            generation: 0,
            play_when_ready: true,
            loaded: false,
            rate: 1.0,
            volume: 1.0,
            muted: false,
            duration: 0.0,
            buffer_duration: 0.0,
            time_event_frequency: TimeEventFrequency::default(),
            waits_to_minimize_stalling: true,
            pitch_algorithm: TimePitchAlgorithm::default(),
            last_request: None,
            last_time_event: Instant::now(),
        }
    }

    fn output_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }
}

struct Shared {
    device: Box<dyn OutputDevice>,
    state: Mutex<EngineState>,
    delegate: RwLock<Option<Weak<dyn AudioPlayerWrapperDelegate>>>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, f: impl FnOnce(&dyn AudioPlayerWrapperDelegate)) {
        let delegate = self
            .delegate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade);
        if let Some(delegate) = delegate {
            f(delegate.as_ref());
        }
    }

    fn transition(&self, new: AudioPlayerState) {
        {
            let mut state = self.state();
            if state.state == new {
                return;
            }
            log::debug!("engine state {:?} -> {new:?}", state.state);
            state.state = new;
        }
        self.notify(|d| d.state_did_change(new));
    }

    fn current_time(&self) -> f64 {
        let state = self.state();
        if state.loaded {
            state.output.position().as_secs_f64()
        } else {
            0.0
        }
    }

    fn finish_load(
        &self,
        generation: u64,
        request: &LoadRequest,
        source: Decoder<Box<dyn MediaReader>>,
    ) {
        let duration = source.total_duration().map(|d| d.as_secs_f64());

        // Checked and appended under one lock so a racing load or stop
        // either discards this source or clears it from the output.
        let play_when_ready = {
            let mut state = self.state();
            if state.generation != generation {
                log::debug!("discarding superseded load of {}", request.source);
                return;
            }
            state.output.pause();
            state.output.append(source);
            if let Some(seconds) = request.initial_time.filter(|t| *t > 0.0) {
                match Duration::try_from_secs_f64(seconds) {
                    Ok(position) => {
                        if let Err(e) = state.output.try_seek(position) {
                            log::warn!("initial seek to {seconds}s failed: {e}");
                        }
                    }
                    Err(e) => log::warn!("ignoring initial time {seconds}s: {e}"),
                }
            }
            state.loaded = true;
            if let Some(duration) = duration {
                state.duration = duration;
            }
            if state.play_when_ready {
                state.output.play();
            }
            state.play_when_ready
        };

        if let Some(duration) = duration {
            self.notify(|d| d.did_update_duration(duration));
        }
        self.transition(AudioPlayerState::Ready);
        if play_when_ready {
            self.transition(AudioPlayerState::Playing);
        }
    }

    fn fail_load(&self, generation: u64, error: PlaybackError) {
        if self.state().generation != generation {
            return;
        }
        log::error!("playback failed: {error}");
        self.notify(|d| d.did_fail(Some(error)));
        self.transition(AudioPlayerState::Failed);
    }

    fn tick(&self) {
        let (report_time, ended) = {
            let mut state = self.state();
            if state.state != AudioPlayerState::Playing || !state.loaded {
                return;
            }
            if state.output.is_empty() {
                state.loaded = false;
                (false, true)
            } else if state.last_time_event.elapsed() >= state.time_event_frequency.interval() {
                state.last_time_event = Instant::now();
                (true, false)
            } else {
                (false, false)
            }
        };

        if ended {
            self.notify(|d| d.did_play_to_end());
            self.transition(AudioPlayerState::Stopped);
        } else if report_time {
            let seconds = self.current_time();
            self.notify(|d| d.seconds_elapsed(seconds));
        }
    }
}

/// Anything the decoder can read media from.
trait MediaReader: Read + std::io::Seek + Send + Sync {}

impl<T: Read + std::io::Seek + Send + Sync> MediaReader for T {}

fn open_file(path: &Path) -> Result<Box<dyn MediaReader>, PlaybackError> {
    let file = File::open(path)
        .map_err(|e| PlaybackError::LoadFailed(format!("{}: {e}", path.display())))?;
    Ok(Box::new(BufReader::new(file)))
}

fn fetch_stream(
    url: &Url,
    options: Option<&LoadOptions>,
) -> Result<Box<dyn MediaReader>, PlaybackError> {
    let mut request = ureq::get(url.as_str());
    if let Some(options) = options {
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(user_agent) = &options.user_agent {
            request = request.header("User-Agent", user_agent.as_str());
        }
    }

    let response = request
        .call()
        .map_err(|e| PlaybackError::Network(e.to_string()))?;
    let mut data = Vec::new();
    let (_, body) = response.into_parts();
    body.into_reader()
        .read_to_end(&mut data)
        .map_err(|e| PlaybackError::Network(e.to_string()))?;
    Ok(Box::new(Cursor::new(data)))
}

fn decode(request: &LoadRequest) -> Result<Decoder<Box<dyn MediaReader>>, PlaybackError> {
    let reader = match &request.source {
        MediaSource::File(path) => open_file(path)?,
        MediaSource::Remote(url) => fetch_stream(url, request.options.as_ref())?,
    };
    Decoder::new(reader).map_err(|e| PlaybackError::UnsupportedFormat(e.to_string()))
}

/// [`AudioPlayerWrapper`] playing through the default output device.
///
/// Rate changes use `rodio`'s speed control, which always behaves like
/// [`TimePitchAlgorithm::Varispeed`]; the configured algorithm is kept and
/// reported but does not alter the output.
pub struct RodioWrapper {
    shared: Arc<Shared>,
    _shutdown: ShutdownHandle,
}

impl std::fmt::Debug for RodioWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state();
        f.debug_struct("RodioWrapper")
            .field("state", &state.state)
            .field("loaded", &state.loaded)
            .field("rate", &state.rate)
            .field("last_request", &state.last_request)
            .finish_non_exhaustive()
    }
}

impl RodioWrapper {
    /// Open the default output device.
    ///
    /// # Errors
    ///
    /// Returns [`AudioPlayerError::OutputInitFailed`] if no output is available.
    pub fn new() -> Result<Self, AudioPlayerError> {
        let (shutdown, receiver) = ShutdownHandle::new();
        let handle = spawn_output(receiver.clone())?;
        let wrapper = Self::with_device(Box::new(handle), shutdown)?;
        spawn_ticker(Arc::downgrade(&wrapper.shared), receiver);
        Ok(wrapper)
    }

    fn with_device(
        device: Box<dyn OutputDevice>,
        shutdown: ShutdownHandle,
    ) -> Result<Self, AudioPlayerError> {
        let output = device
            .open()
            .map_err(|e| AudioPlayerError::OutputInitFailed(e.to_string()))?;
        output.pause();

        Ok(Self {
            shared: Arc::new(Shared {
                device,
                state: Mutex::new(EngineState::new(output)),
                delegate: RwLock::new(None),
            }),
            _shutdown: shutdown,
        })
    }

    /// The configured pitch algorithm.
    #[must_use]
    pub fn time_pitch_algorithm(&self) -> TimePitchAlgorithm {
        self.shared.state().pitch_algorithm
    }

    /// Reset for `request` and report `Loading`. Returns the load's generation.
    fn begin_load(&self, request: &LoadRequest) -> u64 {
        let generation = {
            let mut state = self.shared.state();
            state.generation += 1;
            state.play_when_ready = request.play_when_ready;
            state.loaded = false;
            state.duration = 0.0;
            state.last_request = Some(request.clone());
            state.output.stop();
            state.generation
        };
        self.shared.transition(AudioPlayerState::Loading);
        generation
    }

    /// Replace the output. Reports the failure and returns `false` if the
    /// device refuses.
    fn recreate_output(&self) -> bool {
        let output = match self.shared.device.open() {
            Ok(output) => output,
            Err(error) => {
                log::error!("failed to recreate output: {error}");
                self.shared.notify(|d| d.did_fail(Some(error)));
                return false;
            }
        };
        let old = {
            let mut state = self.shared.state();
            output.set_speed(state.rate);
            output.set_volume(state.output_volume());
            output.pause();
            std::mem::replace(&mut state.output, output)
        };
        old.stop();
        log::debug!("recreated output");
        self.shared.notify(|d| d.did_recreate_engine());
        true
    }
}

/// Open the output stream on its own thread and hand back its handle.
fn spawn_output(shutdown: ShutdownReceiver) -> Result<OutputStreamHandle, AudioPlayerError> {
    let (tx, rx) = async_channel::bounded(1);
    std::thread::Builder::new()
        .name("playkit-output".into())
        .spawn(move || match OutputStream::try_default() {
            Ok((stream, handle)) => {
                let _ = tx.send_blocking(Ok(handle));
                shutdown.wait_blocking();
                drop(stream);
            }
            Err(e) => {
                let _ = tx.send_blocking(Err(e.to_string()));
            }
        })
        .map_err(|e| AudioPlayerError::OutputInitFailed(e.to_string()))?;

    rx.recv_blocking()
        .map_err(|e| AudioPlayerError::OutputInitFailed(e.to_string()))?
        .map_err(AudioPlayerError::OutputInitFailed)
}

fn spawn_ticker(shared: Weak<Shared>, shutdown: ShutdownReceiver) {
    std::thread::spawn(move || {
        while shutdown.sleep(TICK) {
            let Some(shared) = shared.upgrade() else {
                break;
            };
            shared.tick();
        }
    });
}

impl AudioPlayerWrapper for RodioWrapper {
    fn set_delegate(&self, delegate: Weak<dyn AudioPlayerWrapperDelegate>) {
        *self
            .shared
            .delegate
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(delegate);
    }

    fn state(&self) -> AudioPlayerState {
        self.shared.state().state
    }

    fn play_when_ready(&self) -> bool {
        self.shared.state().play_when_ready
    }

    fn set_play_when_ready(&self, play_when_ready: bool) {
        self.shared.state().play_when_ready = play_when_ready;
    }

    fn current_time(&self) -> f64 {
        self.shared.current_time()
    }

    fn duration(&self) -> f64 {
        self.shared.state().duration
    }

    fn buffered_position(&self) -> f64 {
        // Media is fully read before playback starts.
        let state = self.shared.state();
        if state.loaded { state.duration } else { 0.0 }
    }

    fn rate(&self) -> f32 {
        let state = self.shared.state();
        if state.state == AudioPlayerState::Playing {
            state.rate
        } else {
            0.0
        }
    }

    fn set_rate(&self, rate: f32) {
        let mut state = self.shared.state();
        state.rate = rate;
        state.output.set_speed(rate);
    }

    fn volume(&self) -> f32 {
        self.shared.state().volume
    }

    fn set_volume(&self, volume: f32) {
        let mut state = self.shared.state();
        state.volume = volume.clamp(0.0, 1.0);
        state.output.set_volume(state.output_volume());
    }

    fn is_muted(&self) -> bool {
        self.shared.state().muted
    }

    fn set_muted(&self, muted: bool) {
        let mut state = self.shared.state();
        state.muted = muted;
        state.output.set_volume(state.output_volume());
    }

    fn buffer_duration(&self) -> f64 {
        self.shared.state().buffer_duration
    }

    fn set_buffer_duration(&self, seconds: f64) {
        self.shared.state().buffer_duration = seconds.max(0.0);
    }

    fn time_event_frequency(&self) -> TimeEventFrequency {
        self.shared.state().time_event_frequency
    }

    fn set_time_event_frequency(&self, frequency: TimeEventFrequency) {
        self.shared.state().time_event_frequency = frequency;
    }

    fn automatically_waits_to_minimize_stalling(&self) -> bool {
        self.shared.state().waits_to_minimize_stalling
    }

    fn set_automatically_waits_to_minimize_stalling(&self, value: bool) {
        self.shared.state().waits_to_minimize_stalling = value;
    }

    fn set_time_pitch_algorithm(&self, algorithm: TimePitchAlgorithm) {
        log::debug!("time pitch algorithm set to {algorithm:?}");
        self.shared.state().pitch_algorithm = algorithm;
    }

    fn load(&self, request: LoadRequest) {
        let generation = self.begin_load(&request);

        log::debug!("loading {}", request.source);
        let shared = Arc::downgrade(&self.shared);
        std::thread::spawn(move || {
            let result = decode(&request);
            let Some(shared) = shared.upgrade() else {
                return;
            };
            match result {
                Ok(source) => shared.finish_load(generation, &request, source),
                Err(error) => shared.fail_load(generation, error),
            }
        });
    }

    fn play(&self) {
        let replay = {
            let mut state = self.shared.state();
            state.play_when_ready = true;
            if state.loaded {
                state.output.play();
                None
            } else {
                let replay = (state.state == AudioPlayerState::Stopped)
                    .then(|| state.last_request.clone())
                    .flatten();
                if replay.is_none() {
                    return;
                }
                replay
            }
        };

        if let Some(mut request) = replay {
            // Played to the end: start over.
            request.play_when_ready = true;
            request.initial_time = None;
            self.load(request);
        } else {
            self.shared.transition(AudioPlayerState::Playing);
        }
    }

    fn pause(&self) {
        {
            let mut state = self.shared.state();
            state.play_when_ready = false;
            if !state.loaded {
                return;
            }
            state.output.pause();
        }
        self.shared.transition(AudioPlayerState::Paused);
    }

    fn toggle_playing(&self) {
        if self.state() == AudioPlayerState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    fn stop(&self) {
        {
            let mut state = self.shared.state();
            state.generation += 1;
            state.loaded = false;
            state.duration = 0.0;
            state.last_request = None;
            state.output.stop();
        }
        self.shared.transition(AudioPlayerState::Stopped);
    }

    fn seek(&self, seconds: f64) {
        let seconds = seconds.max(0.0);
        let did_finish = {
            let state = self.shared.state();
            if state.loaded {
                match Duration::try_from_secs_f64(seconds) {
                    Ok(position) => match state.output.try_seek(position) {
                        Ok(()) => true,
                        Err(e) => {
                            log::warn!("seek to {seconds}s failed: {e}");
                            false
                        }
                    },
                    Err(e) => {
                        log::warn!("cannot seek to {seconds}s: {e}");
                        false
                    }
                }
            } else {
                false
            }
        };
        self.shared.notify(|d| d.seek_did_complete(seconds, did_finish));
    }

    fn seek_by(&self, offset: f64) {
        self.seek(self.current_time() + offset);
    }

    fn reload(&self, start_from_current_time: bool) {
        let (request, failed) = {
            let state = self.shared.state();
            (state.last_request.clone(), state.state == AudioPlayerState::Failed)
        };
        let Some(mut request) = request else {
            return;
        };

        if failed && !self.recreate_output() {
            return;
        }
        request.initial_time = if start_from_current_time {
            Some(self.current_time())
        } else {
            None
        };
        request.play_when_ready = self.play_when_ready();
        self.load(request);
    }
}
