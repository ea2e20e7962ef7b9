use std::io::Cursor;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use playkit_audio::{
    Artwork, ArtworkHandler, AudioItem, AudioPlayer, AudioPlayerError, AudioPlayerState,
    AudioPlayerWrapper, AudioPlayerWrapperDelegate, CommandOutcome, DefaultAudioItem, LoadOptions,
    LoadRequest, MediaCommand, MediaSource, NowPlayingEntry, NowPlayingInfo,
    NowPlayingInfoCenter, NowPlayingInfoController, NowPlayingKey, PlaybackEndedReason,
    PlaybackError, RemoteCommand, RemoteCommandRouter, SeekEvent, SourceType, TimeEventFrequency,
    TimePitchAlgorithm,
};

#[derive(Debug, Clone, PartialEq)]
enum EngineCall {
    Load(LoadRequest),
    Play,
    Pause,
    TogglePlaying,
    Stop,
    Seek(f64),
    SeekBy(f64),
    Reload(bool),
    SetRate(f32),
    SetTimePitchAlgorithm(TimePitchAlgorithm),
}

struct EngineInner {
    calls: Vec<EngineCall>,
    state: AudioPlayerState,
    live_rate: f32,
    play_when_ready: bool,
    current_time: f64,
    duration: f64,
    volume: f32,
    muted: bool,
    buffer_duration: f64,
    frequency: TimeEventFrequency,
    waits_to_minimize_stalling: bool,
}

/// Test side of the fake engine: inspects calls and reports callbacks.
struct EngineProbe {
    inner: Mutex<EngineInner>,
    delegate: RwLock<Option<Weak<dyn AudioPlayerWrapperDelegate>>>,
}

impl EngineProbe {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(EngineInner {
                calls: Vec::new(),
                state: AudioPlayerState::Idle,
                live_rate: 0.0,
                play_when_ready: true,
                current_time: 0.0,
                duration: 0.0,
                volume: 1.0,
                muted: false,
                buffer_duration: 0.0,
                frequency: TimeEventFrequency::default(),
                waits_to_minimize_stalling: true,
            }),
            delegate: RwLock::new(None),
        })
    }

    fn record(&self, call: EngineCall) {
        self.inner.lock().unwrap().calls.push(call);
    }

    fn calls(&self) -> Vec<EngineCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    fn set_live_rate(&self, rate: f32) {
        self.inner.lock().unwrap().live_rate = rate;
    }

    fn set_timing(&self, current_time: f64, duration: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.current_time = current_time;
        inner.duration = duration;
    }

    fn delegate(&self) -> Arc<dyn AudioPlayerWrapperDelegate> {
        self.delegate
            .read()
            .unwrap()
            .as_ref()
            .and_then(Weak::upgrade)
            .expect("delegate installed and alive")
    }

    fn report_state(&self, state: AudioPlayerState) {
        self.inner.lock().unwrap().state = state;
        self.delegate().state_did_change(state);
    }
}

struct FakeEngine(Arc<EngineProbe>);

impl AudioPlayerWrapper for FakeEngine {
    fn set_delegate(&self, delegate: Weak<dyn AudioPlayerWrapperDelegate>) {
        *self.0.delegate.write().unwrap() = Some(delegate);
    }

    fn state(&self) -> AudioPlayerState {
        self.0.inner.lock().unwrap().state
    }

    fn play_when_ready(&self) -> bool {
        self.0.inner.lock().unwrap().play_when_ready
    }

    fn set_play_when_ready(&self, play_when_ready: bool) {
        self.0.inner.lock().unwrap().play_when_ready = play_when_ready;
    }

    fn current_time(&self) -> f64 {
        self.0.inner.lock().unwrap().current_time
    }

    fn duration(&self) -> f64 {
        self.0.inner.lock().unwrap().duration
    }

    fn buffered_position(&self) -> f64 {
        self.0.inner.lock().unwrap().duration / 2.0
    }

    fn rate(&self) -> f32 {
        self.0.inner.lock().unwrap().live_rate
    }

    fn set_rate(&self, rate: f32) {
        self.0.record(EngineCall::SetRate(rate));
    }

    fn volume(&self) -> f32 {
        self.0.inner.lock().unwrap().volume
    }

    fn set_volume(&self, volume: f32) {
        self.0.inner.lock().unwrap().volume = volume;
    }

    fn is_muted(&self) -> bool {
        self.0.inner.lock().unwrap().muted
    }

    fn set_muted(&self, muted: bool) {
        self.0.inner.lock().unwrap().muted = muted;
    }

    fn buffer_duration(&self) -> f64 {
        self.0.inner.lock().unwrap().buffer_duration
    }

    fn set_buffer_duration(&self, seconds: f64) {
        self.0.inner.lock().unwrap().buffer_duration = seconds;
    }

    fn time_event_frequency(&self) -> TimeEventFrequency {
        self.0.inner.lock().unwrap().frequency
    }

    fn set_time_event_frequency(&self, frequency: TimeEventFrequency) {
        self.0.inner.lock().unwrap().frequency = frequency;
    }

    fn automatically_waits_to_minimize_stalling(&self) -> bool {
        self.0.inner.lock().unwrap().waits_to_minimize_stalling
    }

    fn set_automatically_waits_to_minimize_stalling(&self, value: bool) {
        self.0.inner.lock().unwrap().waits_to_minimize_stalling = value;
    }

    fn set_time_pitch_algorithm(&self, algorithm: TimePitchAlgorithm) {
        self.0.record(EngineCall::SetTimePitchAlgorithm(algorithm));
    }

    fn load(&self, request: LoadRequest) {
        self.0.record(EngineCall::Load(request));
    }

    fn play(&self) {
        self.0.record(EngineCall::Play);
    }

    fn pause(&self) {
        self.0.record(EngineCall::Pause);
    }

    fn toggle_playing(&self) {
        self.0.record(EngineCall::TogglePlaying);
    }

    fn stop(&self) {
        self.0.record(EngineCall::Stop);
    }

    fn seek(&self, seconds: f64) {
        self.0.record(EngineCall::Seek(seconds));
    }

    fn seek_by(&self, offset: f64) {
        self.0.record(EngineCall::SeekBy(offset));
    }

    fn reload(&self, start_from_current_time: bool) {
        self.0.record(EngineCall::Reload(start_from_current_time));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkCall {
    Set,
    SetMany,
    SetManyWithoutUpdate,
    Clear,
}

/// Now-playing sink that records how it was driven.
struct RecordingNowPlaying {
    info: NowPlayingInfoCenter,
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingNowPlaying {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            info: NowPlayingInfoCenter::detached(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl NowPlayingInfoController for RecordingNowPlaying {
    fn info(&self) -> NowPlayingInfo {
        self.info.info()
    }

    fn set(&self, entry: NowPlayingEntry) {
        self.calls.lock().unwrap().push(SinkCall::Set);
        self.info.set(entry);
    }

    fn set_many(&self, entries: Vec<NowPlayingEntry>) {
        self.calls.lock().unwrap().push(SinkCall::SetMany);
        self.info.set_many(entries);
    }

    fn set_many_without_update(&self, entries: Vec<NowPlayingEntry>) {
        self.calls.lock().unwrap().push(SinkCall::SetManyWithoutUpdate);
        self.info.set_many_without_update(entries);
    }

    fn clear(&self) {
        self.calls.lock().unwrap().push(SinkCall::Clear);
        self.info.clear();
    }
}

#[derive(Default)]
struct RecordingRouter {
    pushes: Mutex<Vec<Vec<RemoteCommand>>>,
}

impl RecordingRouter {
    fn pushes(&self) -> Vec<Vec<RemoteCommand>> {
        self.pushes.lock().unwrap().clone()
    }
}

impl RemoteCommandRouter for RecordingRouter {
    fn enable_remote_commands(&self, commands: &[RemoteCommand]) {
        self.pushes.lock().unwrap().push(commands.to_vec());
    }

    fn enabled_commands(&self) -> Vec<RemoteCommand> {
        self.pushes.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

/// Item whose artwork fetches complete only when the test says so.
struct ManualArtworkItem {
    source_url: String,
    pending: Arc<Mutex<Vec<ArtworkHandler>>>,
}

impl AudioItem for ManualArtworkItem {
    fn source_url(&self) -> &str {
        &self.source_url
    }

    fn source_type(&self) -> SourceType {
        SourceType::File
    }

    fn load_artwork(&self, handler: ArtworkHandler) {
        self.pending.lock().unwrap().push(handler);
    }
}

struct Harness {
    player: AudioPlayer,
    engine: Arc<EngineProbe>,
    now_playing: Arc<RecordingNowPlaying>,
    router: Arc<RecordingRouter>,
}

fn harness() -> Harness {
    harness_with(|builder| builder)
}

fn harness_with(
    configure: impl FnOnce(playkit_audio::AudioPlayerBuilder) -> playkit_audio::AudioPlayerBuilder,
) -> Harness {
    let engine = EngineProbe::new();
    let now_playing = RecordingNowPlaying::new();
    let router = Arc::new(RecordingRouter::default());
    let builder = AudioPlayer::builder()
        .wrapper(Box::new(FakeEngine(Arc::clone(&engine))))
        .now_playing(Arc::clone(&now_playing) as Arc<dyn NowPlayingInfoController>)
        .remote_command_router(Arc::clone(&router) as Arc<dyn RemoteCommandRouter>);
    let player = configure(builder)
        .build()
        .expect("player with fake collaborators");
    Harness {
        player,
        engine,
        now_playing,
        router,
    }
}

fn song() -> Arc<dyn AudioItem> {
    Arc::new(
        DefaultAudioItem::new("https://example.com/song.mp3", SourceType::Stream)
            .title("Song")
            .artist("Artist")
            .album_title("Album"),
    )
}

fn record<T: Clone + Send + 'static>(
    event: &playkit_audio::Event<T>,
) -> Arc<Mutex<Vec<T>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    event.subscribe(move |value: &T| sink.lock().unwrap().push(value.clone()));
    seen
}

fn png_artwork() -> Artwork {
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::new_rgb8(2, 2)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    Artwork::decode(buf.into_inner()).expect("decode png")
}

#[test]
fn invalid_stream_url_changes_nothing() {
    let h = harness();

    let item: Arc<dyn AudioItem> =
        Arc::new(DefaultAudioItem::new("::not a url::", SourceType::Stream));
    let result = h.player.load(item, Some(true));

    assert_eq!(
        result,
        Err(AudioPlayerError::InvalidSourceUrl("::not a url::".to_string()))
    );
    assert!(h.player.current_item().is_none());
    assert!(h.now_playing.calls().is_empty());
    assert!(h.now_playing.info().is_empty());
    assert!(h.engine.calls().is_empty());
    assert!(h.router.pushes().is_empty());
}

#[test]
fn invalid_load_keeps_the_previous_item() {
    let h = harness();
    let first = song();
    h.player.load(Arc::clone(&first), None).expect("valid load");
    let info_before = h.now_playing.info();

    let bad: Arc<dyn AudioItem> = Arc::new(DefaultAudioItem::new("no scheme", SourceType::Stream));
    assert!(h.player.load(bad, None).is_err());

    let current = h.player.current_item().expect("still loaded");
    assert!(Arc::ptr_eq(&current, &first));
    assert_eq!(h.now_playing.info(), info_before);
}

#[test]
fn load_clears_timing_fields_and_forwards_request() {
    let h = harness();
    let item: Arc<dyn AudioItem> = Arc::new(
        DefaultAudioItem::new("/music/track.flac", SourceType::File)
            .title("Track")
            .initial_time(42.0)
            .asset_options(LoadOptions::default().user_agent("playkit-test")),
    );

    h.player
        .load(Arc::clone(&item), Some(false))
        .expect("file items always load");

    let current = h.player.current_item().expect("current item");
    assert!(Arc::ptr_eq(&current, &item));

    let info = h.now_playing.info();
    assert!(info.is_cleared(NowPlayingKey::PlaybackDuration));
    assert!(info.is_cleared(NowPlayingKey::PlaybackRate));
    assert!(info.is_cleared(NowPlayingKey::ElapsedPlaybackTime));
    assert_eq!(info.text(NowPlayingKey::Title), Some("Track"));
    assert_eq!(
        h.now_playing.calls().first(),
        Some(&SinkCall::SetManyWithoutUpdate)
    );

    assert_eq!(
        h.engine.calls(),
        vec![EngineCall::Load(LoadRequest {
            source: MediaSource::File("/music/track.flac".into()),
            play_when_ready: false,
            initial_time: Some(42.0),
            options: Some(LoadOptions::default().user_agent("playkit-test")),
        })]
    );
}

#[test]
fn load_without_override_keeps_engine_play_when_ready() {
    let h = harness();
    h.player.set_play_when_ready(false);

    h.player.load(song(), None).expect("load");

    assert!(matches!(
        h.engine.calls().as_slice(),
        [EngineCall::Load(LoadRequest {
            play_when_ready: false,
            initial_time: None,
            options: None,
            ..
        })]
    ));
}

#[test]
fn load_without_automatic_sync_leaves_now_playing_alone() {
    let h = harness_with(|b| b.automatically_update_now_playing_info(false));

    h.player.load(song(), None).expect("load");
    h.engine.report_state(AudioPlayerState::Ready);

    assert!(h.now_playing.calls().is_empty());
    assert_eq!(h.router.pushes().len(), 1);
}

#[test]
fn rate_is_cached_until_playing() {
    let h = harness();
    h.engine.set_live_rate(0.0);

    h.player.set_rate(1.5);

    assert_eq!(h.player.rate(), 1.5);
    assert_eq!(h.engine.count(|c| matches!(c, EngineCall::SetRate(_))), 0);

    h.engine.set_live_rate(1.0);
    h.engine.report_state(AudioPlayerState::Playing);

    let rates: Vec<_> = h
        .engine
        .calls()
        .into_iter()
        .filter(|c| matches!(c, EngineCall::SetRate(_)))
        .collect();
    assert_eq!(rates, vec![EngineCall::SetRate(1.5)]);
}

#[test]
fn rate_applies_immediately_while_playing() {
    let h = harness();
    h.engine.set_live_rate(1.0);

    h.player.set_rate(2.0);

    assert_eq!(h.engine.calls(), vec![EngineCall::SetRate(2.0)]);
}

#[test]
fn paused_then_resumed_playback_keeps_the_custom_rate() {
    let h = harness();
    h.engine.set_live_rate(1.0);
    h.player.set_rate(0.75);
    h.engine.set_live_rate(0.0);
    h.engine.report_state(AudioPlayerState::Paused);
    h.engine.clear_calls();

    h.engine.report_state(AudioPlayerState::Playing);

    assert_eq!(h.engine.count(|c| *c == EngineCall::SetRate(0.75)), 1);
}

#[test]
fn new_default_commands_are_pushed_once_while_loaded() {
    let h = harness();
    h.player.load(song(), None).expect("load");
    assert_eq!(h.router.pushes(), vec![RemoteCommand::defaults()]);

    h.player
        .set_remote_commands(vec![RemoteCommand::Play, RemoteCommand::Next]);

    let pushes = h.router.pushes();
    assert_eq!(pushes.len(), 2);
    assert_eq!(
        pushes.last(),
        Some(&vec![RemoteCommand::Play, RemoteCommand::Next])
    );
}

#[test]
fn new_default_commands_wait_for_an_item() {
    let h = harness();

    h.player.set_remote_commands(vec![RemoteCommand::Pause]);

    assert!(h.router.pushes().is_empty());
    assert_eq!(h.player.remote_commands(), vec![RemoteCommand::Pause]);

    h.player.load(song(), None).expect("load");
    assert_eq!(h.router.pushes(), vec![vec![RemoteCommand::Pause]]);
}

#[test]
fn item_commands_override_the_default() {
    let h = harness_with(|b| b.remote_commands(vec![RemoteCommand::Stop]));
    let item: Arc<dyn AudioItem> = Arc::new(
        DefaultAudioItem::new("/a.mp3", SourceType::File)
            .remote_commands(vec![RemoteCommand::Next, RemoteCommand::Previous]),
    );

    h.player.load(Arc::clone(&item), None).expect("load");
    h.player.set_remote_commands(vec![RemoteCommand::Play]);

    assert_eq!(
        h.router.pushes(),
        vec![
            vec![RemoteCommand::Next, RemoteCommand::Previous],
            vec![RemoteCommand::Next, RemoteCommand::Previous],
        ]
    );
}

#[test]
fn stop_emits_one_stopped_event_and_clears_item() {
    let h = harness();
    let ended = record(&h.player.events().playback_end);
    h.player.load(song(), None).expect("load");
    h.engine.report_state(AudioPlayerState::Playing);

    h.player.stop();

    assert_eq!(*ended.lock().unwrap(), vec![PlaybackEndedReason::PlayerStopped]);
    assert!(h.player.current_item().is_none());
    assert_eq!(h.engine.count(|c| *c == EngineCall::Stop), 1);
    assert!(h.now_playing.info().is_empty());
}

#[test]
fn stop_without_item_still_resets() {
    let h = harness();
    let ended = record(&h.player.events().playback_end);

    h.player.stop();

    assert_eq!(*ended.lock().unwrap(), vec![PlaybackEndedReason::PlayerStopped]);
    assert_eq!(h.engine.calls(), vec![EngineCall::Stop]);
}

#[test]
fn natural_end_keeps_current_item() {
    let h = harness();
    let ended = record(&h.player.events().playback_end);
    h.player.load(song(), None).expect("load");

    h.engine.delegate().did_play_to_end();

    assert_eq!(*ended.lock().unwrap(), vec![PlaybackEndedReason::PlayedUntilEnd]);
    assert!(h.player.current_item().is_some());
    assert_eq!(h.engine.count(|c| *c == EngineCall::Stop), 0);
}

#[test]
fn state_event_follows_policy_reactions() {
    let h = harness();
    h.player.load(song(), None).expect("load");
    h.engine.clear_calls();

    let engine = Arc::clone(&h.engine);
    let now_playing = Arc::clone(&h.now_playing);
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    h.player.events().state_change.subscribe(move |state| {
        let info = now_playing.info();
        sink.lock()
            .unwrap()
            .push((*state, engine.calls(), info.number(NowPlayingKey::PlaybackDuration)));
    });

    h.engine.set_timing(3.0, 180.0);
    h.engine.report_state(AudioPlayerState::Ready);

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 1);
    let (state, calls, duration) = &observed[0];
    assert_eq!(*state, AudioPlayerState::Ready);
    assert_eq!(
        calls,
        &vec![EngineCall::SetTimePitchAlgorithm(TimePitchAlgorithm::TimeDomain)]
    );
    assert_eq!(*duration, Some(180.0));
}

#[test]
fn every_state_report_emits_exactly_once() {
    let h = harness();
    let states = record(&h.player.events().state_change);
    let all = [
        AudioPlayerState::Loading,
        AudioPlayerState::Ready,
        AudioPlayerState::Playing,
        AudioPlayerState::Paused,
        AudioPlayerState::Stopped,
        AudioPlayerState::Failed,
        AudioPlayerState::Idle,
    ];

    for state in all {
        h.engine.report_state(state);
    }

    assert_eq!(*states.lock().unwrap(), all.to_vec());
}

#[test]
fn terminal_states_do_not_resync_now_playing() {
    let h = harness();

    h.engine.report_state(AudioPlayerState::Stopped);
    h.engine.report_state(AudioPlayerState::Failed);
    assert!(h.now_playing.calls().is_empty());

    h.engine.report_state(AudioPlayerState::Paused);
    assert_eq!(h.now_playing.calls(), vec![SinkCall::SetMany]);
}

#[test]
fn playback_values_use_live_engine_rate() {
    let h = harness();
    h.engine.set_live_rate(0.0);
    h.player.set_rate(1.25);
    h.engine.set_timing(12.0, 60.0);

    h.player.update_now_playing_playback_values();

    let info = h.now_playing.info();
    assert_eq!(info.number(NowPlayingKey::PlaybackRate), Some(0.0));
    assert_eq!(info.number(NowPlayingKey::ElapsedPlaybackTime), Some(12.0));
    assert_eq!(info.number(NowPlayingKey::PlaybackDuration), Some(60.0));
}

#[test]
fn item_pitch_algorithm_overrides_the_default() {
    let h = harness_with(|b| b.audio_time_pitch_algorithm(TimePitchAlgorithm::Spectral));
    h.engine.report_state(AudioPlayerState::Loading);
    assert_eq!(
        h.engine.calls(),
        vec![EngineCall::SetTimePitchAlgorithm(TimePitchAlgorithm::Spectral)]
    );

    let item: Arc<dyn AudioItem> = Arc::new(
        DefaultAudioItem::new("/a.mp3", SourceType::File)
            .pitch_algorithm(TimePitchAlgorithm::Varispeed),
    );
    h.player.load(item, None).expect("load");
    h.engine.clear_calls();
    h.engine.report_state(AudioPlayerState::Ready);

    assert_eq!(
        h.engine.calls(),
        vec![EngineCall::SetTimePitchAlgorithm(TimePitchAlgorithm::Varispeed)]
    );
}

#[test]
fn seek_completion_pushes_elapsed_time() {
    let h = harness();
    let seeks = record(&h.player.events().seek);
    h.engine.set_timing(30.0, 120.0);

    h.engine.delegate().seek_did_complete(30.0, true);

    assert_eq!(
        *seeks.lock().unwrap(),
        vec![SeekEvent {
            seconds: 30.0,
            did_finish: true
        }]
    );
    assert_eq!(
        h.now_playing.info().number(NowPlayingKey::ElapsedPlaybackTime),
        Some(30.0)
    );
}

#[test]
fn engine_reports_are_reemitted() {
    let h = harness();
    let failures = record(&h.player.events().fail);
    let durations = record(&h.player.events().update_duration);
    let elapsed = record(&h.player.events().seconds_elapse);
    let recreated = record(&h.player.events().did_recreate_engine);
    let metadata = record(&h.player.events().received_metadata);
    let delegate = h.engine.delegate();

    delegate.did_fail(Some(PlaybackError::Network("timed out".into())));
    delegate.did_fail(None);
    delegate.did_update_duration(215.0);
    delegate.seconds_elapsed(4.0);
    delegate.did_recreate_engine();
    delegate.did_receive_metadata(vec![playkit_audio::TimedMetadata {
        key: "StreamTitle".into(),
        value: "Live".into(),
    }]);

    assert_eq!(
        *failures.lock().unwrap(),
        vec![Some(PlaybackError::Network("timed out".into())), None]
    );
    assert_eq!(*durations.lock().unwrap(), vec![215.0]);
    assert_eq!(*elapsed.lock().unwrap(), vec![4.0]);
    assert_eq!(recreated.lock().unwrap().len(), 1);
    assert_eq!(metadata.lock().unwrap()[0][0].value, "Live");
}

#[test]
fn transport_calls_are_forwarded() {
    let h = harness();

    h.player.play();
    h.player.pause();
    h.player.toggle_playing();
    h.player.seek(12.5);
    h.player.seek_by(-5.0);
    h.player.reload(true);

    assert_eq!(
        h.engine.calls(),
        vec![
            EngineCall::Play,
            EngineCall::Pause,
            EngineCall::TogglePlaying,
            EngineCall::Seek(12.5),
            EngineCall::SeekBy(-5.0),
            EngineCall::Reload(true),
        ]
    );
}

#[test]
fn properties_mirror_the_engine() {
    let h = harness();

    h.player.set_volume(0.4);
    h.player.set_muted(true);
    h.player.set_buffer_duration(8.0);
    h.player
        .set_time_event_frequency(TimeEventFrequency::EveryQuarterSecond);
    h.player.set_automatically_waits_to_minimize_stalling(false);
    h.engine.set_timing(10.0, 100.0);

    assert_eq!(h.player.volume(), 0.4);
    assert!(h.player.is_muted());
    assert_eq!(h.player.buffer_duration(), 8.0);
    assert_eq!(
        h.player.time_event_frequency(),
        TimeEventFrequency::EveryQuarterSecond
    );
    assert!(!h.player.automatically_waits_to_minimize_stalling());
    assert_eq!(h.player.current_time(), 10.0);
    assert_eq!(h.player.duration(), 100.0);
    assert_eq!(h.player.buffered_position(), 50.0);
    assert_eq!(h.player.player_state(), AudioPlayerState::Idle);
}

#[test]
fn disabled_remote_commands_are_rejected() {
    let h = harness_with(|b| b.remote_commands(vec![RemoteCommand::Pause]));
    h.player.load(song(), None).expect("load");
    h.engine.clear_calls();

    assert_eq!(
        h.player.handle_remote_command(&MediaCommand::Stop),
        CommandOutcome::Disabled
    );
    assert_eq!(
        h.player.handle_remote_command(&MediaCommand::Pause),
        CommandOutcome::Handled
    );
    assert_eq!(h.engine.calls(), vec![EngineCall::Pause]);
}

#[test]
fn skip_commands_fall_back_to_preferred_interval() {
    let h = harness_with(|b| {
        b.remote_commands(vec![
            RemoteCommand::SkipForward {
                preferred_intervals: vec![30.0],
            },
            RemoteCommand::SkipBackward {
                preferred_intervals: vec![10.0],
            },
            RemoteCommand::ChangePlaybackPosition,
        ])
    });
    h.player.load(song(), None).expect("load");
    h.engine.clear_calls();

    h.player.handle_remote_command(&MediaCommand::SeekForward(None));
    h.player.handle_remote_command(&MediaCommand::SeekBackward(None));
    h.player.handle_remote_command(&MediaCommand::SeekBackward(Some(Duration::from_secs(5))));
    h.player.handle_remote_command(&MediaCommand::Seek(Duration::from_secs(90)));

    assert_eq!(
        h.engine.calls(),
        vec![
            EngineCall::SeekBy(30.0),
            EngineCall::SeekBy(-10.0),
            EngineCall::SeekBy(-5.0),
            EngineCall::Seek(90.0),
        ]
    );
}

#[test]
fn toggle_command_enables_play_and_pause_keys() {
    let h = harness_with(|b| b.remote_commands(vec![RemoteCommand::TogglePlayPause]));
    h.player.load(song(), None).expect("load");
    h.engine.clear_calls();

    assert_eq!(
        h.player.handle_remote_command(&MediaCommand::Play),
        CommandOutcome::Handled
    );
    assert_eq!(
        h.player.handle_remote_command(&MediaCommand::PlayPause),
        CommandOutcome::Handled
    );
    assert_eq!(
        h.engine.calls(),
        vec![EngineCall::Play, EngineCall::TogglePlaying]
    );
}

#[test]
fn track_commands_go_to_the_application_handler() {
    let h = harness_with(|b| {
        b.remote_commands(vec![RemoteCommand::Next, RemoteCommand::Previous])
    });
    h.player.load(song(), None).expect("load");

    assert_eq!(
        h.player.handle_remote_command(&MediaCommand::Next),
        CommandOutcome::NoHandler
    );

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    h.player.set_remote_command_handler(move |command| {
        sink.lock().unwrap().push(command.clone());
        if *command == MediaCommand::Next {
            CommandOutcome::Handled
        } else {
            CommandOutcome::Failed
        }
    });

    assert_eq!(
        h.player.handle_remote_command(&MediaCommand::Next),
        CommandOutcome::Handled
    );
    assert_eq!(
        h.player.handle_remote_command(&MediaCommand::Previous),
        CommandOutcome::Failed
    );
    assert_eq!(
        h.player.handle_remote_command(&MediaCommand::Like),
        CommandOutcome::Disabled
    );
    assert_eq!(
        *received.lock().unwrap(),
        vec![MediaCommand::Next, MediaCommand::Previous]
    );
}

#[test]
fn stale_artwork_fetch_is_discarded() {
    let h = harness();
    let pending = Arc::new(Mutex::new(Vec::new()));
    let item = || -> Arc<dyn AudioItem> {
        Arc::new(ManualArtworkItem {
            source_url: "/a.mp3".into(),
            pending: Arc::clone(&pending),
        })
    };

    h.player.load(item(), None).expect("first load");
    h.player.load(item(), None).expect("second load");
    let mut handlers: Vec<ArtworkHandler> = pending.lock().unwrap().drain(..).collect();
    assert_eq!(handlers.len(), 2);
    let latest = handlers.pop().expect("second fetch");
    let stale = handlers.pop().expect("first fetch");

    latest(None);
    stale(Some(png_artwork()));

    let info = h.now_playing.info();
    assert!(info.is_cleared(NowPlayingKey::Artwork));
    assert!(info.artwork().is_none());
}

#[test]
fn artwork_fetch_after_stop_is_discarded() {
    let h = harness();
    let pending = Arc::new(Mutex::new(Vec::new()));
    let item: Arc<dyn AudioItem> = Arc::new(ManualArtworkItem {
        source_url: "/a.mp3".into(),
        pending: Arc::clone(&pending),
    });

    h.player.load(item, None).expect("load");
    h.player.stop();
    let handler = pending.lock().unwrap().pop().expect("fetch started");
    handler(Some(png_artwork()));

    assert!(!h.now_playing.info().contains_key(NowPlayingKey::Artwork));
}

#[test]
fn meta_values_are_pushed_then_artwork_arrives() {
    let h = harness();
    let pending = Arc::new(Mutex::new(Vec::new()));
    let item: Arc<dyn AudioItem> = Arc::new(ManualArtworkItem {
        source_url: "/a.mp3".into(),
        pending: Arc::clone(&pending),
    });
    h.player.load(item, None).expect("load");
    assert!(!h.now_playing.info().contains_key(NowPlayingKey::Artwork));

    let handler = pending.lock().unwrap().pop().expect("fetch started");
    handler(Some(png_artwork()));

    let info = h.now_playing.info();
    assert_eq!(info.artwork().map(|a| (a.width(), a.height())), Some((2, 2)));
    assert!(info.is_cleared(NowPlayingKey::Title));
}

#[test]
fn meta_values_without_item_do_nothing() {
    let h = harness();

    h.player.load_now_playing_meta_values();

    assert!(h.now_playing.calls().is_empty());
}

#[test]
fn dropped_player_ignores_late_engine_callbacks() {
    let h = harness();
    let engine = Arc::clone(&h.engine);
    drop(h);

    let delegate = engine.delegate.read().unwrap().clone().expect("installed");
    assert!(delegate.upgrade().is_none());
}
