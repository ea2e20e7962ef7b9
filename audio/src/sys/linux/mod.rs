//! Linux media control implementation using MPRIS D-Bus.

use super::{NowPlayingSnapshot, PlaybackStatus};
use crate::error::MediaError;
use crate::item::Artwork;
use crate::remote::{MediaCommand, RemoteCommand, RemoteCommandKind};
use async_channel::Sender;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use zbus::object_server::SignalEmitter;
use zbus::zvariant::{ObjectPath, Value};
use zbus::{Connection, interface};

const BUS_NAME: &str = "org.mpris.MediaPlayer2.playkit";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const TRACK_ID: &str = "/org/playkit/track/current";

/// Artwork written to disk for `mpris:artUrl`.
struct StoredArtwork {
    artwork: Artwork,
    path: PathBuf,
}

/// State served over D-Bus.
struct MprisState {
    snapshot: Option<NowPlayingSnapshot>,
    artwork: Option<StoredArtwork>,
    enabled: Vec<RemoteCommandKind>,
    sender: Option<Sender<MediaCommand>>,
}

static STATE: RwLock<MprisState> = RwLock::new(MprisState {
    snapshot: None,
    artwork: None,
    enabled: Vec::new(),
    sender: None,
});

/// Gives every artwork file its own name; clients cache by URL.
static ARTWORK_SERIAL: AtomicU64 = AtomicU64::new(0);

/// Make `stored` hold `artwork`, writing a new file only when it changed.
fn sync_artwork(stored: &mut Option<StoredArtwork>, artwork: Option<&Artwork>) {
    if stored.as_ref().map(|s| &s.artwork) == artwork {
        return;
    }
    if let Some(old) = stored.take() {
        let _ = std::fs::remove_file(&old.path);
    }
    let Some(artwork) = artwork else {
        return;
    };

    let serial = ARTWORK_SERIAL.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "playkit-artwork-{}-{serial}",
        std::process::id()
    ));
    match std::fs::write(&path, artwork.bytes()) {
        Ok(()) => {
            *stored = Some(StoredArtwork {
                artwork: artwork.clone(),
                path,
            });
        }
        Err(e) => log::warn!("failed to write artwork for MPRIS: {e}"),
    }
}

fn with_state<R>(f: impl FnOnce(&MprisState) -> R) -> R {
    f(&STATE.read().unwrap_or_else(PoisonError::into_inner))
}

fn can(kind: RemoteCommandKind) -> bool {
    with_state(|state| state.enabled.contains(&kind))
}

fn dispatch_command(command: MediaCommand) {
    with_state(|state| {
        if let Some(sender) = &state.sender {
            let _ = sender.try_send(command);
        }
    });
}

/// MPRIS `MediaPlayer2` interface.
struct MediaPlayer2;

#[interface(name = "org.mpris.MediaPlayer2")]
impl MediaPlayer2 {
    #[zbus(property)]
    fn can_quit(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> String {
        "Playkit".to_string()
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string(), "http".to_string(), "https".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }

    fn raise(&self) {}
    fn quit(&self) {}
}

/// MPRIS `Player` interface.
struct MprisPlayer;

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl MprisPlayer {
    #[zbus(property)]
    fn playback_status(&self) -> String {
        let status = with_state(|state| {
            state
                .snapshot
                .as_ref()
                .map(NowPlayingSnapshot::status)
                .unwrap_or_default()
        });
        match status {
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
            PlaybackStatus::Stopped => "Stopped",
        }
        .to_string()
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, Value<'static>> {
        with_state(|state| {
            let mut metadata: HashMap<String, Value<'static>> = HashMap::new();
            let Some(snapshot) = &state.snapshot else {
                return metadata;
            };
            metadata.insert(
                "mpris:trackid".to_string(),
                Value::from(ObjectPath::from_static_str_unchecked(TRACK_ID)),
            );
            if let Some(title) = &snapshot.title {
                metadata.insert("xesam:title".to_string(), Value::from(title.clone()));
            }
            if let Some(artist) = &snapshot.artist {
                metadata.insert("xesam:artist".to_string(), Value::from(vec![artist.clone()]));
            }
            if let Some(album) = &snapshot.album {
                metadata.insert("xesam:album".to_string(), Value::from(album.clone()));
            }
            if let Some(stored) = &state.artwork {
                metadata.insert(
                    "mpris:artUrl".to_string(),
                    Value::from(format!("file://{}", stored.path.display())),
                );
            }
            if let Some(duration) = snapshot.duration.filter(|d| d.is_finite() && *d > 0.0) {
                metadata.insert("mpris:length".to_string(), Value::from(micros(duration)));
            }
            metadata
        })
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        with_state(|state| {
            state
                .snapshot
                .as_ref()
                .and_then(|s| s.elapsed)
                .map_or(0, micros)
        })
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        with_state(|state| {
            state
                .snapshot
                .as_ref()
                .and_then(|s| s.rate)
                .filter(|rate| *rate > 0.0)
                .unwrap_or(1.0)
        })
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        0.25
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        4.0
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        can(RemoteCommandKind::Next)
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        can(RemoteCommandKind::Previous)
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        can(RemoteCommandKind::Play) || can(RemoteCommandKind::TogglePlayPause)
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        can(RemoteCommandKind::Pause) || can(RemoteCommandKind::TogglePlayPause)
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        can(RemoteCommandKind::ChangePlaybackPosition)
            || can(RemoteCommandKind::SkipForward)
            || can(RemoteCommandKind::SkipBackward)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    fn next(&self) {
        dispatch_command(MediaCommand::Next);
    }

    fn previous(&self) {
        dispatch_command(MediaCommand::Previous);
    }

    fn pause(&self) {
        dispatch_command(MediaCommand::Pause);
    }

    fn play_pause(&self) {
        dispatch_command(MediaCommand::PlayPause);
    }

    fn stop(&self) {
        dispatch_command(MediaCommand::Stop);
    }

    fn play(&self) {
        dispatch_command(MediaCommand::Play);
    }

    fn seek(&self, offset: i64) {
        let amount = Some(Duration::from_micros(offset.unsigned_abs()));
        if offset >= 0 {
            dispatch_command(MediaCommand::SeekForward(amount));
        } else {
            dispatch_command(MediaCommand::SeekBackward(amount));
        }
    }

    fn set_position(&self, _track_id: ObjectPath<'_>, position: i64) {
        if position >= 0 {
            dispatch_command(MediaCommand::Seek(Duration::from_micros(
                position.unsigned_abs(),
            )));
        }
    }

    fn open_uri(&self, _uri: String) {}
}

#[allow(clippy::cast_possible_truncation)]
fn micros(seconds: f64) -> i64 {
    (seconds.max(0.0) * 1_000_000.0) as i64
}

pub struct MediaCenterInner {
    /// Wakes the D-Bus thread to announce property changes.
    notify: UnboundedSender<()>,
}

impl MediaCenterInner {
    #[allow(clippy::unnecessary_wraps)]
    pub fn new(sender: Sender<MediaCommand>) -> Result<Self, MediaError> {
        STATE
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .sender = Some(sender);

        let (notify, requests) = unbounded_channel();
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("failed to create runtime for MPRIS: {e}");
                    return;
                }
            };

            rt.block_on(async move {
                match start_dbus_service().await {
                    Ok(connection) => serve(connection, requests).await,
                    Err(e) => log::warn!("failed to start MPRIS service: {e}"),
                }
            });
        });

        Ok(Self { notify })
    }

    #[allow(clippy::unnecessary_wraps)]
    pub fn update(&self, snapshot: &NowPlayingSnapshot) -> Result<(), MediaError> {
        {
            let mut state = STATE.write().unwrap_or_else(PoisonError::into_inner);
            sync_artwork(&mut state.artwork, snapshot.artwork.as_ref());
            state.snapshot = Some(snapshot.clone());
        }
        let _ = self.notify.send(());
        Ok(())
    }

    #[allow(clippy::unnecessary_wraps)]
    pub fn clear(&self) -> Result<(), MediaError> {
        {
            let mut state = STATE.write().unwrap_or_else(PoisonError::into_inner);
            sync_artwork(&mut state.artwork, None);
            state.snapshot = None;
        }
        let _ = self.notify.send(());
        Ok(())
    }

    #[allow(clippy::unnecessary_wraps)]
    pub fn set_enabled_commands(&self, commands: &[RemoteCommand]) -> Result<(), MediaError> {
        STATE
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .enabled = commands.iter().map(RemoteCommand::kind).collect();
        let _ = self.notify.send(());
        Ok(())
    }
}

async fn start_dbus_service() -> Result<Connection, zbus::Error> {
    zbus::connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, MediaPlayer2)?
        .serve_at(OBJECT_PATH, MprisPlayer)?
        .build()
        .await
}

/// Emit `PropertiesChanged` whenever the published state changes. Returns
/// when the owning [`MediaCenterInner`] is dropped.
async fn serve(connection: Connection, mut requests: UnboundedReceiver<()>) {
    while requests.recv().await.is_some() {
        if let Err(e) = emit_player_changed(&connection).await {
            log::warn!("failed to signal MPRIS change: {e}");
        }
    }
}

async fn emit_player_changed(connection: &Connection) -> zbus::Result<()> {
    let iface = connection
        .object_server()
        .interface::<_, MprisPlayer>(OBJECT_PATH)
        .await?;
    let emitter: &SignalEmitter<'_> = iface.signal_emitter();
    let player = iface.get().await;
    player.playback_status_changed(emitter).await?;
    player.metadata_changed(emitter).await?;
    player.can_play_changed(emitter).await?;
    player.can_pause_changed(emitter).await?;
    player.can_seek_changed(emitter).await?;
    player.can_go_next_changed(emitter).await?;
    player.can_go_previous_changed(emitter).await?;
    Ok(())
}
