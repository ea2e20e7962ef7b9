//! Playable items and their optional capabilities.
//!
//! An [`AudioItem`] always provides a source locator. Everything else is
//! optional: per-item policy overrides are exposed through narrow capability
//! traits that the player probes with the `as_*` methods, falling back to its
//! own defaults when an item answers `None`.

use crate::error::AudioPlayerError;
use crate::remote::RemoteCommand;
use crate::wrapper::{MediaSource, TimePitchAlgorithm};
use image::GenericImageView;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Where an item's locator points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// The locator is a URL of a remote stream.
    Stream,
    /// The locator is a local file path.
    File,
}

/// Decoded artwork ready for the now-playing display.
#[derive(Clone, PartialEq, Eq)]
pub struct Artwork {
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl fmt::Debug for Artwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artwork")
            .field("len", &self.bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Artwork {
    /// Decode encoded image bytes (PNG, JPEG, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a supported image.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let (width, height) = image::load_from_memory(&bytes)?.dimensions();
        Ok(Self {
            bytes: bytes.into(),
            width,
            height,
        })
    }

    /// The encoded image bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Where [`DefaultAudioItem`] reads its artwork from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkSource {
    /// An image file on disk.
    File(PathBuf),
    /// Encoded image bytes.
    Bytes(Arc<[u8]>),
}

/// Receives the result of an artwork fetch. `None` means no artwork.
pub type ArtworkHandler = Box<dyn FnOnce(Option<Artwork>) + Send + 'static>;

/// Options for acquiring an item's media.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Extra HTTP headers sent when fetching a stream.
    pub headers: BTreeMap<String, String>,
    /// User agent sent when fetching a stream.
    pub user_agent: Option<String>,
}

impl LoadOptions {
    /// Add an HTTP header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// An item that starts at a position other than zero.
pub trait InitialTiming {
    /// Start position in seconds.
    fn initial_time(&self) -> f64;
}

/// An item with its own media acquisition options.
pub trait AssetOptionsProviding {
    /// Options passed to the engine on load.
    fn asset_options(&self) -> LoadOptions;
}

/// An item that overrides the player's time-pitch algorithm.
pub trait TimePitching {
    /// The algorithm to use for this item.
    fn pitch_algorithm(&self) -> TimePitchAlgorithm;
}

/// An item that overrides the player's remote command set.
pub trait RemoteCommandProviding {
    /// Commands to enable while this item is loaded.
    fn remote_commands(&self) -> Vec<RemoteCommand>;
}

/// Content the player can load.
pub trait AudioItem: Send + Sync {
    /// The locator: a URL for streams, a path for files.
    fn source_url(&self) -> &str;

    /// How to interpret [`source_url`](Self::source_url).
    fn source_type(&self) -> SourceType;

    /// Artist for the now-playing display.
    fn artist(&self) -> Option<String> {
        None
    }

    /// Title for the now-playing display.
    fn title(&self) -> Option<String> {
        None
    }

    /// Album title for the now-playing display.
    fn album_title(&self) -> Option<String> {
        None
    }

    /// Fetch artwork asynchronously. `handler` may run on any thread.
    fn load_artwork(&self, handler: ArtworkHandler) {
        handler(None);
    }

    /// Probe for [`InitialTiming`].
    fn as_initial_timing(&self) -> Option<&dyn InitialTiming> {
        None
    }

    /// Probe for [`AssetOptionsProviding`].
    fn as_asset_options_providing(&self) -> Option<&dyn AssetOptionsProviding> {
        None
    }

    /// Probe for [`TimePitching`].
    fn as_time_pitching(&self) -> Option<&dyn TimePitching> {
        None
    }

    /// Probe for [`RemoteCommandProviding`].
    fn as_remote_command_providing(&self) -> Option<&dyn RemoteCommandProviding> {
        None
    }
}

/// Resolve an item's locator.
///
/// # Errors
///
/// Returns [`AudioPlayerError::InvalidSourceUrl`] when a stream item's locator
/// does not parse as a URL.
pub fn resolve_source(item: &dyn AudioItem) -> Result<MediaSource, AudioPlayerError> {
    let locator = item.source_url();
    match item.source_type() {
        SourceType::Stream => Url::parse(locator)
            .map(MediaSource::Remote)
            .map_err(|_| AudioPlayerError::InvalidSourceUrl(locator.to_string())),
        SourceType::File => Ok(MediaSource::File(PathBuf::from(locator))),
    }
}

/// A general purpose [`AudioItem`].
///
/// Capabilities are only advertised for the fields that were set, so an item
/// built without `remote_commands` leaves the player's default in effect.
///
/// ```
/// use playkit_audio::{DefaultAudioItem, SourceType};
///
/// let item = DefaultAudioItem::new("https://example.com/song.mp3", SourceType::Stream)
///     .title("Song")
///     .artist("Artist")
///     .initial_time(30.0);
/// # let _ = item;
/// ```
#[derive(Debug, Clone)]
pub struct DefaultAudioItem {
    source_url: String,
    source_type: SourceType,
    artist: Option<String>,
    title: Option<String>,
    album_title: Option<String>,
    artwork: Option<ArtworkSource>,
    initial_time: Option<f64>,
    asset_options: Option<LoadOptions>,
    pitch_algorithm: Option<TimePitchAlgorithm>,
    remote_commands: Option<Vec<RemoteCommand>>,
}

impl DefaultAudioItem {
    /// Create an item from a locator.
    #[must_use]
    pub fn new(source_url: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            source_url: source_url.into(),
            source_type,
            artist: None,
            title: None,
            album_title: None,
            artwork: None,
            initial_time: None,
            asset_options: None,
            pitch_algorithm: None,
            remote_commands: None,
        }
    }

    /// Set the artist.
    #[must_use]
    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the album title.
    #[must_use]
    pub fn album_title(mut self, album_title: impl Into<String>) -> Self {
        self.album_title = Some(album_title.into());
        self
    }

    /// Set the artwork source.
    #[must_use]
    pub fn artwork(mut self, artwork: ArtworkSource) -> Self {
        self.artwork = Some(artwork);
        self
    }

    /// Start playback at `seconds`.
    #[must_use]
    pub const fn initial_time(mut self, seconds: f64) -> Self {
        self.initial_time = Some(seconds);
        self
    }

    /// Set media acquisition options.
    #[must_use]
    pub fn asset_options(mut self, options: LoadOptions) -> Self {
        self.asset_options = Some(options);
        self
    }

    /// Override the player's time-pitch algorithm for this item.
    #[must_use]
    pub const fn pitch_algorithm(mut self, algorithm: TimePitchAlgorithm) -> Self {
        self.pitch_algorithm = Some(algorithm);
        self
    }

    /// Override the player's remote commands for this item.
    #[must_use]
    pub fn remote_commands(mut self, commands: Vec<RemoteCommand>) -> Self {
        self.remote_commands = Some(commands);
        self
    }
}

impl AudioItem for DefaultAudioItem {
    fn source_url(&self) -> &str {
        &self.source_url
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn artist(&self) -> Option<String> {
        self.artist.clone()
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn album_title(&self) -> Option<String> {
        self.album_title.clone()
    }

    fn load_artwork(&self, handler: ArtworkHandler) {
        let Some(source) = self.artwork.clone() else {
            handler(None);
            return;
        };
        std::thread::spawn(move || {
            let bytes = match source {
                ArtworkSource::File(path) => match std::fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        log::warn!("failed to read artwork {}: {e}", path.display());
                        handler(None);
                        return;
                    }
                },
                ArtworkSource::Bytes(bytes) => bytes.to_vec(),
            };
            match Artwork::decode(bytes) {
                Ok(artwork) => handler(Some(artwork)),
                Err(e) => {
                    log::warn!("failed to decode artwork: {e}");
                    handler(None);
                }
            }
        });
    }

    fn as_initial_timing(&self) -> Option<&dyn InitialTiming> {
        self.initial_time.map(|_| self as &dyn InitialTiming)
    }

    fn as_asset_options_providing(&self) -> Option<&dyn AssetOptionsProviding> {
        self.asset_options
            .as_ref()
            .map(|_| self as &dyn AssetOptionsProviding)
    }

    fn as_time_pitching(&self) -> Option<&dyn TimePitching> {
        self.pitch_algorithm.map(|_| self as &dyn TimePitching)
    }

    fn as_remote_command_providing(&self) -> Option<&dyn RemoteCommandProviding> {
        self.remote_commands
            .as_ref()
            .map(|_| self as &dyn RemoteCommandProviding)
    }
}

impl InitialTiming for DefaultAudioItem {
    fn initial_time(&self) -> f64 {
        self.initial_time.unwrap_or_default()
    }
}

impl AssetOptionsProviding for DefaultAudioItem {
    fn asset_options(&self) -> LoadOptions {
        self.asset_options.clone().unwrap_or_default()
    }
}

impl TimePitching for DefaultAudioItem {
    fn pitch_algorithm(&self) -> TimePitchAlgorithm {
        self.pitch_algorithm.unwrap_or_default()
    }
}

impl RemoteCommandProviding for DefaultAudioItem {
    fn remote_commands(&self) -> Vec<RemoteCommand> {
        self.remote_commands.clone().unwrap_or_default()
    }
}
