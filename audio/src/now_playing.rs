//! The "Now Playing" information shown by the operating system.

use crate::item::Artwork;
use crate::sys::MediaCenterIntegration;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Keys understood by the now-playing display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NowPlayingKey {
    /// Track title.
    Title,
    /// Track artist.
    Artist,
    /// Album title.
    AlbumTitle,
    /// Artwork image.
    Artwork,
    /// Duration in seconds.
    PlaybackDuration,
    /// Elapsed time in seconds.
    ElapsedPlaybackTime,
    /// Playback rate; `0.0` while paused.
    PlaybackRate,
}

/// A value in the now-playing bag.
#[derive(Debug, Clone, PartialEq)]
pub enum NowPlayingValue {
    /// Text values: title, artist, album.
    Text(String),
    /// Numeric values: duration, elapsed time, rate.
    Number(f64),
    /// Artwork.
    Artwork(Artwork),
}

/// One key with an optional value; `None` clears the key.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingEntry {
    /// The key to set.
    pub key: NowPlayingKey,
    /// The new value, `None` to clear.
    pub value: Option<NowPlayingValue>,
}

impl NowPlayingEntry {
    fn text(key: NowPlayingKey, value: Option<String>) -> Self {
        Self {
            key,
            value: value.map(NowPlayingValue::Text),
        }
    }

    fn number(key: NowPlayingKey, value: Option<f64>) -> Self {
        Self {
            key,
            value: value.map(NowPlayingValue::Number),
        }
    }

    /// Title entry.
    #[must_use]
    pub fn title(title: Option<String>) -> Self {
        Self::text(NowPlayingKey::Title, title)
    }

    /// Artist entry.
    #[must_use]
    pub fn artist(artist: Option<String>) -> Self {
        Self::text(NowPlayingKey::Artist, artist)
    }

    /// Album title entry.
    #[must_use]
    pub fn album_title(album: Option<String>) -> Self {
        Self::text(NowPlayingKey::AlbumTitle, album)
    }

    /// Artwork entry.
    #[must_use]
    pub fn artwork(artwork: Option<Artwork>) -> Self {
        Self {
            key: NowPlayingKey::Artwork,
            value: artwork.map(NowPlayingValue::Artwork),
        }
    }

    /// Duration entry, in seconds.
    #[must_use]
    pub fn duration(seconds: Option<f64>) -> Self {
        Self::number(NowPlayingKey::PlaybackDuration, seconds)
    }

    /// Elapsed time entry, in seconds.
    #[must_use]
    pub fn elapsed_time(seconds: Option<f64>) -> Self {
        Self::number(NowPlayingKey::ElapsedPlaybackTime, seconds)
    }

    /// Playback rate entry.
    #[must_use]
    pub fn rate(rate: Option<f64>) -> Self {
        Self::number(NowPlayingKey::PlaybackRate, rate)
    }
}

/// The now-playing bag.
///
/// A key is either absent, present with a value, or present but empty
/// (cleared). Clearing keeps the key so the display drops a stale value
/// instead of keeping it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NowPlayingInfo {
    values: BTreeMap<NowPlayingKey, Option<NowPlayingValue>>,
}

impl NowPlayingInfo {
    /// Apply an entry.
    pub fn apply(&mut self, entry: NowPlayingEntry) {
        self.values.insert(entry.key, entry.value);
    }

    /// The value for `key`, if present and not cleared.
    #[must_use]
    pub fn get(&self, key: NowPlayingKey) -> Option<&NowPlayingValue> {
        self.values.get(&key).and_then(Option::as_ref)
    }

    /// Whether `key` is present, with or without a value.
    #[must_use]
    pub fn contains_key(&self, key: NowPlayingKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Whether `key` is present but empty.
    #[must_use]
    pub fn is_cleared(&self, key: NowPlayingKey) -> bool {
        matches!(self.values.get(&key), Some(None))
    }

    /// Text value for `key`.
    #[must_use]
    pub fn text(&self, key: NowPlayingKey) -> Option<&str> {
        match self.get(key) {
            Some(NowPlayingValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Numeric value for `key`.
    #[must_use]
    pub fn number(&self, key: NowPlayingKey) -> Option<f64> {
        match self.get(key) {
            Some(NowPlayingValue::Number(number)) => Some(*number),
            _ => None,
        }
    }

    /// The artwork, if any.
    #[must_use]
    pub fn artwork(&self) -> Option<&Artwork> {
        match self.get(NowPlayingKey::Artwork) {
            Some(NowPlayingValue::Artwork(artwork)) => Some(artwork),
            _ => None,
        }
    }

    /// Whether no key is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Owner of the now-playing bag.
pub trait NowPlayingInfoController: Send + Sync {
    /// Snapshot of the bag.
    fn info(&self) -> NowPlayingInfo;
    /// Set one entry and publish.
    fn set(&self, entry: NowPlayingEntry);
    /// Set several entries and publish once.
    fn set_many(&self, entries: Vec<NowPlayingEntry>);
    /// Set several entries without publishing.
    fn set_many_without_update(&self, entries: Vec<NowPlayingEntry>);
    /// Remove every key and clear the display.
    fn clear(&self);
}

/// Destination for published bags.
pub(crate) trait NowPlayingPublisher: Send + Sync {
    fn publish(&self, info: &NowPlayingInfo);
    fn clear(&self);
}

impl NowPlayingPublisher for MediaCenterIntegration {
    fn publish(&self, info: &NowPlayingInfo) {
        Self::publish(self, info);
    }

    fn clear(&self) {
        Self::clear(self);
    }
}

/// Default [`NowPlayingInfoController`] publishing to the platform media
/// center.
pub struct NowPlayingInfoCenter {
    info: Mutex<NowPlayingInfo>,
    publisher: Option<Arc<dyn NowPlayingPublisher>>,
}

impl std::fmt::Debug for NowPlayingInfoCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NowPlayingInfoCenter")
            .field("info", &*self.lock())
            .field("publishing", &self.publisher.is_some())
            .finish()
    }
}

impl NowPlayingInfoCenter {
    /// Create a controller that publishes to `media_center`.
    #[must_use]
    pub fn new(media_center: Arc<MediaCenterIntegration>) -> Self {
        Self::with_publisher(media_center)
    }

    pub(crate) fn with_publisher(publisher: Arc<dyn NowPlayingPublisher>) -> Self {
        Self {
            info: Mutex::new(NowPlayingInfo::default()),
            publisher: Some(publisher),
        }
    }

    /// Create a controller that only keeps the bag.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            info: Mutex::new(NowPlayingInfo::default()),
            publisher: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, NowPlayingInfo> {
        self.info.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Publishing happens under the lock, so the display always ends on the
    // last bag applied.
    fn update(&self, entries: Vec<NowPlayingEntry>, publish: bool) {
        let mut info = self.lock();
        for entry in entries {
            info.apply(entry);
        }
        if publish {
            if let Some(publisher) = &self.publisher {
                publisher.publish(&info);
            }
        }
    }
}

impl NowPlayingInfoController for NowPlayingInfoCenter {
    fn info(&self) -> NowPlayingInfo {
        self.lock().clone()
    }

    fn set(&self, entry: NowPlayingEntry) {
        self.update(vec![entry], true);
    }

    fn set_many(&self, entries: Vec<NowPlayingEntry>) {
        self.update(entries, true);
    }

    fn set_many_without_update(&self, entries: Vec<NowPlayingEntry>) {
        self.update(entries, false);
    }

    fn clear(&self) {
        let mut info = self.lock();
        *info = NowPlayingInfo::default();
        if let Some(publisher) = &self.publisher {
            publisher.clear();
        }
    }
}
