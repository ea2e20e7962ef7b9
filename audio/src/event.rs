//! Typed multicast events emitted by [`AudioPlayer`](crate::AudioPlayer).
//!
//! Each event kind owns an independent subscriber list. Emission is
//! synchronous: handlers run on the thread that reported the underlying
//! change, one after another, in subscription order.

use crate::error::PlaybackError;
use crate::wrapper::{AudioPlayerState, TimedMetadata};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Identifies a subscription so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// A single event kind with its own list of subscribers.
pub struct Event<T> {
    handlers: RwLock<Vec<(SubscriptionId, Handler<T>)>>,
    next_id: AtomicU64,
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<T> Event<T> {
    /// Register a handler. Handlers are invoked in the order they subscribed.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Number of current subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn emit(&self, data: &T) {
        // Snapshot so handlers may subscribe or unsubscribe while running.
        let handlers: Vec<Handler<T>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(data);
        }
    }
}

/// Why playback of the current item ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackEndedReason {
    /// The engine reached the end of the media.
    PlayedUntilEnd,
    /// [`AudioPlayer::stop`](crate::AudioPlayer::stop) was called.
    PlayerStopped,
    /// A queue skipped to the next item.
    SkippedToNext,
    /// A queue skipped to the previous item.
    SkippedToPrevious,
    /// A queue jumped to another index.
    JumpedToIndex,
    /// The queue was cleared.
    Cleared,
    /// Playback failed.
    Failed,
}

/// Payload of the `seek` event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekEvent {
    /// Target position in seconds.
    pub seconds: f64,
    /// Whether the seek completed (`false` when it was interrupted or rejected).
    pub did_finish: bool,
}

/// All events emitted by an [`AudioPlayer`](crate::AudioPlayer).
#[derive(Debug, Default)]
pub struct AudioPlayerEvents {
    /// The engine changed state.
    pub state_change: Event<AudioPlayerState>,
    /// Playback advanced; payload is the current time in seconds.
    pub seconds_elapse: Event<f64>,
    /// A seek finished.
    pub seek: Event<SeekEvent>,
    /// The engine failed. The error is optional because not every engine
    /// failure carries one.
    pub fail: Event<Option<PlaybackError>>,
    /// The engine learned the duration of the current item, in seconds.
    pub update_duration: Event<f64>,
    /// The engine received timed metadata from the media.
    pub received_metadata: Event<Vec<TimedMetadata>>,
    /// Playback of the current item ended.
    pub playback_end: Event<PlaybackEndedReason>,
    /// The engine recreated its output internally.
    pub did_recreate_engine: Event<()>,
}
