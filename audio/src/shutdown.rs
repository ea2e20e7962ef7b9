//! Shutdown signalling for the engine's background threads.
//!
//! Closing the channel is the signal: a [`ShutdownReceiver`] sees it as soon
//! as its [`ShutdownHandle`] is dropped, without any shared flag.

use async_channel::{Receiver, Sender};
use std::time::{Duration, Instant};

/// Longest single sleep while waiting for shutdown.
const SLICE: Duration = Duration::from_millis(20);

/// Signals shutdown when dropped.
#[derive(Debug)]
pub(crate) struct ShutdownHandle {
    sender: Sender<()>,
}

impl ShutdownHandle {
    /// Create a handle and its first receiver.
    pub fn new() -> (Self, ShutdownReceiver) {
        let (sender, receiver) = async_channel::bounded(1);
        (Self { sender }, ShutdownReceiver { receiver })
    }
}

impl Drop for ShutdownHandle {
    fn drop(&mut self) {
        self.sender.close();
    }
}

/// Observes a [`ShutdownHandle`]. Clone it for every background thread.
#[derive(Debug, Clone)]
pub(crate) struct ShutdownReceiver {
    receiver: Receiver<()>,
}

impl ShutdownReceiver {
    /// Whether shutdown was signalled.
    pub fn is_shutdown(&self) -> bool {
        self.receiver.is_closed()
    }

    /// Block until shutdown is signalled.
    pub fn wait_blocking(&self) {
        let _ = self.receiver.recv_blocking();
    }

    /// Sleep for `duration`, waking early on shutdown.
    ///
    /// Returns `false` if shutdown was signalled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_shutdown() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_signals_every_receiver() {
        let (handle, receiver) = ShutdownHandle::new();
        let other = receiver.clone();
        assert!(!receiver.is_shutdown());

        drop(handle);

        assert!(receiver.is_shutdown());
        assert!(other.is_shutdown());
        other.wait_blocking();
    }

    #[test]
    fn sleep_wakes_early_on_shutdown() {
        let (handle, receiver) = ShutdownHandle::new();
        let waiter = std::thread::spawn(move || {
            let started = Instant::now();
            let completed = receiver.sleep(Duration::from_secs(30));
            (completed, started.elapsed())
        });

        std::thread::sleep(Duration::from_millis(50));
        drop(handle);
        let (completed, elapsed) = waiter.join().unwrap();

        assert!(!completed);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn sleep_completes_without_shutdown() {
        let (_handle, receiver) = ShutdownHandle::new();
        assert!(receiver.sleep(Duration::from_millis(30)));
    }
}
