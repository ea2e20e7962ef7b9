//! Error types for the player, the engine and the media center.

use thiserror::Error;

/// Errors returned synchronously by [`AudioPlayer`](crate::AudioPlayer).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioPlayerError {
    /// A stream item's source locator is not a well-formed URL.
    #[error("invalid source url: {0}")]
    InvalidSourceUrl(String),

    /// The default audio output could not be opened.
    #[error("failed to init audio output: {0}")]
    OutputInitFailed(String),
}

/// Errors reported asynchronously by the playback engine.
///
/// These are never returned from a method call. They reach the application
/// through the `fail` event only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The media could not be read.
    #[error("failed to load audio: {0}")]
    LoadFailed(String),

    /// Fetching a remote stream failed.
    #[error("network error: {0}")]
    Network(String),

    /// The media format could not be decoded.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The audio output could not be opened or recreated.
    #[error("audio output error: {0}")]
    Output(String),
}

/// Errors raised by the platform media center integration.
///
/// Media center failures never interrupt playback; they are logged.
#[derive(Error, Debug, Clone)]
pub enum MediaError {
    /// Failed to initialize the media session.
    #[error("failed to initialize media session: {0}")]
    InitializationFailed(String),

    /// Failed to update the media state.
    #[error("failed to update media state: {0}")]
    UpdateFailed(String),
}
