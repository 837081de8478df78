//! Error types for the player.

use thiserror::Error;

/// Failures reported by the playback controller.
///
/// None of these propagate out of controller commands; they are logged and
/// published as [`crate::events::PlayerEvent::PlaybackFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The media backend declined to start playback (blocked output, decode
    /// failure, missing file).
    #[error("playback of {track:?} was rejected: {reason}")]
    Rejected { track: String, reason: String },
}

/// Validation failures for the static playlist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaylistError {
    #[error("playlist must contain at least one track")]
    Empty,

    #[error("track {index} has an empty title")]
    MissingTitle { index: usize },
}
