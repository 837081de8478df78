pub mod app;
pub mod artwork;
pub mod audio;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod model;
pub mod ui;

pub use crate::audio::{MediaBackend, MediaEvent, NullBackend, PlayRequest, RodioBackend};
pub use crate::core::{ControllerSettings, PlaybackController};
pub use crate::error::{PlaybackError, PlaylistError};
pub use crate::events::PlayerEvent;
pub use crate::model::{PlaybackPhase, PlayerState, Playlist, RepeatMode, Track};
