use crate::artwork;
use crate::error::PlaylistError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// No track has been loaded yet.
    Idle,
    Paused,
    Playing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    /// Locator handed to the media backend, usually a file path.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            source: source.into(),
            art: None,
            color: None,
        }
    }

    /// Explicit artwork if the track carries one, otherwise a placeholder
    /// generated from the title.
    pub fn artwork(&self) -> String {
        match self.art.as_deref().map(str::trim) {
            Some(art) if !art.is_empty() => art.to_string(),
            _ => artwork::placeholder_art(&self.title),
        }
    }
}

/// Non-empty, fixed ordered list of tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Result<Self, PlaylistError> {
        if tracks.is_empty() {
            return Err(PlaylistError::Empty);
        }
        if let Some(index) = tracks.iter().position(|track| track.title.trim().is_empty()) {
            return Err(PlaylistError::MissingTitle { index });
        }
        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Resolves any integer, negative or past the end, to a valid index.
    pub fn wrap_index(&self, index: i64) -> usize {
        let len = self.tracks.len() as i64;
        index.rem_euclid(len) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerState {
    pub index: usize,
    pub playing: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> Playlist {
        Playlist::new(vec![
            Track::new("a", "x", "a.mp3"),
            Track::new("b", "x", "b.mp3"),
            Track::new("c", "x", "c.mp3"),
        ])
        .expect("playlist")
    }

    #[test]
    fn empty_playlist_is_rejected() {
        assert_eq!(Playlist::new(Vec::new()), Err(PlaylistError::Empty));
    }

    #[test]
    fn blank_title_is_rejected_with_its_index() {
        let result = Playlist::new(vec![Track::new("a", "", "a.mp3"), Track::new("  ", "", "b.mp3")]);
        assert_eq!(result, Err(PlaylistError::MissingTitle { index: 1 }));
    }

    #[test]
    fn wrap_index_handles_both_directions() {
        let playlist = three();
        assert_eq!(playlist.wrap_index(-1), 2);
        assert_eq!(playlist.wrap_index(-4), 2);
        assert_eq!(playlist.wrap_index(3), 0);
        assert_eq!(playlist.wrap_index(7), 1);
        assert_eq!(playlist.wrap_index(i64::MIN), playlist.wrap_index(i64::MIN % 3));
    }

    #[test]
    fn repeat_mode_cycles_off_all_one() {
        assert_eq!(RepeatMode::Off.next(), RepeatMode::All);
        assert_eq!(RepeatMode::All.next(), RepeatMode::One);
        assert_eq!(RepeatMode::One.next(), RepeatMode::Off);
    }

    #[test]
    fn repeat_mode_uses_lowercase_names() {
        let json = serde_json::to_string(&RepeatMode::All).expect("serialize");
        assert_eq!(json, "\"all\"");
        let parsed: RepeatMode = serde_json::from_str("\"one\"").expect("parse");
        assert_eq!(parsed, RepeatMode::One);
    }

    #[test]
    fn explicit_art_wins_over_placeholder() {
        let mut track = Track::new("Kammani", "Artist B", "kammani.mp3");
        assert!(track.artwork().starts_with("data:image/svg+xml;base64,"));
        track.art = Some(String::from("covers/kammani.png"));
        assert_eq!(track.artwork(), "covers/kammani.png");
    }
}
