use crate::core::ControllerSettings;
use crate::model::{Playlist, RepeatMode, Track};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "tunedeck";
const PLAYLIST_FILE: &str = "playlist.json";
const LOG_FILE: &str = "tunedeck.log";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub repeat: RepeatMode,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_restart_threshold_ms")]
    pub restart_threshold_ms: u64,
}

fn default_volume() -> f32 {
    1.0
}

fn default_restart_threshold_ms() -> u64 {
    3_000
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tracks: vec![
                Track::new("Inthandham", "Artist A", "Inthandham.mp3"),
                Track::new("Kammani", "Artist B", "kammani.mp3"),
                Track::new("Manase Theeyaga", "Artist C", "Manase Theeyaga.mp3"),
            ],
            shuffle: false,
            repeat: RepeatMode::Off,
            volume: default_volume(),
            restart_threshold_ms: default_restart_threshold_ms(),
        }
    }
}

impl PlayerConfig {
    pub fn settings(&self) -> ControllerSettings {
        ControllerSettings {
            restart_threshold: Duration::from_millis(self.restart_threshold_ms),
            shuffle: self.shuffle,
            repeat: self.repeat,
            volume: self.volume,
        }
    }

    pub fn playlist(&self) -> Result<Playlist> {
        Playlist::new(self.tracks.clone()).context("invalid playlist")
    }

    /// Makes relative track sources relative to `base` instead of the working
    /// directory.
    pub fn resolve_sources(&mut self, base: &Path) {
        for track in &mut self.tracks {
            let source = Path::new(&track.source);
            if source.is_relative() {
                track.source = base.join(source).to_string_lossy().into_owned();
            }
        }
    }
}

pub fn config_root() -> Result<PathBuf> {
    config_root_from(
        env::var_os("TUNEDECK_CONFIG_DIR"),
        env::var_os("HOME").or_else(|| env::var_os("USERPROFILE")),
    )
}

fn config_root_from(override_dir: Option<OsString>, home: Option<OsString>) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    let home = home.context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn playlist_path() -> Result<PathBuf> {
    Ok(config_root()?.join(PLAYLIST_FILE))
}

pub fn log_path() -> Result<PathBuf> {
    Ok(config_root()?.join(LOG_FILE))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

/// Reads the playlist at `path`, falling back to the built-in playlist when
/// the file does not exist. Relative sources resolve against the file's
/// directory.
pub fn load_config_from(path: &Path) -> Result<PlayerConfig> {
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut config = if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read playlist file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse playlist file {}", path.display()))?
    } else {
        PlayerConfig::default()
    };
    config.resolve_sources(&base);
    Ok(config)
}

pub fn load_config() -> Result<PlayerConfig> {
    load_config_from(&playlist_path()?)
}

/// Writes shuffle, repeat and volume back into the playlist file, leaving
/// its track list untouched.
pub fn save_preferences_to(path: &Path, shuffle: bool, repeat: RepeatMode, volume: f32) -> Result<()> {
    let mut stored = if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read playlist file {}", path.display()))?;
        serde_json::from_str::<PlayerConfig>(&raw)
            .with_context(|| format!("failed to parse playlist file {}", path.display()))?
    } else {
        PlayerConfig::default()
    };
    stored.shuffle = shuffle;
    stored.repeat = repeat;
    stored.volume = volume.clamp(0.0, 1.0);

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&stored)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
