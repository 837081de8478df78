use crate::audio::{MediaBackend, NullBackend, RodioBackend};
use crate::config;
use crate::core::PlaybackController;
use crate::events::PlayerEvent;
use crate::ui::{self, ViewState};
use anyhow::{Context, Result};
use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use rand::Rng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const VOLUME_STEP: f32 = 0.05;

#[derive(Debug, Default, Clone)]
pub struct AppStartupOptions {
    pub playlist_path: Option<PathBuf>,
    pub null_audio: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let playlist_path = match options.playlist_path {
        Some(path) => path,
        None => config::playlist_path()?,
    };
    let player_config = config::load_config_from(&playlist_path)?;
    let playlist = player_config.playlist()?;
    info!(
        path = %playlist_path.display(),
        tracks = playlist.len(),
        "loaded playlist"
    );

    let backend: Box<dyn MediaBackend> = if options.null_audio {
        Box::new(NullBackend::new())
    } else {
        match RodioBackend::new() {
            Ok(backend) => Box::new(backend),
            Err(err) => {
                warn!("falling back to null audio output: {err:#}");
                Box::new(NullBackend::new())
            }
        }
    };

    let mut controller = PlaybackController::new(playlist, backend, player_config.settings());
    let events = controller.subscribe();
    controller.start();

    let mut view = ViewState {
        status: String::from("Ready"),
        ..ViewState::default()
    };

    enable_raw_mode()?;
    let _restore = RestoreOnDrop {
        restore: restore_terminal,
    };
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut dirty = true;
    let mut last_draw = Instant::now();

    let result: Result<()> = loop {
        controller.pump();
        dirty |= apply_player_events(&events, &mut view);

        if dirty || last_draw.elapsed() > Duration::from_millis(250) {
            if let Err(err) = terminal.draw(|frame| ui::draw(frame, &controller, &view)) {
                break Err(err.into());
            }
            dirty = false;
            last_draw = Instant::now();
        }

        match event::poll(Duration::from_millis(33)) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(err) => break Err(err.into()),
        }

        let key = match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
            Ok(_) => continue,
            Err(err) => break Err(err.into()),
        };

        dirty = true;
        if handle_key(&mut controller, &mut view, key, &playlist_path) == Flow::Quit {
            break Ok(());
        }
    };

    result
}

/// Runs `restore` when dropped, covering early returns as well as the normal
/// exit.
struct RestoreOnDrop<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> Drop for RestoreOnDrop<F> {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    if let Err(err) = disable_raw_mode() {
        warn!("failed to disable raw mode: {err}");
    }
    if let Err(err) = execute!(stdout(), LeaveAlternateScreen, Show) {
        warn!("failed to leave alternate screen: {err}");
    }
}

/// Folds controller notifications into the status line. Returns whether
/// anything changed.
fn apply_player_events(events: &Receiver<PlayerEvent>, view: &mut ViewState) -> bool {
    let mut changed = false;
    for event in events.try_iter() {
        changed = true;
        match event {
            PlayerEvent::TrackChanged { index, track } => {
                view.selected = index;
                view.status = format!("Loaded {}", track.title);
            }
            PlayerEvent::PlaybackStarted => view.status = String::from("Playing"),
            PlayerEvent::PlaybackPaused => view.status = String::from("Paused"),
            PlayerEvent::ModeChanged { shuffle, repeat } => {
                view.status = ui::mode_label(shuffle, repeat);
            }
            PlayerEvent::PlaybackFailed(err) => {
                view.status = format!("{err}. Press Space to retry");
            }
            PlayerEvent::VolumeChanged { volume, muted } => {
                view.status = if muted {
                    String::from("Muted")
                } else {
                    format!("Volume: {}%", (volume * 100.0).round() as u16)
                };
            }
            PlayerEvent::Progress { .. } | PlayerEvent::DurationKnown(_) => {}
        }
    }
    changed
}

fn handle_key<B: MediaBackend, R: Rng>(
    controller: &mut PlaybackController<B, R>,
    view: &mut ViewState,
    key: KeyEvent,
    playlist_path: &Path,
) -> Flow {
    let last = controller.playlist().len() - 1;
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Flow::Quit,
        KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
        KeyCode::Char(' ') => controller.toggle_play_pause(),
        KeyCode::Right | KeyCode::Char('n') => controller.next(),
        KeyCode::Left | KeyCode::Char('p') => controller.previous(),
        KeyCode::Char('m') => controller.toggle_mute(),
        KeyCode::Char('s') => controller.toggle_shuffle(),
        KeyCode::Char('r') => controller.cycle_repeat_mode(),
        KeyCode::Char('f') => {
            view.favorite = !view.favorite;
            view.status = String::from(if view.favorite {
                "Added to favorites"
            } else {
                "Removed from favorites"
            });
        }
        KeyCode::Char('+') | KeyCode::Char('=') => controller.adjust_volume(VOLUME_STEP),
        KeyCode::Char('-') => controller.adjust_volume(-VOLUME_STEP),
        KeyCode::Down => view.selected = (view.selected + 1).min(last),
        KeyCode::Up => view.selected = view.selected.saturating_sub(1),
        KeyCode::Enter => controller.load(view.selected.min(last) as i64, true),
        KeyCode::Char(digit @ '0'..='9') => {
            let tenths = digit.to_digit(10).unwrap_or(0);
            controller.seek_to_fraction(f64::from(tenths) / 10.0);
        }
        KeyCode::Char('w') => {
            view.status = match save_preferences(controller, playlist_path) {
                Ok(()) => String::from("Preferences saved"),
                Err(err) => format!("save error: {err:#}"),
            };
        }
        _ => {}
    }
    Flow::Continue
}

fn save_preferences<B: MediaBackend, R: Rng>(
    controller: &PlaybackController<B, R>,
    playlist_path: &Path,
) -> Result<()> {
    config::save_preferences_to(
        playlist_path,
        controller.shuffle(),
        controller.repeat_mode(),
        controller.volume(),
    )
    .context("failed to save preferences")
}
