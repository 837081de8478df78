use crate::audio::{MediaBackend, MediaEvent, PlayRequest};
use crate::error::PlaybackError;
use crate::events::{EventBus, PlayerEvent};
use crate::model::{PlaybackPhase, PlayerState, Playlist, RepeatMode, Track};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::mpsc::Receiver;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_RESTART_THRESHOLD: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// `previous` restarts the current track once playback is past this point.
    pub restart_threshold: Duration,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub volume: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            restart_threshold: DEFAULT_RESTART_THRESHOLD,
            shuffle: false,
            repeat: RepeatMode::Off,
            volume: 1.0,
        }
    }
}

/// Owns the player state and the media session, and is the only place either
/// is mutated.
pub struct PlaybackController<B, R = SmallRng> {
    playlist: Playlist,
    state: PlayerState,
    phase: PlaybackPhase,
    backend: B,
    rng: R,
    events: EventBus,
    pending_play: Option<PlayRequest>,
    request_counter: u64,
    restart_threshold: Duration,
    volume: f32,
    muted: bool,
}

impl<B: MediaBackend> PlaybackController<B, SmallRng> {
    pub fn new(playlist: Playlist, backend: B, settings: ControllerSettings) -> Self {
        Self::with_rng(playlist, backend, SmallRng::from_entropy(), settings)
    }
}

impl<B: MediaBackend, R: Rng> PlaybackController<B, R> {
    pub fn with_rng(playlist: Playlist, mut backend: B, rng: R, settings: ControllerSettings) -> Self {
        let volume = settings.volume.clamp(0.0, 1.0);
        backend.set_volume(volume);
        Self {
            playlist,
            state: PlayerState {
                index: 0,
                playing: false,
                shuffle: settings.shuffle,
                repeat: settings.repeat,
            },
            phase: PlaybackPhase::Idle,
            backend,
            rng,
            events: EventBus::default(),
            pending_play: None,
            request_counter: 0,
            restart_threshold: settings.restart_threshold,
            volume,
            muted: false,
        }
    }

    pub fn subscribe(&mut self) -> Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Startup load of the first track, leaving the controller paused.
    pub fn start(&mut self) {
        if self.phase == PlaybackPhase::Idle {
            self.load(0, false);
        }
    }

    pub fn load(&mut self, index: i64, autoplay: bool) {
        let resolved = self.playlist.wrap_index(index);
        let was_playing = self.state.playing;

        self.pending_play = None;
        self.state.index = resolved;
        self.state.playing = false;
        self.phase = PlaybackPhase::Paused;

        let track = self.current_track().clone();
        debug!(index = resolved, title = %track.title, autoplay, "loading track");
        self.backend.set_source(&track.source);

        if was_playing {
            self.events.publish(PlayerEvent::PlaybackPaused);
        }
        self.events.publish(PlayerEvent::TrackChanged {
            index: resolved,
            track,
        });

        if autoplay {
            self.play();
        }
    }

    /// Asks the backend to start playback. The outcome arrives through
    /// [`Self::pump`]; a newer request supersedes this one.
    pub fn play(&mut self) {
        match self.phase {
            PlaybackPhase::Idle => {
                debug!("play ignored, no track loaded");
            }
            PlaybackPhase::Playing => {}
            PlaybackPhase::Paused => {
                self.request_counter += 1;
                let request = PlayRequest::new(self.request_counter);
                self.pending_play = Some(request);
                self.backend.request_play(request);
            }
        }
    }

    pub fn pause(&mut self) {
        if self.phase == PlaybackPhase::Idle {
            return;
        }
        self.pending_play = None;
        self.backend.pause();
        self.state.playing = false;
        self.phase = PlaybackPhase::Paused;
        self.events.publish(PlayerEvent::PlaybackPaused);
    }

    pub fn toggle_play_pause(&mut self) {
        if self.state.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Manual skip. Shuffle is consulted before repeat.
    pub fn next(&mut self) {
        let len = self.playlist.len();
        if self.state.shuffle {
            let pick = self.rng.gen_range(0..len);
            self.load(pick as i64, true);
            return;
        }

        let next_index = self.state.index + 1;
        if next_index < len {
            self.load(next_index as i64, true);
            return;
        }

        match self.state.repeat {
            RepeatMode::All => self.load(0, true),
            RepeatMode::One => self.load(self.state.index as i64, true),
            RepeatMode::Off => {
                info!("reached end of playlist");
                self.pause();
                self.seek(Duration::ZERO);
            }
        }
    }

    pub fn previous(&mut self) {
        if self.phase != PlaybackPhase::Idle && self.backend.position() > self.restart_threshold {
            self.seek(Duration::ZERO);
        } else {
            self.load(self.state.index as i64 - 1, true);
        }
    }

    /// Natural end of the current track. Repeat-one is consulted before
    /// shuffle, unlike [`Self::next`].
    pub fn on_track_ended(&mut self) {
        if self.state.repeat == RepeatMode::One {
            self.load(self.state.index as i64, true);
        } else {
            self.next();
        }
    }

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.state.shuffle = shuffle;
        self.publish_mode();
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.state.shuffle);
    }

    pub fn set_repeat_mode(&mut self, repeat: RepeatMode) {
        self.state.repeat = repeat;
        self.publish_mode();
    }

    pub fn cycle_repeat_mode(&mut self) {
        self.set_repeat_mode(self.state.repeat.next());
    }

    pub fn seek_to_fraction(&mut self, fraction: f64) {
        if !fraction.is_finite() {
            return;
        }
        let Some(duration) = self.backend.duration().filter(|duration| !duration.is_zero()) else {
            debug!("seek ignored, duration unknown");
            return;
        };
        self.seek(duration.mul_f64(fraction.clamp(0.0, 1.0)));
    }

    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.backend.set_volume(self.volume);
        self.publish_volume();
    }

    pub fn adjust_volume(&mut self, delta: f32) {
        self.set_volume(self.volume + delta);
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.backend.set_muted(self.muted);
        self.publish_volume();
    }

    /// Drains backend notifications and applies them in order.
    pub fn pump(&mut self) {
        for event in self.backend.poll_events() {
            self.handle_media_event(event);
        }
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::PlayResolved { request, outcome } => {
                self.resolve_play(request, outcome);
            }
            MediaEvent::TimeUpdate(position) => {
                self.events.publish(PlayerEvent::Progress {
                    position,
                    duration: self.backend.duration(),
                });
            }
            MediaEvent::MetadataLoaded(duration) => {
                self.events.publish(PlayerEvent::DurationKnown(duration));
            }
            MediaEvent::Ended => self.on_track_ended(),
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn current_track(&self) -> &Track {
        &self.playlist.tracks()[self.state.index]
    }

    pub fn index(&self) -> usize {
        self.state.index
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    pub fn shuffle(&self) -> bool {
        self.state.shuffle
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.state.repeat
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn restart_threshold(&self) -> Duration {
        self.restart_threshold
    }

    pub fn position(&self) -> Duration {
        self.backend.position()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.backend.duration()
    }

    pub fn progress(&self) -> Option<f64> {
        let total = self.duration()?.as_secs_f64();
        (total > 0.0).then(|| (self.position().as_secs_f64() / total).clamp(0.0, 1.0))
    }

    pub fn output_name(&self) -> String {
        self.backend.output_name()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn resolve_play(&mut self, request: PlayRequest, outcome: Result<(), String>) {
        if self.pending_play != Some(request) {
            debug!(request = request.id(), "ignoring superseded play request");
            return;
        }
        self.pending_play = None;

        match outcome {
            Ok(()) => {
                self.state.playing = true;
                self.phase = PlaybackPhase::Playing;
                self.events.publish(PlayerEvent::PlaybackStarted);
            }
            Err(reason) => {
                let err = PlaybackError::Rejected {
                    track: self.current_track().title.clone(),
                    reason,
                };
                warn!("{err}");
                self.events.publish(PlayerEvent::PlaybackFailed(err));
            }
        }
    }

    fn seek(&mut self, position: Duration) {
        if let Err(err) = self.backend.seek_to(position) {
            debug!("seek to {position:?} failed: {err:#}");
        }
    }

    fn publish_mode(&mut self) {
        self.events.publish(PlayerEvent::ModeChanged {
            shuffle: self.state.shuffle,
            repeat: self.state.repeat,
        });
    }

    fn publish_volume(&mut self) {
        self.events.publish(PlayerEvent::VolumeChanged {
            volume: self.volume,
            muted: self.muted,
        });
    }
}
