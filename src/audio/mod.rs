use anyhow::{Context, Result};
use rodio::Source;
use rodio::{
    Decoder, DeviceSinkBuilder as OutputStreamBuilder, MixerDeviceSink as OutputStream, Player as Sink,
};
#[cfg(unix)]
use std::ffi::CString;
use std::fs::File;
use std::mem;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Identifies one asynchronous play request. Only the most recent request
/// issued by the controller is honored when it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayRequest(u64);

impl PlayRequest {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    PlayResolved {
        request: PlayRequest,
        outcome: Result<(), String>,
    },
    TimeUpdate(Duration),
    MetadataLoaded(Duration),
    Ended,
}

/// Host media subsystem driven by the playback controller.
///
/// `request_play` never completes inline: the backend reports the outcome
/// through a [`MediaEvent::PlayResolved`] returned from `poll_events`.
pub trait MediaBackend {
    fn set_source(&mut self, locator: &str);
    fn request_play(&mut self, request: PlayRequest);
    fn pause(&mut self);
    fn seek_to(&mut self, position: Duration) -> Result<()>;
    fn position(&self) -> Duration;
    fn duration(&self) -> Option<Duration>;
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    fn output_name(&self) -> String;
    fn poll_events(&mut self) -> Vec<MediaEvent>;
}

impl<B: MediaBackend + ?Sized> MediaBackend for Box<B> {
    fn set_source(&mut self, locator: &str) {
        (**self).set_source(locator);
    }

    fn request_play(&mut self, request: PlayRequest) {
        (**self).request_play(request);
    }

    fn pause(&mut self) {
        (**self).pause();
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        (**self).seek_to(position)
    }

    fn position(&self) -> Duration {
        (**self).position()
    }

    fn duration(&self) -> Option<Duration> {
        (**self).duration()
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume);
    }

    fn set_muted(&mut self, muted: bool) {
        (**self).set_muted(muted);
    }

    fn output_name(&self) -> String {
        (**self).output_name()
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        (**self).poll_events()
    }
}

pub struct RodioBackend {
    stream: OutputStream,
    sink: Sink,
    source: Option<PathBuf>,
    load_error: Option<String>,
    track_duration: Option<Duration>,
    volume: f32,
    muted: bool,
    ended_reported: bool,
    events: Vec<MediaEvent>,
}

impl RodioBackend {
    pub fn new() -> Result<Self> {
        let stream = Self::open_output_stream()?;
        let sink = Sink::connect_new(stream.mixer());
        sink.pause();

        Ok(Self {
            stream,
            sink,
            source: None,
            load_error: None,
            track_duration: None,
            volume: 1.0,
            muted: false,
            ended_reported: false,
            events: Vec::new(),
        })
    }

    fn open_output_stream() -> Result<OutputStream> {
        let mut stream = with_silenced_stderr(|| {
            OutputStreamBuilder::from_default_device()
                .context("failed to open default system output stream")
                .and_then(|builder| {
                    builder
                        .with_error_callback(|_| {})
                        .open_sink_or_fallback()
                        .context("failed to start default output stream")
                })
        })?;
        stream.log_on_drop(false);
        Ok(stream)
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    fn fresh_sink(&mut self) {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());
        self.sink.pause();
        self.sink.set_volume(self.effective_volume());
    }

    /// Decodes the current source into a fresh, paused sink.
    fn decode_current(&mut self) -> Result<()> {
        self.fresh_sink();
        self.ended_reported = false;

        let path = self.source.as_deref().context("no source selected")?;
        let file =
            File::open(path).with_context(|| format!("failed to open track {}", path.display()))?;
        let decoded = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        let duration = decoded
            .total_duration()
            .filter(|duration| !duration.is_zero());
        self.sink.append(decoded);

        if let Some(duration) = duration
            && self.track_duration != Some(duration)
        {
            self.events.push(MediaEvent::MetadataLoaded(duration));
        }
        self.track_duration = duration;
        Ok(())
    }
}

impl MediaBackend for RodioBackend {
    fn set_source(&mut self, locator: &str) {
        self.source = Some(PathBuf::from(locator));
        self.track_duration = None;
        self.load_error = match self.decode_current() {
            Ok(()) => None,
            Err(err) => {
                warn!(source = locator, "failed to load track: {err:#}");
                Some(format!("{err:#}"))
            }
        };
    }

    fn request_play(&mut self, request: PlayRequest) {
        let outcome = if let Some(reason) = &self.load_error {
            Err(reason.clone())
        } else if self.sink.empty() {
            // Drained after a natural end; start over from the top.
            self.decode_current().map_err(|err| format!("{err:#}"))
        } else {
            Ok(())
        };

        if outcome.is_ok() {
            self.sink.play();
        }
        self.events
            .push(MediaEvent::PlayResolved { request, outcome });
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.source.is_none() || self.load_error.is_some() {
            return Err(anyhow::anyhow!("no playable track"));
        }

        if self.sink.empty() {
            let was_playing = !self.sink.is_paused();
            self.decode_current()?;
            if was_playing {
                self.sink.play();
            }
        }
        self.ended_reported = false;
        self.sink
            .try_seek(position)
            .map_err(|err| anyhow::anyhow!("failed to seek current track: {err:?}"))
    }

    fn position(&self) -> Duration {
        if self.source.is_none() {
            return Duration::ZERO;
        }
        self.sink.get_pos()
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.effective_volume());
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sink.set_volume(self.effective_volume());
    }

    fn output_name(&self) -> String {
        String::from("System default output")
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        let running = self.source.is_some() && self.load_error.is_none() && !self.sink.is_paused();
        if running {
            if self.sink.empty() {
                if !self.ended_reported {
                    self.ended_reported = true;
                    self.events.push(MediaEvent::Ended);
                }
            } else {
                self.events.push(MediaEvent::TimeUpdate(self.sink.get_pos()));
            }
        }
        mem::take(&mut self.events)
    }
}

#[cfg(unix)]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved < 0 {
        return operation();
    }

    let devnull = CString::new("/dev/null")
        .ok()
        .map(|path| unsafe { libc::open(path.as_ptr(), libc::O_WRONLY) })
        .unwrap_or(-1);

    if devnull >= 0 {
        unsafe {
            libc::dup2(devnull, libc::STDERR_FILENO);
            libc::close(devnull);
        }
    }

    let result = operation();

    unsafe {
        libc::dup2(saved, libc::STDERR_FILENO);
        libc::close(saved);
    }

    result
}

#[cfg(not(unix))]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    operation()
}

/// Logical-clock backend used when no output device can be opened.
///
/// Durations are read from the file when it decodes; otherwise the track
/// never ends on its own.
pub struct NullBackend {
    paused: bool,
    current: Option<String>,
    started_at: Option<Instant>,
    position_offset: Duration,
    track_duration: Option<Duration>,
    volume: f32,
    muted: bool,
    autoplay_blocked: bool,
    ended_reported: bool,
    events: Vec<MediaEvent>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self {
            paused: true,
            current: None,
            started_at: None,
            position_offset: Duration::ZERO,
            track_duration: None,
            volume: 1.0,
            muted: false,
            autoplay_blocked: false,
            ended_reported: false,
            events: Vec::new(),
        }
    }

    /// While blocked, every play request is rejected the way a host with an
    /// autoplay policy would.
    pub fn set_autoplay_blocked(&mut self, blocked: bool) {
        self.autoplay_blocked = blocked;
    }

    pub fn current_source(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn estimate_duration(path: &Path) -> Option<Duration> {
        let file = File::open(path).ok()?;
        let source = Decoder::try_from(file).ok()?;
        source
            .total_duration()
            .filter(|duration| !duration.is_zero())
    }

    fn current_position(&self) -> Duration {
        let mut position = self.position_offset;
        if !self.paused
            && self.current.is_some()
            && let Some(started_at) = self.started_at
        {
            position = position.saturating_add(started_at.elapsed());
        }
        if let Some(duration) = self.track_duration {
            return position.min(duration);
        }
        position
    }

    fn is_finished(&self) -> bool {
        let Some(duration) = self.track_duration else {
            return false;
        };
        self.current.is_some() && !self.paused && self.current_position() >= duration
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaBackend for NullBackend {
    fn set_source(&mut self, locator: &str) {
        self.current = Some(locator.to_string());
        self.paused = true;
        self.started_at = None;
        self.position_offset = Duration::ZERO;
        self.ended_reported = false;
        self.track_duration = Self::estimate_duration(Path::new(locator));
        if let Some(duration) = self.track_duration {
            self.events.push(MediaEvent::MetadataLoaded(duration));
        }
    }

    fn request_play(&mut self, request: PlayRequest) {
        let outcome = if self.current.is_none() {
            Err(String::from("no source selected"))
        } else if self.autoplay_blocked {
            Err(String::from("autoplay blocked by platform policy"))
        } else {
            if self.track_duration.is_some_and(|duration| self.position_offset >= duration) {
                self.position_offset = Duration::ZERO;
                self.ended_reported = false;
            }
            if self.paused {
                self.started_at = Some(Instant::now());
                self.paused = false;
            }
            Ok(())
        };
        self.events
            .push(MediaEvent::PlayResolved { request, outcome });
    }

    fn pause(&mut self) {
        self.position_offset = self.current_position();
        self.started_at = None;
        self.paused = true;
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.current.is_none() {
            return Err(anyhow::anyhow!("no active track"));
        }

        self.position_offset = self
            .track_duration
            .map_or(position, |duration| position.min(duration));
        self.started_at = if self.paused {
            None
        } else {
            Some(Instant::now())
        };
        self.ended_reported = false;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.current_position()
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn output_name(&self) -> String {
        String::from("Null audio output")
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        if self.is_finished() {
            if !self.ended_reported {
                debug!(source = ?self.current, "null backend reached end of track");
                self.ended_reported = true;
                self.events.push(MediaEvent::Ended);
            }
        } else if !self.paused && self.current.is_some() {
            self.events
                .push(MediaEvent::TimeUpdate(self.current_position()));
        }
        mem::take(&mut self.events)
    }
}

#[cfg(test)]
#[path = "../../tests/support/mod.rs"]
mod wav_fixture;
