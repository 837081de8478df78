mod support;

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::thread;
use std::time::Duration;
use support::write_test_wav;
use tunedeck::{
    ControllerSettings, NullBackend, PlaybackController, PlaybackPhase, PlayerEvent, Playlist,
    RepeatMode, Track,
};

fn playlist(len: usize) -> Playlist {
    Playlist::new(
        (0..len)
            .map(|n| Track::new(format!("track {n}"), "artist", format!("track_{n}.mp3")))
            .collect(),
    )
    .expect("playlist")
}

fn controller(len: usize) -> PlaybackController<NullBackend, StdRng> {
    let mut controller = PlaybackController::with_rng(
        playlist(len),
        NullBackend::new(),
        StdRng::seed_from_u64(11),
        ControllerSettings::default(),
    );
    controller.start();
    controller
}

#[test]
fn repeat_all_wraps_from_last_track_and_plays() {
    let mut controller = controller(3);
    controller.load(2, false);
    controller.set_repeat_mode(RepeatMode::All);

    controller.next();
    controller.pump();

    assert_eq!(controller.index(), 0);
    assert!(controller.is_playing());
    assert_eq!(controller.backend().current_source(), Some("track_0.mp3"));
}

#[test]
fn repeat_one_replays_on_natural_end() {
    let mut controller = controller(3);
    controller.set_repeat_mode(RepeatMode::One);
    let events = controller.subscribe();

    controller.on_track_ended();
    controller.pump();

    assert_eq!(controller.index(), 0);
    assert!(controller.is_playing());
    let reported: Vec<PlayerEvent> = events.try_iter().collect();
    assert!(matches!(reported[0], PlayerEvent::TrackChanged { index: 0, .. }));
    assert!(reported.contains(&PlayerEvent::PlaybackStarted));
}

#[test]
fn shuffle_from_middle_lands_anywhere() {
    let mut controller = controller(3);
    controller.load(1, false);
    controller.set_shuffle(true);

    let mut counts = [0_usize; 3];
    for _ in 0..300 {
        controller.next();
        counts[controller.index()] += 1;
    }

    assert!(counts.iter().all(|count| *count > 50), "counts {counts:?}");
}

#[test]
fn end_of_playlist_without_repeat_stops() {
    let mut controller = controller(2);
    controller.load(1, true);
    controller.pump();
    assert!(controller.is_playing());

    controller.next();

    assert_eq!(controller.index(), 1);
    assert_eq!(controller.phase(), PlaybackPhase::Paused);
    assert!(controller.backend().is_paused());
    assert!(controller.position() < Duration::from_millis(50));
}

#[test]
fn blocked_autoplay_recovers_on_next_gesture() {
    let mut controller = controller(2);
    let events = controller.subscribe();
    controller.backend_mut().set_autoplay_blocked(true);

    controller.toggle_play_pause();
    controller.pump();
    assert!(!controller.is_playing());
    let failures = events
        .try_iter()
        .filter(|event| matches!(event, PlayerEvent::PlaybackFailed(_)))
        .count();
    assert_eq!(failures, 1);

    controller.backend_mut().set_autoplay_blocked(false);
    controller.toggle_play_pause();
    controller.pump();
    assert!(controller.is_playing());
}

#[test]
fn previous_restarts_after_threshold() {
    let mut controller = PlaybackController::with_rng(
        playlist(3),
        NullBackend::new(),
        StdRng::seed_from_u64(5),
        ControllerSettings {
            restart_threshold: Duration::from_millis(20),
            ..ControllerSettings::default()
        },
    );
    controller.start();
    controller.load(1, true);
    controller.pump();
    thread::sleep(Duration::from_millis(40));

    controller.previous();
    assert_eq!(controller.index(), 1);
    assert!(controller.position() < Duration::from_millis(20));

    controller.previous();
    assert_eq!(controller.index(), 0);
}

#[test]
fn natural_end_advances_to_next_track() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = dir.path().join("first.wav");
    let second = dir.path().join("second.wav");
    write_test_wav(&first, 60);
    write_test_wav(&second, 5_000);

    let playlist = Playlist::new(vec![
        Track::new("first", "", first.to_string_lossy()),
        Track::new("second", "", second.to_string_lossy()),
    ])
    .expect("playlist");
    let mut controller = PlaybackController::with_rng(
        playlist,
        NullBackend::new(),
        StdRng::seed_from_u64(1),
        ControllerSettings::default(),
    );
    controller.start();
    controller.play();
    controller.pump();
    assert!(controller.duration().is_some());

    thread::sleep(Duration::from_millis(120));
    controller.pump();
    controller.pump();

    assert_eq!(controller.index(), 1);
    assert!(controller.is_playing());
}

#[test]
fn seek_to_fraction_uses_decoded_duration() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("long.wav");
    write_test_wav(&path, 2_000);

    let playlist =
        Playlist::new(vec![Track::new("long", "", path.to_string_lossy())]).expect("playlist");
    let mut controller = PlaybackController::with_rng(
        playlist,
        NullBackend::new(),
        StdRng::seed_from_u64(1),
        ControllerSettings::default(),
    );
    controller.start();

    controller.seek_to_fraction(0.5);

    let position = controller.position();
    assert!(position >= Duration::from_millis(950) && position <= Duration::from_millis(1_050));
}
