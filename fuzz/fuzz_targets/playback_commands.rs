#![no_main]

use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tunedeck::{ControllerSettings, NullBackend, PlaybackController, PlaybackPhase, Playlist, Track};

fuzz_target!(|data: &[u8]| {
    let len = (data.len() % 32).max(1);
    let playlist = Playlist::new(
        (0..len)
            .map(|idx| Track::new(format!("track {idx}"), "", format!("track_{idx}.mp3")))
            .collect(),
    )
    .expect("non-empty playlist");
    let mut controller = PlaybackController::with_rng(
        playlist,
        NullBackend::new(),
        SmallRng::seed_from_u64(len as u64),
        ControllerSettings::default(),
    );
    controller.start();

    for byte in data {
        match byte % 10 {
            0 => controller.next(),
            1 => controller.previous(),
            2 => controller.on_track_ended(),
            3 => controller.toggle_play_pause(),
            4 => controller.toggle_shuffle(),
            5 => controller.cycle_repeat_mode(),
            6 => controller.load(i64::from(*byte) - 128, byte & 1 == 1),
            7 => controller.seek_to_fraction(f64::from(*byte) / 255.0),
            8 => controller.backend_mut().set_autoplay_blocked(byte & 2 == 2),
            _ => controller.pump(),
        }
        assert!(controller.index() < len);
        assert_eq!(
            controller.is_playing(),
            controller.phase() == PlaybackPhase::Playing
        );
    }
});
