//! Notifications published by the playback controller.
//!
//! Subscribers get their own channel; a subscriber whose receiver has been
//! dropped is pruned on the next publish.

use crate::error::PlaybackError;
use crate::model::{RepeatMode, Track};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    TrackChanged { index: usize, track: Track },
    PlaybackStarted,
    PlaybackPaused,
    ModeChanged { shuffle: bool, repeat: RepeatMode },
    PlaybackFailed(PlaybackError),
    VolumeChanged { volume: f32, muted: bool },
    Progress {
        position: Duration,
        duration: Option<Duration>,
    },
    DurationKnown(Duration),
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<PlayerEvent>>,
}

impl EventBus {
    pub fn subscribe(&mut self) -> Receiver<PlayerEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, event: PlayerEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives_each_event() {
        let mut bus = EventBus::default();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.publish(PlayerEvent::PlaybackStarted);

        assert_eq!(first.try_recv(), Ok(PlayerEvent::PlaybackStarted));
        assert_eq!(second.try_recv(), Ok(PlayerEvent::PlaybackStarted));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut bus = EventBus::default();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(PlayerEvent::PlaybackPaused);

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(PlayerEvent::PlaybackPaused));
    }
}
