use crossbeam_channel::{unbounded, Receiver, Sender};

/// Load/playback status reported by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStatus {
    NoMedia,
    Loading,
    LoadedMedia,
    EndOfMedia,
    InvalidMedia,
}

/// Notifications an engine sends to its listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PositionChanged(u64),
    DurationChanged(u64),
    Error(String),
    MediaStatusChanged(MediaStatus),
}

/// Fan-out of engine notifications.
///
/// Each subscriber gets its own unbounded channel; dropping the receiver
/// unsubscribes it and the sender is pruned on the next emit. Emitters live
/// on the UI thread, so delivery order is emission order.
#[derive(Default)]
pub struct EventHub {
    listeners: Vec<Sender<EngineEvent>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = unbounded();
        self.listeners.push(tx);
        rx
    }

    pub fn emit(&mut self, event: EngineEvent) {
        log::trace!("engine event: {event:?}");
        self.listeners
            .retain(|listener| listener.send(event.clone()).is_ok());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listener_sees_events_in_order() {
        let mut hub = EventHub::new();
        let first = hub.subscribe();
        let second = hub.subscribe();

        hub.emit(EngineEvent::DurationChanged(125_000));
        hub.emit(EngineEvent::MediaStatusChanged(MediaStatus::LoadedMedia));

        for rx in [first, second] {
            let seen: Vec<_> = rx.try_iter().collect();
            assert_eq!(
                seen,
                vec![
                    EngineEvent::DurationChanged(125_000),
                    EngineEvent::MediaStatusChanged(MediaStatus::LoadedMedia),
                ]
            );
        }
    }

    #[test]
    fn dropped_receiver_is_pruned() {
        let mut hub = EventHub::new();
        let kept = hub.subscribe();
        drop(hub.subscribe());
        assert_eq!(hub.listener_count(), 2);

        hub.emit(EngineEvent::PositionChanged(0));
        assert_eq!(hub.listener_count(), 1);
        assert_eq!(kept.try_recv(), Ok(EngineEvent::PositionChanged(0)));
    }
}
