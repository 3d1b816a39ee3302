//! Store-updated notifications
//!
//! Listeners subscribe to a channel and receive an event after each
//! committed write. Publishing happens outside the store locks, so a slow
//! or dropped listener never holds up a writer.

use std::sync::{mpsc, Mutex, PoisonError};

use serde::Serialize;

use crate::entities::{ComponentId, MovementId};

/// A committed change to the catalog or the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    ComponentRegistered { component_id: ComponentId },
    ComponentAmended { component_id: ComponentId },
    StockChanged {
        component_id: ComponentId,
        movement_id: MovementId,
        balance: i64,
    },
}

impl StoreEvent {
    pub fn component_id(&self) -> ComponentId {
        match self {
            StoreEvent::ComponentRegistered { component_id }
            | StoreEvent::ComponentAmended { component_id }
            | StoreEvent::StockChanged { component_id, .. } => *component_id,
        }
    }
}

/// Best-effort fan-out of store events to every live subscriber
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<mpsc::Sender<StoreEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, event: StoreEvent) {
        let mut subs = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Drop subscribers whose receiver is gone
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscribe(&self) -> mpsc::Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        let event = StoreEvent::ComponentRegistered {
            component_id: ComponentId(1),
        };
        bus.publish(event.clone());

        assert_eq!(a.try_recv().unwrap(), event);
        assert_eq!(b.try_recv().unwrap(), event);
    }

    #[test]
    fn test_dead_subscribers_are_dropped() {
        let bus = EventBus::new();
        let live = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(StoreEvent::ComponentAmended {
            component_id: ComponentId(4),
        });
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(live.try_recv().unwrap().component_id(), ComponentId(4));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(StoreEvent::StockChanged {
            component_id: ComponentId(1),
            movement_id: MovementId(1),
            balance: 10,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
