//! Event channel
//!
//! Ordered, queued publish/subscribe bus owned by one simulation session.
//! Systems `emit` during the tick; nothing is delivered until [`drain`] runs
//! after every simulation system, so a system never sees an event from its own
//! tick before producing it.
//!
//! [`drain`]: EventChannel::drain

use bevy::prelude::*;
use std::collections::HashMap;

use super::events::{SimEvent, SimEventKind};

/// Callback invoked for every delivered event of the subscribed kind.
pub type Subscriber = Box<dyn Fn(&SimEvent) + Send + Sync>;

#[derive(Resource, Default)]
pub struct EventChannel {
    queue: Vec<SimEvent>,
    subscribers: HashMap<SimEventKind, Vec<Subscriber>>,
    /// Catch-all subscribers, called after the kind-specific ones
    wildcard: Vec<Subscriber>,
    /// Total events delivered over the session
    delivered: u64,
}

impl EventChannel {
    /// Register a callback for one event kind.
    pub fn subscribe<F>(&mut self, kind: SimEventKind, callback: F)
    where
        F: Fn(&SimEvent) + Send + Sync + 'static,
    {
        self.subscribers
            .entry(kind)
            .or_default()
            .push(Box::new(callback));
    }

    /// Register a callback for every event.
    pub fn subscribe_all<F>(&mut self, callback: F)
    where
        F: Fn(&SimEvent) + Send + Sync + 'static,
    {
        self.wildcard.push(Box::new(callback));
    }

    /// Queue an event for delivery at the end of the tick.
    pub fn emit(&mut self, event: SimEvent) {
        self.queue.push(event);
    }

    /// Events queued this tick, in emission order.
    pub fn pending(&self) -> &[SimEvent] {
        &self.queue
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }

    /// Deliver all queued events in order and return them.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        let events = std::mem::take(&mut self.queue);
        for event in &events {
            if let Some(subscribers) = self.subscribers.get(&event.kind()) {
                for subscriber in subscribers {
                    subscriber(event);
                }
            }
            for subscriber in &self.wildcard {
                subscriber(event);
            }
        }
        self.delivered += events.len() as u64;
        events
    }

    /// Drop queued events and all subscribers (session teardown).
    pub fn clear(&mut self) {
        self.queue.clear();
        self.subscribers.clear();
        self.wildcard.clear();
    }
}
