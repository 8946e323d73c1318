//! Event plumbing
//!
//! Owns the per-session event channel and the combat log:
//! - Typed simulation events
//! - The queued channel systems emit into
//! - End-of-tick drain that notifies subscribers, re-publishes the events to
//!   Bevy readers and records them in the log

use bevy::prelude::*;

pub mod channel;
pub mod events;
pub mod log;

use channel::EventChannel;
use events::SimEvent;
use log::CombatLog;

/// Plugin for the event channel and combat log
pub struct EventChannelPlugin;

impl Plugin for EventChannelPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SimEvent>()
            .init_resource::<EventChannel>()
            .init_resource::<CombatLog>()
            .add_systems(Last, drain_event_channel);
    }
}

/// Deliver everything emitted this tick.
///
/// Runs in `Last`, after every simulation system. ECS readers see the events
/// through `EventReader<SimEvent>` on the following tick.
pub fn drain_event_channel(
    time: Res<Time>,
    mut channel: ResMut<EventChannel>,
    mut combat_log: ResMut<CombatLog>,
    mut writer: EventWriter<SimEvent>,
) {
    combat_log.match_time += time.delta_secs();

    let events = channel.drain();
    if events.is_empty() {
        return;
    }

    for event in &events {
        combat_log.record(event);
    }
    debug!("Delivered {} simulation events", events.len());
    writer.send_batch(events);
}
