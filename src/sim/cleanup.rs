//! Entity cleanup
//!
//! Despawns entities tagged `ToRemove` and corpses whose timer ran out, and
//! advances the Downed timers.

use bevy::prelude::*;

use super::components::*;
use super::constants::CORPSE_LIFETIME;

/// Despawn removed entities and expired corpses.
pub fn cleanup_entities(
    time: Res<Time>,
    mut commands: Commands,
    mut last_valid: ResMut<LastValidPositions>,
    removed: Query<Entity, With<ToRemove>>,
    mut corpses: Query<(Entity, &mut Dead), Without<ToRemove>>,
    mut downed: Query<&mut Downed>,
) {
    let dt = time.delta_secs();

    for entity in removed.iter() {
        commands.entity(entity).despawn_recursive();
        last_valid.0.remove(&entity);
    }

    for (entity, mut dead) in corpses.iter_mut() {
        dead.timer += dt;
        if dead.timer >= CORPSE_LIFETIME {
            debug!("Corpse {:?} despawned", entity);
            commands.entity(entity).despawn_recursive();
            last_valid.0.remove(&entity);
        }
    }

    for mut downed in downed.iter_mut() {
        downed.timer += dt;
    }
}
