//! Position Validation
//!
//! Last pass of every tick. Nothing upstream should ever leave an actor in a
//! wall, but if something does, the actor is repaired here rather than left
//! soft-locked. Repairs, in order of preference:
//! 1. the last position this pass saw as valid
//! 2. the nearest walkable tile (ring search)
//! 3. party members only: the level's spawn point (`EntityTeleported`)
//! 4. anyone else: tagged `ToRemove`
//!
//! Party members standing on valid ground but wedged against a wall corner
//! are nudged away from the blocked corners.

use bevy::prelude::*;

use crate::combat::channel::EventChannel;
use crate::combat::events::SimEvent;
use super::components::*;
use super::constants::UNSTICK_NUDGE;
use super::spatial::{nearest_walkable, Spatial, SpatialQuery};

/// Nudge a party member away from blocked corners, if the nudge lands on
/// walkable ground. Returns the new position when one was applied.
pub fn unstick(spatial: &dyn SpatialQuery, point: Vec2, radius: f32) -> Option<Vec2> {
    let corners = [
        Vec2::new(-1.0, -1.0),
        Vec2::new(1.0, -1.0),
        Vec2::new(-1.0, 1.0),
        Vec2::new(1.0, 1.0),
    ];
    let nudge: Vec2 = corners
        .iter()
        .filter(|corner| !spatial.is_walkable(point + **corner * radius))
        .map(|corner| -*corner * UNSTICK_NUDGE)
        .sum();

    if nudge == Vec2::ZERO {
        return None;
    }
    let nudged = point + nudge;
    spatial.is_walkable(nudged).then_some(nudged)
}

/// Validate every living actor's position and repair bad ones.
pub fn validate_positions(
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    mut last_valid: ResMut<LastValidPositions>,
    spatial: Res<Spatial>,
    mut actors: Query<
        (Entity, &mut Position, Option<&CollisionRadius>, Has<PartyMember>),
        (With<Health>, Without<Dead>),
    >,
) {
    for (entity, mut position, radius, is_party) in actors.iter_mut() {
        if spatial.is_walkable(position.0) {
            if is_party {
                let radius = radius.copied().unwrap_or_default().0;
                if let Some(nudged) = unstick(&**spatial, position.0, radius) {
                    position.0 = nudged;
                }
            }
            last_valid.0.insert(entity, position.0);
            continue;
        }

        let bad = position.0;
        if let Some(previous) = last_valid.0.get(&entity).copied().filter(|p| spatial.is_walkable(*p)) {
            position.0 = previous;
            warn!("{:?} at {:?} reset to last valid position {:?}", entity, bad, previous);
            continue;
        }

        if let Some(nearest) = nearest_walkable(&**spatial, bad) {
            position.0 = nearest;
            last_valid.0.insert(entity, nearest);
            warn!("{:?} at {:?} moved to nearest walkable {:?}", entity, bad, nearest);
            continue;
        }

        if is_party {
            if let Some(spawn) = spatial.spawn_point() {
                position.0 = spawn;
                last_valid.0.insert(entity, spawn);
                channel.emit(SimEvent::EntityTeleported { entity, to: spawn });
                warn!("{:?} stranded at {:?}, teleported to spawn", entity, bad);
                continue;
            }
            warn!("{:?} stranded at {:?} with no spawn point", entity, bad);
            continue;
        }

        commands.entity(entity).insert(ToRemove);
        warn!("{:?} stuck off-map at {:?}, removing", entity, bad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spatial::TileGrid;

    #[test]
    fn test_unstick_pushes_away_from_wall() {
        let grid = TileGrid::from_rows(&["#####", "#...#", "#...#", "#####"]).unwrap();
        // Hugging the top-left wall corner
        let start = Vec2::new(1.1, 1.1);
        let nudged = unstick(&grid, start, 0.3).unwrap();
        assert!(nudged.x > start.x && nudged.y > start.y);
    }

    #[test]
    fn test_unstick_ignores_open_ground() {
        let grid = TileGrid::from_rows(&["#####", "#...#", "#...#", "#####"]).unwrap();
        assert!(unstick(&grid, Vec2::new(2.5, 2.0), 0.3).is_none());
    }
}
