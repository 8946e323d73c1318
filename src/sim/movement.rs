//! Movement
//!
//! Turns `MoveIntent` (or a click-to-move `TargetPosition`) into velocity and
//! advances positions one axis at a time, so an entity blocked on one axis
//! still slides along the other. An axis step is taken only if the new
//! position's center and its four corners (at 80% of the collision radius)
//! are walkable and inside the level bounds.

use bevy::prelude::*;

use super::components::*;
use super::constants::*;
use super::spatial::{Spatial, SpatialQuery};

/// Steer click-to-move entities toward their destination.
pub fn apply_click_to_move(
    mut commands: Commands,
    mut movers: Query<(Entity, &Position, &TargetPosition, &mut MoveIntent), (Without<Dead>, Without<Downed>)>,
) {
    for (entity, position, destination, mut intent) in movers.iter_mut() {
        if position.0.distance(destination.0) < CLICK_MOVE_ARRIVAL {
            *intent = MoveIntent::stop();
            commands.entity(entity).remove::<TargetPosition>();
        } else {
            *intent = MoveIntent::toward(position.0, destination.0, 1.0);
        }
    }
}

/// True if a body of `radius` centered at `point` fits in open tiles.
pub fn position_clear(spatial: &dyn SpatialQuery, point: Vec2, radius: f32) -> bool {
    if let Some(bounds) = spatial.bounds() {
        if point.x - radius < 0.0
            || point.y - radius < 0.0
            || point.x + radius > bounds.x
            || point.y + radius > bounds.y
        {
            return false;
        }
    }
    if !spatial.is_walkable(point) {
        return false;
    }
    let r = radius * CORNER_CHECK_FACTOR;
    [
        Vec2::new(-r, -r),
        Vec2::new(r, -r),
        Vec2::new(-r, r),
        Vec2::new(r, r),
    ]
    .iter()
    .all(|corner| spatial.is_walkable(point + *corner))
}

/// Advance one step, X then Y, keeping whichever axes are clear.
pub fn step_with_collision(spatial: &dyn SpatialQuery, from: Vec2, delta: Vec2, radius: f32) -> Vec2 {
    let mut pos = from;
    if delta.x != 0.0 {
        let candidate = Vec2::new(pos.x + delta.x, pos.y);
        if position_clear(spatial, candidate, radius) {
            pos = candidate;
        }
    }
    if delta.y != 0.0 {
        let candidate = Vec2::new(pos.x, pos.y + delta.y);
        if position_clear(spatial, candidate, radius) {
            pos = candidate;
        }
    }
    pos
}

/// Apply intents to velocity, facing and position.
pub fn move_entities(
    time: Res<Time>,
    spatial: Res<Spatial>,
    mut movers: Query<
        (
            &mut Position,
            &MoveIntent,
            Option<&Speed>,
            Option<&CollisionRadius>,
            Option<&StatusEffects>,
            Option<&mut Velocity>,
            Option<&mut Facing>,
        ),
        (Without<Dead>, Without<Downed>, Without<LeapingAbility>),
    >,
) {
    let dt = time.delta_secs();

    for (mut position, intent, speed, radius, statuses, velocity, facing) in movers.iter_mut() {
        let slow = statuses.map(|s| s.slow_multiplier()).unwrap_or(1.0);
        let speed = speed.copied().unwrap_or_default().0;
        let v = if intent.is_stopped() {
            Vec2::ZERO
        } else {
            intent.direction * speed * intent.speed_mult * slow
        };

        if let Some(mut velocity) = velocity {
            velocity.0 = v;
        }
        if let (Some(mut facing), Some(new_facing)) = (facing, Facing::from_vector(v)) {
            if *facing != new_facing {
                *facing = new_facing;
            }
        }
        if v == Vec2::ZERO {
            continue;
        }

        let radius = radius.copied().unwrap_or_default().0;
        let next = step_with_collision(&**spatial, position.0, v * dt, radius);
        if next != position.0 {
            position.0 = next;
        }
    }
}
