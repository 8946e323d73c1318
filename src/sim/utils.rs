//! Shared Utility Functions
//!
//! Snapshot and geometry helpers used by AI, combat and magic. Systems take a
//! read-only [`ActorSnapshot`] first, decide, then apply their changes, so a
//! decision never holds a borrow on the entity it mutates.

use bevy::prelude::*;
use std::collections::HashMap;

use super::components::{Dead, Downed, Enemy, Health, PartyMember, Position};

/// Read-only actor query used to build snapshots.
pub type ActorView = (
    Entity,
    &'static Position,
    &'static Health,
    Has<PartyMember>,
    Has<Enemy>,
    Has<Dead>,
    Has<Downed>,
);

/// Frozen view of one actor for this system pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorInfo {
    pub entity: Entity,
    pub position: Vec2,
    pub party: bool,
    pub enemy: bool,
    pub dead: bool,
    pub downed: bool,
    pub health_fraction: f32,
}

impl ActorInfo {
    pub fn is_alive(&self) -> bool {
        !self.dead && !self.downed
    }
}

/// Party and non-party actors oppose each other.
pub fn is_opposing(a_party: bool, b_party: bool) -> bool {
    a_party != b_party
}

/// Read-only actor list in query order, indexed by entity.
#[derive(Debug, Default)]
pub struct ActorSnapshot {
    actors: Vec<ActorInfo>,
    index: HashMap<Entity, usize>,
}

impl ActorSnapshot {
    pub fn new(actors: impl IntoIterator<Item = ActorInfo>) -> Self {
        let actors: Vec<ActorInfo> = actors.into_iter().collect();
        let index = actors
            .iter()
            .enumerate()
            .map(|(i, a)| (a.entity, i))
            .collect();
        Self { actors, index }
    }

    pub fn from_query(actors: &Query<ActorView>) -> Self {
        Self::new(
            actors
                .iter()
                .map(|(entity, position, health, party, enemy, dead, downed)| ActorInfo {
                    entity,
                    position: position.0,
                    party,
                    enemy,
                    dead,
                    downed,
                    health_fraction: health.fraction(),
                }),
        )
    }

    /// Re-validate a weak reference: None if the entity is gone.
    pub fn get(&self, entity: Entity) -> Option<&ActorInfo> {
        self.index.get(&entity).map(|&i| &self.actors[i])
    }

    /// The entity exists and is neither Dead nor Downed.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.get(entity).map(|a| a.is_alive()).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorInfo> {
        self.actors.iter()
    }

    /// Closest actor to `from` within `max_distance` that passes `filter`.
    /// Ties keep the earlier actor in query order.
    pub fn nearest<F>(&self, from: Vec2, max_distance: f32, mut filter: F) -> Option<&ActorInfo>
    where
        F: FnMut(&ActorInfo) -> bool,
    {
        let mut best: Option<(&ActorInfo, f32)> = None;
        for actor in &self.actors {
            let distance = actor.position.distance(from);
            if distance > max_distance || !filter(actor) {
                continue;
            }
            if best.map(|(_, d)| distance < d).unwrap_or(true) {
                best = Some((actor, distance));
            }
        }
        best.map(|(actor, _)| actor)
    }

    /// Living opposing actors within `radius` of `center`.
    pub fn opposing_in_radius(&self, caster_party: bool, center: Vec2, radius: f32) -> Vec<Entity> {
        self.actors
            .iter()
            .filter(|a| a.is_alive() && is_opposing(caster_party, a.party))
            .filter(|a| a.position.distance(center) <= radius)
            .map(|a| a.entity)
            .collect()
    }
}

/// True if `point` lies within `half_angle_deg` of `direction` as seen from `origin`.
pub fn within_cone(origin: Vec2, direction: Vec2, point: Vec2, half_angle_deg: f32) -> bool {
    let to_point = point - origin;
    if to_point == Vec2::ZERO {
        return true;
    }
    let direction = direction.normalize_or_zero();
    if direction == Vec2::ZERO {
        return false;
    }
    let cos = direction.dot(to_point.normalize());
    cos >= half_angle_deg.to_radians().cos() - 1e-5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: u32, x: f32, party: bool) -> ActorInfo {
        ActorInfo {
            entity: Entity::from_raw(id),
            position: Vec2::new(x, 0.0),
            party,
            enemy: !party,
            dead: false,
            downed: false,
            health_fraction: 1.0,
        }
    }

    #[test]
    fn test_nearest_respects_filter_and_range() {
        let snapshot = ActorSnapshot::new([actor(1, 1.0, true), actor(2, 2.0, false), actor(3, 9.0, false)]);

        let found = snapshot.nearest(Vec2::ZERO, 5.0, |a| !a.party).unwrap();
        assert_eq!(found.entity, Entity::from_raw(2));
        assert!(snapshot.nearest(Vec2::ZERO, 1.5, |a| !a.party).is_none());
    }

    #[test]
    fn test_removed_entity_fails_revalidation() {
        let snapshot = ActorSnapshot::new([actor(1, 0.0, true)]);
        assert!(snapshot.is_alive(Entity::from_raw(1)));
        assert!(!snapshot.is_alive(Entity::from_raw(42)));
    }

    #[test]
    fn test_cone_half_angle() {
        let origin = Vec2::ZERO;
        let right = Vec2::X;
        assert!(within_cone(origin, right, Vec2::new(2.0, 0.5), 45.0));
        assert!(within_cone(origin, right, Vec2::new(1.0, 1.0), 45.0));
        assert!(!within_cone(origin, right, Vec2::new(0.0, 2.0), 45.0));
        assert!(!within_cone(origin, right, Vec2::new(-1.0, 0.0), 45.0));
    }
}
