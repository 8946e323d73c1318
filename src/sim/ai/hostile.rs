//! Hostile AI
//!
//! State machine for monsters: `Idle/Patrol → Chase → Attack`, with `Return`
//! home when the target is lost or the leash snaps, and `Flee` away from a
//! threat. Evaluation is throttled by `AiController::decision_timer`; between
//! evaluations the last `MoveIntent`/`AttackIntent` stays in force. The leash
//! check runs every tick.

use bevy::prelude::*;

use crate::sim::combat::attack_range;
use crate::sim::components::*;
use crate::sim::constants::*;
use crate::sim::spatial::Spatial;
use crate::sim::utils::{ActorInfo, ActorSnapshot, ActorView};

/// Distance band where an attacking hostile keeps swinging.
fn attack_band(range: f32) -> f32 {
    range * ATTACK_HYSTERESIS
}

/// A target is usable while it exists and is neither Dead nor Downed.
fn valid_target(snapshot: &ActorSnapshot, target: Option<Entity>) -> Option<ActorInfo> {
    target
        .and_then(|t| snapshot.get(t))
        .filter(|info| info.is_alive())
        .copied()
}

pub fn update_hostile_ai(
    time: Res<Time>,
    mut commands: Commands,
    spatial: Res<Spatial>,
    actors: Query<ActorView>,
    mut hostiles: Query<
        (
            Entity,
            &Position,
            &mut AiController,
            &mut MoveIntent,
            Option<&AggroRange>,
            Option<&LeashRange>,
            Option<&Weapon>,
            Option<&CombatStats>,
        ),
        (Without<Dead>, Without<PartyMember>),
    >,
) {
    let dt = time.delta_secs();
    let snapshot = ActorSnapshot::from_query(&actors);

    for (entity, position, mut ai, mut intent, aggro, leash, weapon, stats) in hostiles.iter_mut() {
        let pos = position.0;
        let leash = leash.map(|l| l.0).unwrap_or(LEASH_RANGE_DEFAULT);

        // Leash: every tick, any state
        if ai.state != AiState::Return && pos.distance(ai.home) > leash {
            debug!("{:?} leashed at {:.1} from home", entity, pos.distance(ai.home));
            ai.give_up();
            commands.entity(entity).remove::<AttackIntent>();
            *intent = MoveIntent::toward(pos, ai.home, 1.0);
            continue;
        }

        ai.decision_timer -= dt;
        if ai.decision_timer > 0.0 {
            continue;
        }
        ai.decision_timer = HOSTILE_DECISION_INTERVAL;

        let aggro = aggro.map(|a| a.0).unwrap_or(AGGRO_RANGE_DEFAULT);
        let range = attack_range(weapon, stats);

        match ai.state {
            AiState::Idle | AiState::Patrol => {
                let found = snapshot.nearest(pos, aggro, |candidate| {
                    candidate.party
                        && candidate.is_alive()
                        && spatial.has_line_of_sight(pos, candidate.position)
                });
                match found {
                    Some(target) => {
                        debug!("{:?} aggroed on {:?}", entity, target.entity);
                        ai.state = AiState::Chase;
                        ai.target = Some(target.entity);
                        *intent = MoveIntent::toward(pos, target.position, 1.0);
                    }
                    None => *intent = MoveIntent::stop(),
                }
            }
            AiState::Chase => {
                let Some(target) = valid_target(&snapshot, ai.target) else {
                    ai.give_up();
                    continue;
                };
                let distance = pos.distance(target.position);
                if distance <= range && spatial.has_line_of_sight(pos, target.position) {
                    ai.state = AiState::Attack;
                    *intent = MoveIntent::stop();
                    commands.entity(entity).insert(AttackIntent {
                        target: target.entity,
                    });
                } else {
                    *intent = MoveIntent::toward(pos, target.position, 1.0);
                }
            }
            AiState::Attack => {
                let Some(target) = valid_target(&snapshot, ai.target) else {
                    ai.give_up();
                    commands.entity(entity).remove::<AttackIntent>();
                    continue;
                };
                let distance = pos.distance(target.position);
                if distance > attack_band(range) || !spatial.has_line_of_sight(pos, target.position) {
                    ai.state = AiState::Chase;
                    commands.entity(entity).remove::<AttackIntent>();
                    *intent = MoveIntent::toward(pos, target.position, 1.0);
                } else {
                    *intent = MoveIntent::stop();
                    commands.entity(entity).insert(AttackIntent {
                        target: target.entity,
                    });
                }
            }
            AiState::Return => {
                if pos.distance(ai.home) <= HOME_ARRIVAL_DISTANCE {
                    ai.state = AiState::Idle;
                    *intent = MoveIntent::stop();
                } else {
                    *intent = MoveIntent::toward(pos, ai.home, 1.0);
                }
            }
            AiState::Flee => {
                let Some(threat) = valid_target(&snapshot, ai.target) else {
                    ai.give_up();
                    continue;
                };
                *intent = MoveIntent::away_from(pos, threat.position);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_band_is_wider_than_range() {
        assert!((attack_band(1.5) - 1.8).abs() < 1e-5);
    }
}
