//! Ally AI
//!
//! Party members that aren't the leader follow it in formation and engage
//! hostiles that come close. In parallel, on every evaluation, they try to
//! cast: first a heal on a hurt party member, otherwise an offensive spell
//! on the nearest engaged enemy.
//!
//! The leader is the selected, living player-controlled member, falling back
//! to any living player-controlled member.

use bevy::prelude::*;

use crate::sim::combat::attack_range;
use crate::sim::components::*;
use crate::sim::constants::*;
use crate::sim::spatial::{Spatial, SpatialQuery};
use crate::sim::spell_config::{SpellDefinition, SpellDefinitions, SpellId, Targeting};
use crate::sim::utils::{is_opposing, ActorInfo, ActorSnapshot, ActorView};

/// Pick the leader: selected first, then any player-controlled member.
fn find_leader(leaders: &Query<(Entity, &Position, Has<Selected>), LeaderFilter>) -> Option<(Entity, Vec2)> {
    let mut fallback = None;
    for (entity, position, selected) in leaders.iter() {
        if selected {
            return Some((entity, position.0));
        }
        fallback.get_or_insert((entity, position.0));
    }
    fallback
}

type LeaderFilter = (With<PlayerControlled>, With<PartyMember>, Without<Dead>, Without<Downed>);

/// Spell state an ally needs to pick an auto-cast.
struct CasterState<'a> {
    entity: Entity,
    position: Vec2,
    party: bool,
    book: &'a SpellBook,
    mana: f32,
    ally: &'a AllyAi,
}

impl CasterState<'_> {
    /// Known spells that are off cooldown, AI-ready, affordable and pass `filter`.
    fn castable<'s, F>(
        &'s self,
        spells: &'s SpellDefinitions,
        mut filter: F,
    ) -> impl Iterator<Item = (&'s SpellId, &'s SpellDefinition)> + 's
    where
        F: FnMut(&SpellDefinition) -> bool + 's,
    {
        self.book.known.iter().filter_map(move |id| {
            let def = spells.get(id)?;
            let ready = self.book.can_cast(id) && self.ally.is_spell_ready(id);
            (ready && self.mana >= def.mana_cost && filter(def)).then_some((id, def))
        })
    }
}

/// Heal the most injured party member below the threshold, if any spell fits.
fn choose_heal(
    caster: &CasterState,
    spells: &SpellDefinitions,
    snapshot: &ActorSnapshot,
    spatial: &dyn SpatialQuery,
) -> Option<CastIntent> {
    let patient = snapshot
        .iter()
        .filter(|a| a.is_alive() && !is_opposing(caster.party, a.party))
        .filter(|a| a.health_fraction < ALLY_HEAL_THRESHOLD)
        .filter(|a| a.position.distance(caster.position) <= ALLY_HEAL_RANGE)
        .filter(|a| spatial.has_line_of_sight(caster.position, a.position))
        .min_by(|a, b| a.health_fraction.total_cmp(&b.health_fraction))?;
    let distance = patient.position.distance(caster.position);

    let (id, def) = caster
        .castable(spells, |def| def.is_heal() && !def.is_offensive())
        .find(|(_, def)| match def.targeting {
            Targeting::Ally | Targeting::Enemy => distance <= def.range,
            Targeting::Ground | Targeting::Caster => true,
        })?;

    Some(match def.targeting {
        Targeting::Ally | Targeting::Enemy => CastIntent::on(id.clone(), patient.entity),
        Targeting::Ground => CastIntent::at(id.clone(), patient.position),
        Targeting::Caster => CastIntent::new(id.clone()),
    })
}

/// Offensive spell on `enemy`, the first castable one in spell book order.
fn choose_attack(
    caster: &CasterState,
    spells: &SpellDefinitions,
    enemy: &ActorInfo,
) -> Option<CastIntent> {
    let distance = enemy.position.distance(caster.position);
    let (id, def) = caster
        .castable(spells, |def| def.is_offensive())
        .find(|(_, def)| distance <= def.range)?;

    Some(match def.targeting {
        Targeting::Enemy | Targeting::Ally => CastIntent::on(id.clone(), enemy.entity),
        Targeting::Ground => CastIntent::at(id.clone(), enemy.position),
        Targeting::Caster => CastIntent::new(id.clone()),
    })
}

pub fn update_ally_ai(
    time: Res<Time>,
    mut commands: Commands,
    spatial: Res<Spatial>,
    spells: Res<SpellDefinitions>,
    actors: Query<ActorView>,
    leaders: Query<(Entity, &Position, Has<Selected>), LeaderFilter>,
    mut allies: Query<
        (
            Entity,
            &Position,
            &mut AllyAi,
            &mut MoveIntent,
            Option<&Weapon>,
            Option<&CombatStats>,
            Option<&SpellBook>,
            Option<&Mana>,
            Option<&GlobalCooldown>,
            Option<&StatusEffects>,
            Has<Casting>,
            Has<CastIntent>,
        ),
        (Without<Dead>, Without<Downed>),
    >,
) {
    let dt = time.delta_secs();
    let snapshot = ActorSnapshot::from_query(&actors);
    let leader = find_leader(&leaders);

    for (
        entity,
        position,
        mut ally,
        mut intent,
        weapon,
        stats,
        book,
        mana,
        gcd,
        statuses,
        casting,
        cast_queued,
    ) in allies.iter_mut()
    {
        let Some((leader_entity, leader_pos)) = leader else {
            *intent = MoveIntent::stop();
            continue;
        };
        if leader_entity == entity {
            continue;
        }

        ally.decision_timer -= dt;
        if ally.decision_timer > 0.0 {
            continue;
        }
        ally.decision_timer = ALLY_DECISION_INTERVAL;

        let pos = position.0;
        let party = snapshot.get(entity).map(|a| a.party).unwrap_or(true);

        // Keep the current target while it stays engageable
        let keep = ally
            .target
            .and_then(|t| snapshot.get(t))
            .filter(|t| t.is_alive() && is_opposing(party, t.party))
            .filter(|t| t.position.distance(pos) <= ALLY_ENGAGE_RANGE)
            .filter(|t| spatial.has_line_of_sight(pos, t.position))
            .copied();
        let enemy = keep.or_else(|| {
            snapshot
                .nearest(pos, ALLY_ENGAGE_RANGE, |a| {
                    a.is_alive()
                        && is_opposing(party, a.party)
                        && spatial.has_line_of_sight(pos, a.position)
                })
                .copied()
        });

        match enemy {
            Some(enemy) => {
                ally.state = AllyState::Engage;
                ally.target = Some(enemy.entity);
                commands.entity(entity).insert(AttackIntent {
                    target: enemy.entity,
                });
                if pos.distance(enemy.position) <= attack_range(weapon, stats) {
                    *intent = MoveIntent::stop();
                } else {
                    *intent = MoveIntent::toward(pos, enemy.position, 1.0);
                }
            }
            None => {
                if ally.state == AllyState::Engage {
                    commands.entity(entity).remove::<AttackIntent>();
                }
                ally.state = AllyState::Follow;
                ally.target = None;

                let goal = leader_pos + ally.formation_offset;
                let distance = pos.distance(goal);
                *intent = if distance > ALLY_FOLLOW_DISTANCE {
                    MoveIntent::toward(pos, goal, 1.0)
                } else if distance > ALLY_STOP_DISTANCE {
                    MoveIntent::toward(pos, goal, ALLY_SLOW_FOLLOW_MULT)
                } else {
                    MoveIntent::stop()
                };
            }
        }

        // Auto-cast never overrides a queued cast or interrupts one in progress
        let Some(book) = book else {
            continue;
        };
        let stunned = statuses.map(|s| s.is_stunned()).unwrap_or(false);
        let gcd_ready = gcd.map(|g| g.is_ready()).unwrap_or(true);
        if casting || cast_queued || stunned || !gcd_ready {
            continue;
        }

        let caster = CasterState {
            entity,
            position: pos,
            party,
            book,
            mana: mana.map(|m| m.current).unwrap_or(0.0),
            ally: &ally,
        };
        let engaged = enemy.filter(|e| e.position.distance(pos) <= ALLY_ATTACK_SPELL_RANGE);
        let cast = choose_heal(&caster, &spells, &snapshot, &**spatial)
            .or_else(|| engaged.and_then(|e| choose_attack(&caster, &spells, &e)));

        if let Some(cast) = cast {
            debug!("{:?} auto-casts {}", caster.entity, cast.spell);
            commands.entity(entity).insert(cast);
        }
    }
}
