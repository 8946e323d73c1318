//! Headless scenario execution
//!
//! Runs a scenario without any graphical output on a fixed time step,
//! suitable for automated testing and balance runs.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::path::Path;
use std::time::Duration;

use crate::combat::channel::EventChannel;
use crate::combat::drain_event_channel;
use crate::combat::events::SimEvent;
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::sim::components::*;
use crate::sim::constants::FIXED_TIMESTEP;
use crate::sim::spatial::Spatial;
use crate::sim::spawn::{hostile, party_ally, party_leader, CasterBundle};
use crate::sim::spell_config::SpellDefinitions;
use crate::sim::SimPlugin;

use super::config::{ActorConfig, ScenarioConfig};

/// How a scenario ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every hostile is dead
    Victory,
    /// The whole party went down
    PartyWiped,
    /// Neither happened before the time limit
    Timeout,
}

/// Final state of one actor
#[derive(Debug, Clone)]
pub struct ActorResult {
    pub name: String,
    pub max_health: f32,
    pub final_health: f32,
    pub downed: bool,
    pub dead: bool,
    pub position: Vec2,
}

/// Result of a completed headless scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub outcome: Outcome,
    /// Simulated seconds until the outcome
    pub elapsed: f32,
    pub party: Vec<ActorResult>,
    /// Hostiles still in the world (corpses are despawned after a while)
    pub hostiles: Vec<ActorResult>,
    pub events_delivered: u64,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
}

/// Resource to track headless scenario state
#[derive(Resource)]
pub struct HeadlessScenarioState {
    pub max_duration: f32,
    pub elapsed_time: f32,
    pub output_path: Option<String>,
    pub complete: bool,
    pub random_seed: Option<u64>,
    pub result: Option<ScenarioResult>,
}

/// The scenario being run
#[derive(Resource, Clone)]
pub struct ActiveScenario(pub ScenarioConfig);

/// Plugin for headless scenario execution
pub struct HeadlessPlugin {
    pub config: ScenarioConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        // Configs are validated on load; a broken level here is a programming error
        match self.config.tile_grid() {
            Ok(Some(grid)) => {
                app.insert_resource(Spatial::new(grid));
            }
            Ok(None) => {}
            Err(e) => panic!("Invalid scenario level: {}", e),
        }

        app.insert_resource(ActiveScenario(self.config.clone()))
            .insert_resource(HeadlessScenarioState {
                max_duration: self.config.max_duration_secs,
                elapsed_time: 0.0,
                output_path: self.config.output_path.clone(),
                complete: false,
                random_seed: self.config.random_seed,
                result: None,
            })
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
                FIXED_TIMESTEP,
            )))
            .add_plugins(SimPlugin {
                seed: self.config.random_seed,
            });

        // The end check sees this tick's events only once they are drained
        app.add_systems(Startup, headless_setup_scenario).add_systems(
            Last,
            (
                headless_track_time,
                headless_check_scenario_end,
                headless_exit_on_complete,
            )
                .chain()
                .after(drain_event_channel),
        );
    }
}

fn spawn_actor(commands: &mut Commands, bundle: impl Bundle, actor: &ActorConfig) -> Entity {
    let mut entity = commands.spawn(bundle);
    entity.insert((
        Name::new(actor.name.clone()),
        CombatStats {
            armor: actor.armor,
            ..default()
        },
    ));
    if let Some(weapon) = actor.weapon {
        entity.insert(weapon);
    }
    if let Some(attributes) = actor.attributes {
        entity.insert(attributes);
    }
    if let Some(resistances) = actor.resistances {
        entity.insert(resistances);
    }
    if actor.mana > 0.0 || !actor.spells.is_empty() {
        entity.insert(CasterBundle::new(actor.mana, SpellBook::new(actor.spells.iter().cloned())));
    }
    entity.id()
}

/// Setup system for the headless scenario
fn headless_setup_scenario(
    mut commands: Commands,
    scenario: Res<ActiveScenario>,
    mut combat_log: ResMut<CombatLog>,
) {
    combat_log.clear();
    combat_log.log(
        CombatLogEventType::MatchEvent,
        "Scenario started (headless mode)".to_string(),
    );

    let config = &scenario.0;
    for (index, actor) in config.party.iter().enumerate() {
        let position = Vec2::from(actor.position);
        if index == 0 {
            spawn_actor(&mut commands, party_leader(position, actor.health), actor);
        } else {
            let leader = Vec2::from(config.party[0].position);
            spawn_actor(
                &mut commands,
                party_ally(index, position, actor.health, position - leader),
                actor,
            );
        }
    }

    for actor in &config.hostiles {
        let entity = spawn_actor(&mut commands, hostile(Vec2::from(actor.position), actor.health), actor);
        if let Some(range) = actor.aggro_range {
            commands.entity(entity).insert(AggroRange(range));
        }
        if let Some(range) = actor.leash_range {
            commands.entity(entity).insert(LeashRange(range));
        }
    }

    info!(
        "Headless scenario setup complete: {} party members vs {} hostiles",
        config.party.len(),
        config.hostiles.len()
    );
}

fn headless_track_time(time: Res<Time>, mut state: ResMut<HeadlessScenarioState>) {
    state.elapsed_time += time.delta_secs();
}

type ResultView<'a> = (
    Option<&'a Name>,
    &'a Health,
    &'a Position,
    Has<PartyMember>,
    Has<Dead>,
    Has<Downed>,
);

/// End on victory, wipe or timeout.
fn headless_check_scenario_end(
    mut events: EventReader<SimEvent>,
    actors: Query<ResultView, With<Health>>,
    scenario: Res<ActiveScenario>,
    channel: Res<EventChannel>,
    combat_log: Res<CombatLog>,
    mut state: ResMut<HeadlessScenarioState>,
) {
    let wiped = events.read().any(|e| matches!(e, SimEvent::PartyWiped));
    if state.complete {
        return;
    }

    let hostiles_standing = actors.iter().any(|(_, _, _, party, dead, _)| !party && !dead);
    let outcome = if wiped {
        info!("Party wiped after {:.1}s", state.elapsed_time);
        Outcome::PartyWiped
    } else if !scenario.0.hostiles.is_empty() && !hostiles_standing {
        info!("All hostiles defeated after {:.1}s", state.elapsed_time);
        Outcome::Victory
    } else if state.elapsed_time >= state.max_duration {
        info!("Scenario timed out after {:.1}s", state.elapsed_time);
        Outcome::Timeout
    } else {
        return;
    };

    let mut party = Vec::new();
    let mut hostiles = Vec::new();
    for (name, health, position, is_party, dead, downed) in actors.iter() {
        let result = ActorResult {
            name: name.map(|n| n.as_str().to_string()).unwrap_or_default(),
            max_health: health.maximum,
            final_health: health.current,
            downed,
            dead,
            position: position.0,
        };
        if is_party {
            party.push(result);
        } else {
            hostiles.push(result);
        }
    }

    if let Some(path) = state.output_path.as_deref() {
        match combat_log.save_to_file(Path::new(path)) {
            Ok(()) => println!("Scenario complete. Log saved to: {}", path),
            Err(e) => eprintln!("Failed to save combat log: {}", e),
        }
    }

    state.result = Some(ScenarioResult {
        outcome,
        elapsed: state.elapsed_time,
        party,
        hostiles,
        events_delivered: channel.delivered_count(),
        random_seed: state.random_seed,
    });
    state.complete = true;
}

/// Exit the app when the scenario is complete
fn headless_exit_on_complete(state: Res<HeadlessScenarioState>, mut exit: EventWriter<AppExit>) {
    if state.complete {
        exit.send(AppExit::Success);
    }
}

/// Build an app that runs `config` with the given spell table.
pub fn build_scenario_app(config: ScenarioConfig, spells: SpellDefinitions, logging: bool) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    if logging {
        app.add_plugins(LogPlugin::default());
    }
    app.insert_resource(spells)
        .add_plugins(HeadlessPlugin { config });
    app
}

/// Run a scenario to completion on the fixed step and return its result.
pub fn run_scenario(config: ScenarioConfig, spells: SpellDefinitions) -> Result<ScenarioResult, String> {
    run_scenario_inner(config, spells, false)
}

/// Like [`run_scenario`], with log output and a printed summary.
pub fn run_headless(config: ScenarioConfig, spells: SpellDefinitions) -> Result<ScenarioResult, String> {
    println!("Starting headless scenario...");
    println!("  Party: {}", names(&config.party));
    println!("  Hostiles: {}", names(&config.hostiles));
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    let result = run_scenario_inner(config, spells, true)?;
    println!("Outcome: {:?} after {:.1}s", result.outcome, result.elapsed);
    for actor in result.party.iter().chain(result.hostiles.iter()) {
        println!(
            "  {:<12} {:>5.0}/{:<5.0} {}",
            actor.name,
            actor.final_health,
            actor.max_health,
            if actor.dead {
                "dead"
            } else if actor.downed {
                "downed"
            } else {
                "standing"
            }
        );
    }
    Ok(result)
}

fn names(actors: &[ActorConfig]) -> String {
    actors.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
}

fn run_scenario_inner(config: ScenarioConfig, spells: SpellDefinitions, logging: bool) -> Result<ScenarioResult, String> {
    // Generous cap over the time limit; the end check fires at max_duration
    let max_ticks = ((config.max_duration_secs / FIXED_TIMESTEP).ceil() as u64).saturating_add(120);
    let mut app = build_scenario_app(config, spells, logging);

    for _ in 0..max_ticks {
        app.update();
        if let Some(result) = app
            .world()
            .get_resource::<HeadlessScenarioState>()
            .and_then(|state| state.result.clone())
        {
            return Ok(result);
        }
    }

    Err(format!("Scenario did not finish within {} ticks", max_ticks))
}
