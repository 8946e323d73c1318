//! Integration tests for headless scenario execution
//!
//! These tests verify that:
//! - Scenarios run to victory, wipe or timeout
//! - Scenario results are accessible programmatically
//! - Seeded runs are deterministic
//! - The combat log is written when an output path is set

use std::path::Path;

use regex::Regex;
use tactsim::headless::{run_scenario, Outcome, ScenarioConfig};
use tactsim::sim::spell_config::{load_spell_definitions, SpellDefinitions, SpellId};

/// A guard and a leader against a single weak rat.
fn skirmish(seed: Option<u64>) -> ScenarioConfig {
    let mut config = ScenarioConfig::from_json(
        r#"{
            "party": [
                { "name": "Hero", "position": [0.0, 0.0], "health": 200 },
                {
                    "name": "Guard",
                    "position": [1.0, 0.0],
                    "health": 200,
                    "weapon": { "damage": 40, "range": 1.5, "speed": 2.0 }
                }
            ],
            "hostiles": [
                { "name": "Rat", "position": [3.0, 0.0], "health": 20 }
            ],
            "max_duration_secs": 30
        }"#,
    )
    .unwrap();
    config.random_seed = seed;
    config
}

#[test]
fn test_skirmish_ends_in_victory() {
    let result = run_scenario(skirmish(Some(1)), SpellDefinitions::default()).unwrap();

    assert_eq!(result.outcome, Outcome::Victory);
    assert!(result.elapsed < 30.0);
    assert_eq!(result.party.len(), 2);
    assert!(result.party.iter().all(|a| !a.downed && !a.dead));
    assert!(result.hostiles.iter().all(|a| a.dead));
    assert!(result.events_delivered > 0);
    assert_eq!(result.random_seed, Some(1));
}

#[test]
fn test_result_counts_final_tick_events() {
    let config = ScenarioConfig::from_json(
        r#"{
            "party": [
                {
                    "name": "Hero",
                    "position": [0.0, 0.0],
                    "weapon": { "damage": 500, "range": 1.5, "speed": 1.0 }
                },
                {
                    "name": "Guard",
                    "position": [0.0, 1.0],
                    "weapon": { "damage": 500, "range": 1.5, "speed": 1.0 }
                }
            ],
            "hostiles": [{ "name": "Rat", "position": [1.0, 0.0], "health": 5 }],
            "max_duration_secs": 10,
            "random_seed": 8
        }"#,
    )
    .unwrap();

    let result = run_scenario(config, SpellDefinitions::default()).unwrap();

    assert_eq!(result.outcome, Outcome::Victory);
    // At least the killing hit and the death
    assert!(result.events_delivered >= 2, "{}", result.events_delivered);
}

#[test]
fn test_lone_leader_is_wiped() {
    let config = ScenarioConfig::from_json(
        r#"{
            "party": [{ "name": "Hero", "position": [0.0, 0.0], "health": 10 }],
            "hostiles": [
                {
                    "name": "Ogre",
                    "position": [1.0, 0.0],
                    "health": 500,
                    "weapon": { "damage": 200, "range": 1.5, "speed": 1.0 }
                }
            ],
            "max_duration_secs": 30,
            "random_seed": 3
        }"#,
    )
    .unwrap();

    let result = run_scenario(config, SpellDefinitions::default()).unwrap();

    assert_eq!(result.outcome, Outcome::PartyWiped);
    assert!(result.party[0].downed);
    assert!(!result.party[0].dead, "party members go down, they don't die");
    assert_eq!(result.party[0].final_health, 0.0);
}

#[test]
fn test_quiet_scenario_times_out() {
    let config = ScenarioConfig::from_json(
        r#"{
            "party": [{ "name": "Hero", "position": [0.0, 0.0] }],
            "max_duration_secs": 2
        }"#,
    )
    .unwrap();

    let result = run_scenario(config, SpellDefinitions::default()).unwrap();

    assert_eq!(result.outcome, Outcome::Timeout);
    assert!(result.elapsed >= 2.0);
    assert!(result.elapsed < 2.5);
    assert!(result.hostiles.is_empty());
}

#[test]
fn test_seeded_runs_are_deterministic() {
    let first = run_scenario(skirmish(Some(99)), SpellDefinitions::default()).unwrap();
    let second = run_scenario(skirmish(Some(99)), SpellDefinitions::default()).unwrap();

    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first.elapsed, second.elapsed);
    assert_eq!(first.events_delivered, second.events_delivered);
    for (a, b) in first.party.iter().zip(second.party.iter()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.final_health, b.final_health);
        assert_eq!(a.position, b.position);
    }
}

#[test]
fn test_combat_log_is_saved() {
    let path = std::env::temp_dir().join(format!("tactsim_log_{}.txt", std::process::id()));
    let mut config = skirmish(Some(5));
    config.output_path = Some(path.to_string_lossy().into_owned());

    let result = run_scenario(config, SpellDefinitions::default()).unwrap();
    assert_eq!(result.outcome, Outcome::Victory);

    let contents = std::fs::read_to_string(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let line = Regex::new(r"^\[\s*\d+\.\d{2}\] .+$").unwrap();
    assert!(contents.lines().count() > 1);
    assert!(contents.lines().all(|l| line.is_match(l)), "{}", contents);
    assert!(contents.contains("Scenario started"));
    assert!(contents.contains("physical damage"));
    // The killing blow lands on the final tick and must still be logged
    assert!(contents.contains("was slain by"), "{}", contents);
}

#[test]
fn test_shipped_scenario_is_valid() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = ScenarioConfig::load_from_file(&root.join("scenarios/crypt_ambush.json")).unwrap();
    let spells = load_spell_definitions(&root.join("assets/config/spells.ron")).unwrap();

    assert!(config.level.is_some());
    assert!(!config.hostiles.is_empty());
    for actor in config.party.iter().chain(config.hostiles.iter()) {
        for spell in &actor.spells {
            assert!(
                spells.get(&SpellId::from(spell.as_str())).is_some(),
                "{} knows unknown spell {}",
                actor.name,
                spell
            );
        }
    }
}

#[test]
fn test_invalid_configs_are_rejected() {
    let negative_health = ScenarioConfig::from_json(
        r#"{ "party": [{ "name": "Hero", "position": [0.0, 0.0], "health": -5 }] }"#,
    );
    assert!(negative_health.is_err());

    let zero_duration = ScenarioConfig::from_json(
        r#"{ "party": [{ "name": "Hero", "position": [0.0, 0.0] }], "max_duration_secs": 0 }"#,
    );
    assert!(zero_duration.is_err());

    let not_json = ScenarioConfig::from_json("party: Hero");
    assert!(not_json.unwrap_err().contains("JSON"));
}
