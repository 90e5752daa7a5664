//! Naive decision policy and file helpers shared by the CLI binaries.
//! The engine only resolves actions; choosing them happens here.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use combat_engine::api::EncounterConfig;
use combat_engine::{
    CombatAction, CombatEntity, CombatManager, CombatState, Dice, DiceNotation, EntityId, Side,
};
use encoding_rs::Encoding;

/// Reads UTF-8 or any BOM-marked encoding (files saved by Windows editors).
pub fn read_text_auto(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", path.display()))
    }
}

pub fn load_encounter(file: Option<&Path>, builtin: &str) -> Result<EncounterConfig> {
    match file {
        Some(path) => {
            let text = read_text_auto(path)?;
            EncounterConfig::from_json_str(&text)
                .with_context(|| format!("failed to load encounter: {}", path.display()))
        }
        None => EncounterConfig::builtin(builtin),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Policy {
    /// Player-side entities at or below this share of max health try to flee.
    pub flee_below_percent: Option<i32>,
}

/// Attack the first standing opponent in registration order; bystanders
/// and anyone without an opponent defend.
pub fn choose_action(
    combat: &CombatManager,
    attacks: &HashMap<EntityId, DiceNotation>,
    policy: Policy,
) -> Option<CombatAction> {
    let actor_id = combat.current_turn()?;
    let actor = combat.entity(actor_id)?;

    if let Some(threshold) = policy.flee_below_percent {
        let health = actor.health();
        if actor.side() == Side::Player && health.current() * 100 <= health.max() * threshold {
            return Some(CombatAction::flee(actor_id.clone()));
        }
    }

    let target = match actor.side() {
        Side::Neutral => None,
        side => combat
            .entities()
            .filter(|e| !e.is_defeated() && side.opposes(e.side()))
            .map(CombatEntity::id)
            .next(),
    };
    let action = match (target, attacks.get(actor_id)) {
        (Some(target), Some(dice)) => {
            CombatAction::attack(actor_id.clone(), target.clone(), *dice)
        }
        _ => CombatAction::defend(actor_id.clone()),
    };
    Some(action)
}

pub struct Outcome {
    pub combat: CombatManager,
    /// False when the round cap stopped an undecided encounter.
    pub finished: bool,
}

/// Plays the encounter to its end or until `max_rounds` have passed.
pub fn run(config: &EncounterConfig, seed: u64, max_rounds: u32, policy: Policy) -> Result<Outcome> {
    let attacks: HashMap<EntityId, DiceNotation> = config
        .participants
        .iter()
        .map(|p| (p.id.clone(), p.attack))
        .collect();
    let mut dice = Dice::from_seed(seed);
    let mut combat = CombatManager::new(config.rules.clone());
    combat
        .start_combat(config.build_entities()?, &mut dice)
        .with_context(|| format!("cannot start encounter '{}'", config.name))?;

    while combat.state() == CombatState::InProgress && combat.round() <= max_rounds {
        let Some(action) = choose_action(&combat, &attacks, policy) else {
            break;
        };
        combat.perform_action(&action, &mut dice)?;
    }
    let finished = combat.state().is_terminal();
    if !finished {
        tracing::warn!(encounter = %config.name, seed, max_rounds, "[AUTO] round cap reached");
    }
    Ok(Outcome { combat, finished })
}
