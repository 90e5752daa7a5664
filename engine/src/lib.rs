pub mod api;
pub mod combat;
pub mod config;
pub mod content;
pub mod dice;
pub mod resources;
pub mod stats;
pub mod status;

use serde::{Deserialize, Serialize};

pub use combat::{
    ActionEffect, ActionError, ActionKind, ActionOutcome, CombatAction, CombatEntity, CombatEvent,
    CombatManager, CombatState, CombatSummary, EntityId, Role, Side,
};
pub use config::CombatRules;
pub use dice::{Dice, DiceError, DiceNotation, RollResult, is_critical, is_fumble};
pub use resources::{InsufficientResource, Pool, Resource, ResourcePools};
pub use stats::{
    AbilityScores, Attribute, DerivedStat, ModifierManager, ModifierScope, ModifierSource,
    SourceKind, StatKind, StatModifier, StatsAggregator, ability_mod,
};
pub use status::{StatusEffect, StatusKind};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdMode {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

/* ---------------- typed check API ---------------- */

#[derive(Debug, Clone, Copy)]
pub struct CheckInput {
    pub dc: i32,
    pub modifier: i32,
    pub mode: AdMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub roll: i32,
    pub raw: Vec<u32>,
    pub total: i32,
    pub dc: i32,
    pub passed: bool,
}

/// Roll a d20 (with advantage/disadvantage), add modifier, compare vs DC.
pub fn check(dice: &mut Dice, input: CheckInput) -> CheckResult {
    let d20 = dice.d20(input.mode);
    let roll = d20.natural as i32;
    let total = roll + input.modifier;
    CheckResult {
        roll,
        raw: d20.raw,
        total,
        dc: input.dc,
        passed: total >= input.dc,
    }
}
