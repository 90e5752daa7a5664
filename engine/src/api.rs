//! Encounter descriptions loaded from JSON: who takes part, with which
//! stats, under which rules.

use std::fs;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::combat::{CombatEntity, EntityId, Role};
use crate::config::CombatRules;
use crate::content::builtin_encounters;
use crate::dice::DiceNotation;
use crate::resources::Resource;
use crate::stats::{AbilityScores, StatModifier, StatsAggregator};
use crate::status::StatusEffect;

fn default_level() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ParticipantSpec {
    pub id: EntityId,
    pub name: String,
    pub role: Role,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,
    #[serde(default)]
    pub statuses: Vec<StatusEffect>,
    /// Damage dice of the participant's basic attack.
    pub attack: DiceNotation,
    /// Starting health when the participant enters wounded.
    #[serde(default)]
    pub health: Option<i32>,
}

impl ParticipantSpec {
    pub fn build(&self) -> Result<CombatEntity> {
        let mut stats = StatsAggregator::new(self.abilities, self.level)
            .with_context(|| format!("invalid stats for participant '{}'", self.id))?;
        for modifier in &self.modifiers {
            stats
                .add_modifier(modifier.clone())
                .with_context(|| format!("invalid modifier for participant '{}'", self.id))?;
        }
        let mut entity = CombatEntity::new(self.id.clone(), self.name.clone(), self.role, stats);
        if let Some(health) = self.health {
            if health <= 0 {
                bail!("participant '{}' would start defeated", self.id);
            }
            entity = entity.with_current(Resource::Health, health);
        }
        for status in &self.statuses {
            entity.add_status(*status);
        }
        Ok(entity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EncounterConfig {
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub rules: CombatRules,
    pub participants: Vec<ParticipantSpec>,
}

impl EncounterConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).context("failed to parse encounter JSON")?;
        config.rules.validate()?;
        Ok(config)
    }

    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read encounter JSON: {}", path))?;
        Self::from_json_str(&text)
            .with_context(|| format!("failed to load encounter: {}", path))
    }

    pub fn builtin(id: &str) -> Result<Self> {
        let encounters = builtin_encounters();
        let text = encounters
            .get(id)
            .ok_or_else(|| anyhow!("unknown builtin encounter '{}'", id))?;
        Self::from_json_str(text).with_context(|| format!("builtin encounter '{}'", id))
    }

    /// Combat entities in registration order.
    pub fn build_entities(&self) -> Result<Vec<CombatEntity>> {
        self.participants.iter().map(ParticipantSpec::build).collect()
    }

    pub fn participant(&self, id: &EntityId) -> Option<&ParticipantSpec> {
        self.participants.iter().find(|p| &p.id == id)
    }
}
