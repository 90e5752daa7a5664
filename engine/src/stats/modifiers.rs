//! Time-scoped and permanent bonuses layered over base stat values.
//!
//! Stacking:
//! - same `(source kind, source id, target)` refreshes the existing modifier
//! - different sources stack additively
//! - percentages are summed, then applied once to the additive subtotal
//!
//! `effective = (base + Σflat) × (100 + Σpercent) / 100`, floored, with the
//! percentage multiplier never going below zero.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::attributes::StatKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Racial,
    Class,
    Equipment,
    Spell,
    Skill,
    Item,
    Status,
    Narrative,
    Other,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Racial => "racial",
            SourceKind::Class => "class",
            SourceKind::Equipment => "equipment",
            SourceKind::Spell => "spell",
            SourceKind::Skill => "skill",
            SourceKind::Item => "item",
            SourceKind::Status => "status",
            SourceKind::Narrative => "narrative",
            SourceKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModifierSource {
    pub kind: SourceKind,
    pub id: String,
}

impl ModifierSource {
    pub fn new(kind: SourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ModifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModifierScope {
    Permanent,
    /// Survives round ticks; cleared explicitly (e.g. by a rest).
    SemiPermanent,
    Temporary { rounds: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifier {
    pub target: StatKind,
    pub value: i32,
    #[serde(default)]
    pub is_percentage: bool,
    pub scope: ModifierScope,
    pub source: ModifierSource,
}

impl StatModifier {
    /// Permanent flat modifier; adjust with the builder methods below.
    pub fn flat(target: impl Into<StatKind>, value: i32, source: ModifierSource) -> Self {
        Self {
            target: target.into(),
            value,
            is_percentage: false,
            scope: ModifierScope::Permanent,
            source,
        }
    }

    /// Permanent percentage modifier (`20` means +20%).
    pub fn percent(target: impl Into<StatKind>, percent: i32, source: ModifierSource) -> Self {
        Self {
            is_percentage: true,
            ..Self::flat(target, percent, source)
        }
    }

    pub fn for_rounds(mut self, rounds: u32) -> Self {
        self.scope = ModifierScope::Temporary { rounds };
        self
    }

    pub fn semi_permanent(mut self) -> Self {
        self.scope = ModifierScope::SemiPermanent;
        self
    }

    pub fn remaining_rounds(&self) -> Option<u32> {
        match self.scope {
            ModifierScope::Temporary { rounds } => Some(rounds),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ModifierError> {
        match self.scope {
            ModifierScope::Temporary { rounds: 0 } => Err(ModifierError::ZeroDuration {
                target: self.target,
                origin: self.source.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn same_slot(&self, other: &StatModifier) -> bool {
        self.source == other.source && self.target == other.target
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModifierError {
    #[error("temporary modifier on {target} from {origin} must last at least one round")]
    ZeroDuration {
        target: StatKind,
        origin: ModifierSource,
    },
    #[error("two modifiers on {target} from {origin}")]
    DuplicateSlot {
        target: StatKind,
        origin: ModifierSource,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Same source and target already present; holds the replaced modifier.
    Refreshed(StatModifier),
}

/// Loading runs every entry through the same checks as [`ModifierManager::add`],
/// except that a repeated slot is an error rather than a refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StatModifier>", into = "Vec<StatModifier>")]
pub struct ModifierManager {
    modifiers: Vec<StatModifier>,
}

impl TryFrom<Vec<StatModifier>> for ModifierManager {
    type Error = ModifierError;

    fn try_from(modifiers: Vec<StatModifier>) -> Result<Self, Self::Error> {
        let mut manager = Self::new();
        for modifier in modifiers {
            if manager.modifiers.iter().any(|m| m.same_slot(&modifier)) {
                return Err(ModifierError::DuplicateSlot {
                    target: modifier.target,
                    origin: modifier.source,
                });
            }
            manager.add(modifier)?;
        }
        Ok(manager)
    }
}

impl From<ModifierManager> for Vec<StatModifier> {
    fn from(manager: ModifierManager) -> Self {
        manager.modifiers
    }
}

impl ModifierManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, modifier: StatModifier) -> Result<AddOutcome, ModifierError> {
        modifier.validate()?;
        match self.modifiers.iter_mut().find(|m| m.same_slot(&modifier)) {
            Some(existing) => {
                let previous = std::mem::replace(existing, modifier);
                Ok(AddOutcome::Refreshed(previous))
            }
            None => {
                self.modifiers.push(modifier);
                Ok(AddOutcome::Added)
            }
        }
    }

    pub fn additive_total(&self, stat: StatKind) -> i32 {
        saturate(self.sum(stat, false))
    }

    pub fn percent_total(&self, stat: StatKind) -> i32 {
        saturate(self.sum(stat, true))
    }

    fn sum(&self, stat: StatKind, percentage: bool) -> i64 {
        self.for_stat(stat)
            .filter(|m| m.is_percentage == percentage)
            .map(|m| i64::from(m.value))
            .sum()
    }

    /// Effective value of `stat` given its unmodified `base`.
    pub fn effective_value(&self, stat: StatKind, base: i32) -> i32 {
        let subtotal = i64::from(base) + self.sum(stat, false);
        let multiplier = (100 + self.sum(stat, true)).max(0);
        let value = subtotal.saturating_mul(multiplier).div_euclid(100);
        saturate(value)
    }

    /// Advance one round: temporary modifiers lose a round and those reaching
    /// zero are removed and returned.
    pub fn tick(&mut self) -> Vec<StatModifier> {
        for m in &mut self.modifiers {
            if let ModifierScope::Temporary { rounds } = &mut m.scope {
                *rounds = rounds.saturating_sub(1);
            }
        }
        self.take_where(|m| matches!(m.scope, ModifierScope::Temporary { rounds: 0 }))
    }

    pub fn remove_all_from_source(&mut self, kind: SourceKind, id: &str) -> Vec<StatModifier> {
        self.take_where(|m| m.source.kind == kind && m.source.id == id)
    }

    pub fn clear_semi_permanent(&mut self) -> Vec<StatModifier> {
        self.take_where(|m| m.scope == ModifierScope::SemiPermanent)
    }

    pub fn for_stat(&self, stat: StatKind) -> impl Iterator<Item = &StatModifier> {
        self.modifiers.iter().filter(move |m| m.target == stat)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatModifier> {
        self.modifiers.iter()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    fn take_where(&mut self, pred: impl Fn(&StatModifier) -> bool) -> Vec<StatModifier> {
        let (taken, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.modifiers).into_iter().partition(|m| pred(m));
        self.modifiers = kept;
        taken
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
