use serde::{Deserialize, Serialize};

use super::attributes::{AbilityScores, Attribute, StatKind};
use super::derived::DerivedStat;
use super::modifiers::{AddOutcome, ModifierError, ModifierManager, SourceKind, StatModifier};
use crate::resources::Resource;
use crate::{AdMode, CheckInput, CheckResult, Dice, check};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    #[error("{attribute} score {score} outside 1..=30")]
    ScoreOutOfRange { attribute: Attribute, score: i32 },
    #[error("level must be at least 1")]
    ZeroLevel,
    #[error("cannot level from {current} to {requested}")]
    LevelNotIncreasing { current: u32, requested: u32 },
}

/// Resource maxima at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maxima {
    pub health: i32,
    pub mana: i32,
    pub stamina: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub from: u32,
    pub to: u32,
    pub before: Maxima,
    pub after: Maxima,
}

/// Primary scores, level and modifiers of one character; every query is
/// recomputed from those three, nothing derived is cached.
///
/// Deserializing applies the same checks as [`StatsAggregator::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StatsRecord")]
pub struct StatsAggregator {
    scores: AbilityScores,
    level: u32,
    #[serde(default)]
    modifiers: ModifierManager,
}

#[derive(Deserialize)]
struct StatsRecord {
    scores: AbilityScores,
    level: u32,
    #[serde(default)]
    modifiers: ModifierManager,
}

impl TryFrom<StatsRecord> for StatsAggregator {
    type Error = StatsError;

    fn try_from(record: StatsRecord) -> Result<Self, Self::Error> {
        let mut stats = Self::new(record.scores, record.level)?;
        stats.modifiers = record.modifiers;
        Ok(stats)
    }
}

impl StatsAggregator {
    pub fn new(scores: AbilityScores, level: u32) -> Result<Self, StatsError> {
        if let Some((attribute, score)) = scores.out_of_range() {
            return Err(StatsError::ScoreOutOfRange { attribute, score });
        }
        if level == 0 {
            return Err(StatsError::ZeroLevel);
        }
        Ok(Self {
            scores,
            level,
            modifiers: ModifierManager::new(),
        })
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn scores(&self) -> &AbilityScores {
        &self.scores
    }

    pub fn modifiers(&self) -> &ModifierManager {
        &self.modifiers
    }

    /// Unmodified value: the authored score for primaries, the formula over
    /// effective primaries for derived stats.
    pub fn base(&self, stat: StatKind) -> i32 {
        match stat {
            StatKind::Primary(attribute) => self.scores.get(attribute),
            StatKind::Derived(derived) => derived.compute(&self.effective_scores(), self.level),
        }
    }

    pub fn get(&self, stat: StatKind) -> i32 {
        self.modifiers.effective_value(stat, self.base(stat))
    }

    pub fn attribute(&self, attribute: Attribute) -> i32 {
        self.get(StatKind::Primary(attribute))
    }

    pub fn derived(&self, derived: DerivedStat) -> i32 {
        self.get(StatKind::Derived(derived))
    }

    /// Primary scores with their modifiers applied.
    pub fn effective_scores(&self) -> AbilityScores {
        let mut effective = self.scores;
        for attribute in Attribute::ALL {
            let stat = StatKind::Primary(attribute);
            effective.set(
                attribute,
                self.modifiers
                    .effective_value(stat, self.scores.get(attribute)),
            );
        }
        effective
    }

    pub fn set_base(&mut self, attribute: Attribute, score: i32) -> Result<(), StatsError> {
        let next = self.scores.with(attribute, score);
        if let Some((attribute, score)) = next.out_of_range() {
            return Err(StatsError::ScoreOutOfRange { attribute, score });
        }
        self.scores = next;
        Ok(())
    }

    pub fn add_modifier(&mut self, modifier: StatModifier) -> Result<AddOutcome, ModifierError> {
        self.modifiers.add(modifier)
    }

    pub fn tick(&mut self) -> Vec<StatModifier> {
        self.modifiers.tick()
    }

    pub fn remove_all_from_source(&mut self, kind: SourceKind, id: &str) -> Vec<StatModifier> {
        self.modifiers.remove_all_from_source(kind, id)
    }

    pub fn clear_semi_permanent(&mut self) -> Vec<StatModifier> {
        self.modifiers.clear_semi_permanent()
    }

    pub fn max_of(&self, resource: Resource) -> i32 {
        self.derived(resource.max_stat())
    }

    pub fn maxima(&self) -> Maxima {
        Maxima {
            health: self.max_of(Resource::Health),
            mana: self.max_of(Resource::Mana),
            stamina: self.max_of(Resource::Stamina),
        }
    }

    /// Raises the level; callers holding current resource values rescale them
    /// from the returned maxima (see `ResourcePools::rescale_to`).
    pub fn level_up(&mut self, new_level: u32) -> Result<LevelUp, StatsError> {
        if new_level <= self.level {
            return Err(StatsError::LevelNotIncreasing {
                current: self.level,
                requested: new_level,
            });
        }
        let before = self.maxima();
        let from = self.level;
        self.level = new_level;
        tracing::debug!(from, to = new_level, "level up");
        Ok(LevelUp {
            from,
            to: new_level,
            before,
            after: self.maxima(),
        })
    }

    /// Attribute check: d20 + ability modifier of the effective score vs `dc`.
    pub fn check(&self, dice: &mut Dice, attribute: Attribute, dc: i32, mode: AdMode) -> CheckResult {
        let modifier = super::ability_mod(self.attribute(attribute));
        check(dice, CheckInput { dc, modifier, mode })
    }
}
