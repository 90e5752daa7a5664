//! Secondary attributes computed from primary scores and level.
//!
//! Every derived stat has exactly one [`Formula`]. Formulas are pure and total:
//! same scores and level, same result, for any `i32` score.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::attributes::{AbilityScores, Attribute, ability_mod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedStat {
    MaxHealth,
    MaxMana,
    MaxStamina,
    Initiative,
    AttackBonus,
    Defense,
    DamageReduction,
    CarryCapacity,
}

/// One row of the formula table.
pub struct Formula {
    pub inputs: &'static [Attribute],
    pub uses_level: bool,
    eval: fn(&AbilityScores, u32) -> i32,
}

impl Formula {
    pub fn eval(&self, scores: &AbilityScores, level: u32) -> i32 {
        (self.eval)(scores, level)
    }
}

/// Proficiency grows by one every four levels, starting at +2.
pub fn proficiency_bonus(level: u32) -> i32 {
    2 + (level.saturating_sub(1) / 4) as i32
}

fn level_i32(level: u32) -> i32 {
    level.min(i32::MAX as u32) as i32
}

const MAX_HEALTH: Formula = Formula {
    inputs: &[Attribute::Constitution],
    uses_level: true,
    eval: |s, level| {
        let per_level = (ability_mod(s.constitution) + 2).max(1);
        s.constitution
            .saturating_add(level_i32(level).saturating_mul(per_level))
    },
};

const MAX_MANA: Formula = Formula {
    inputs: &[Attribute::Intelligence, Attribute::Wisdom],
    uses_level: true,
    eval: |s, level| {
        s.intelligence
            .saturating_add(s.wisdom)
            .saturating_add(level_i32(level).saturating_mul(2))
    },
};

const MAX_STAMINA: Formula = Formula {
    inputs: &[Attribute::Strength, Attribute::Constitution],
    uses_level: true,
    eval: |s, level| {
        s.strength
            .saturating_add(s.constitution)
            .saturating_add(level_i32(level).saturating_mul(2))
    },
};

const INITIATIVE: Formula = Formula {
    inputs: &[Attribute::Dexterity],
    uses_level: false,
    eval: |s, _| ability_mod(s.dexterity),
};

const ATTACK_BONUS: Formula = Formula {
    inputs: &[Attribute::Strength],
    uses_level: true,
    eval: |s, level| ability_mod(s.strength) + proficiency_bonus(level),
};

const DEFENSE: Formula = Formula {
    inputs: &[Attribute::Dexterity],
    uses_level: false,
    eval: |s, _| 10 + ability_mod(s.dexterity),
};

const DAMAGE_REDUCTION: Formula = Formula {
    inputs: &[Attribute::Constitution],
    uses_level: false,
    eval: |s, _| ability_mod(s.constitution).max(0),
};

const CARRY_CAPACITY: Formula = Formula {
    inputs: &[Attribute::Strength],
    uses_level: false,
    eval: |s, _| s.strength.saturating_mul(15),
};

impl DerivedStat {
    pub const ALL: [DerivedStat; 8] = [
        DerivedStat::MaxHealth,
        DerivedStat::MaxMana,
        DerivedStat::MaxStamina,
        DerivedStat::Initiative,
        DerivedStat::AttackBonus,
        DerivedStat::Defense,
        DerivedStat::DamageReduction,
        DerivedStat::CarryCapacity,
    ];

    pub fn formula(self) -> &'static Formula {
        match self {
            DerivedStat::MaxHealth => &MAX_HEALTH,
            DerivedStat::MaxMana => &MAX_MANA,
            DerivedStat::MaxStamina => &MAX_STAMINA,
            DerivedStat::Initiative => &INITIATIVE,
            DerivedStat::AttackBonus => &ATTACK_BONUS,
            DerivedStat::Defense => &DEFENSE,
            DerivedStat::DamageReduction => &DAMAGE_REDUCTION,
            DerivedStat::CarryCapacity => &CARRY_CAPACITY,
        }
    }

    pub fn compute(self, scores: &AbilityScores, level: u32) -> i32 {
        self.formula().eval(scores, level)
    }

    pub fn name(self) -> &'static str {
        match self {
            DerivedStat::MaxHealth => "max_health",
            DerivedStat::MaxMana => "max_mana",
            DerivedStat::MaxStamina => "max_stamina",
            DerivedStat::Initiative => "initiative",
            DerivedStat::AttackBonus => "attack_bonus",
            DerivedStat::Defense => "defense",
            DerivedStat::DamageReduction => "damage_reduction",
            DerivedStat::CarryCapacity => "carry_capacity",
        }
    }
}

impl fmt::Display for DerivedStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
