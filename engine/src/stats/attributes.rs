use std::fmt;

use serde::{Deserialize, Serialize};

use super::derived::DerivedStat;

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 30;

/// Primary attributes. Author-set, never derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatCategory {
    Physical,
    Mental,
    Social,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Strength,
        Attribute::Dexterity,
        Attribute::Constitution,
        Attribute::Intelligence,
        Attribute::Wisdom,
        Attribute::Charisma,
    ];

    pub fn category(self) -> StatCategory {
        match self {
            Attribute::Strength | Attribute::Dexterity | Attribute::Constitution => {
                StatCategory::Physical
            }
            Attribute::Intelligence | Attribute::Wisdom => StatCategory::Mental,
            Attribute::Charisma => StatCategory::Social,
        }
    }

    pub fn abbrev(self) -> &'static str {
        match self {
            Attribute::Strength => "STR",
            Attribute::Dexterity => "DEX",
            Attribute::Constitution => "CON",
            Attribute::Intelligence => "INT",
            Attribute::Wisdom => "WIS",
            Attribute::Charisma => "CHA",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

/// A single primary stat as authored on a character sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub attribute: Attribute,
    pub base: i32,
}

impl Stat {
    pub fn category(&self) -> StatCategory {
        self.attribute.category()
    }
}

/// Ability modifier = floor((score - 10) / 2).
pub fn ability_mod(score: i32) -> i32 {
    // `div_euclid` with positive divisor matches mathematical floor division.
    score.saturating_sub(10).div_euclid(2)
}

/// Missing fields deserialize as 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::uniform(10)
    }
}

impl AbilityScores {
    pub fn uniform(score: i32) -> Self {
        Self {
            strength: score,
            dexterity: score,
            constitution: score,
            intelligence: score,
            wisdom: score,
            charisma: score,
        }
    }

    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Constitution => self.constitution,
            Attribute::Intelligence => self.intelligence,
            Attribute::Wisdom => self.wisdom,
            Attribute::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, attribute: Attribute, score: i32) {
        let slot = match attribute {
            Attribute::Strength => &mut self.strength,
            Attribute::Dexterity => &mut self.dexterity,
            Attribute::Constitution => &mut self.constitution,
            Attribute::Intelligence => &mut self.intelligence,
            Attribute::Wisdom => &mut self.wisdom,
            Attribute::Charisma => &mut self.charisma,
        };
        *slot = score;
    }

    pub fn with(mut self, attribute: Attribute, score: i32) -> Self {
        self.set(attribute, score);
        self
    }

    pub fn stat(&self, attribute: Attribute) -> Stat {
        Stat {
            attribute,
            base: self.get(attribute),
        }
    }

    pub fn mod_of(&self, attribute: Attribute) -> i32 {
        ability_mod(self.get(attribute))
    }

    /// First attribute outside `MIN_SCORE..=MAX_SCORE`, if any.
    pub fn out_of_range(&self) -> Option<(Attribute, i32)> {
        Attribute::ALL
            .into_iter()
            .map(|a| (a, self.get(a)))
            .find(|(_, score)| !(MIN_SCORE..=MAX_SCORE).contains(score))
    }
}

/// Anything a modifier can target or a caller can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Primary(Attribute),
    Derived(DerivedStat),
}

impl From<Attribute> for StatKind {
    fn from(value: Attribute) -> Self {
        StatKind::Primary(value)
    }
}

impl From<DerivedStat> for StatKind {
    fn from(value: DerivedStat) -> Self {
        StatKind::Derived(value)
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKind::Primary(a) => write!(f, "{a}"),
            StatKind::Derived(d) => write!(f, "{d}"),
        }
    }
}
