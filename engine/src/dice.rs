//! Dice notation parsing and rolling.
//!
//! Every random number in the engine comes from a [`Dice`] value handed in by
//! the caller, so a fixed seed (or a fixed script) replays the same encounter.

use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::AdMode;

/// The primary die for attacks, checks and initiative.
pub const D20: u32 = 20;
/// Percentile die used by flee attempts.
pub const D100: u32 = 100;

const MAX_DICE: u32 = 100;
const MAX_SIDES: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    #[error("empty dice notation")]
    Empty,
    #[error("missing 'd' in dice notation '{0}'")]
    MissingSeparator(String),
    #[error("invalid dice count '{0}'")]
    InvalidCount(String),
    #[error("invalid die sides '{0}'")]
    InvalidSides(String),
    #[error("invalid modifier '{0}'")]
    InvalidModifier(String),
    #[error("dice count must be between 1 and 100, got {0}")]
    CountOutOfRange(u32),
    #[error("die sides must be between 1 and 1000, got {0}")]
    SidesOutOfRange(u32),
}

/// Parsed `NdS±M` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceNotation {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceNotation {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Result<Self, DiceError> {
        if count == 0 || count > MAX_DICE {
            return Err(DiceError::CountOutOfRange(count));
        }
        if sides == 0 || sides > MAX_SIDES {
            return Err(DiceError::SidesOutOfRange(sides));
        }
        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    pub fn min(&self) -> i32 {
        self.count as i32 + self.modifier
    }

    pub fn max(&self) -> i32 {
        (self.count * self.sides) as i32 + self.modifier
    }

    /// Expected value, rounded down.
    pub fn average(&self) -> i32 {
        (self.count * (self.sides + 1)) as i32 / 2 + self.modifier
    }

    /// Same notation with the dice count doubled and the flat modifier untouched.
    pub fn doubled(&self) -> Self {
        Self {
            count: self.count * 2,
            ..*self
        }
    }
}

impl FromStr for DiceNotation {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if text.is_empty() {
            return Err(DiceError::Empty);
        }

        let (count_str, rest) = text
            .split_once('d')
            .ok_or_else(|| DiceError::MissingSeparator(text.clone()))?;

        // "d6" means "1d6"
        let count = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse::<u32>()
                .map_err(|_| DiceError::InvalidCount(count_str.to_string()))?
        };

        let (sides_str, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let (sides, modifier) = rest.split_at(pos);
                let modifier = modifier
                    .parse::<i32>()
                    .map_err(|_| DiceError::InvalidModifier(modifier.to_string()))?;
                (sides, modifier)
            }
            None => (rest, 0),
        };

        let sides = sides_str
            .parse::<u32>()
            .map_err(|_| DiceError::InvalidSides(sides_str.to_string()))?;

        Self::new(count, sides, modifier)
    }
}

impl TryFrom<String> for DiceNotation {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceNotation> for String {
    fn from(value: DiceNotation) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DiceNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.count, self.sides),
            m if m > 0 => write!(f, "{}d{}+{}", self.count, self.sides, m),
            m => write!(f, "{}d{}{}", self.count, self.sides, m),
        }
    }
}

/// Outcome of rolling a [`DiceNotation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    /// The notation actually rolled (doubled for critical rolls).
    pub notation: DiceNotation,
    pub rolls: Vec<u32>,
    pub total: i32,
}

impl RollResult {
    pub fn dice_sum(&self) -> i32 {
        self.rolls.iter().sum::<u32>() as i32
    }
}

/// Two rolls of the same die and the one that was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedRoll {
    pub kept: u32,
    pub rolls: [u32; 2],
}

/// A d20 roll under some [`AdMode`]; `raw` keeps every die thrown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    pub natural: u32,
    pub raw: Vec<u32>,
}

impl From<PairedRoll> for D20Roll {
    fn from(pair: PairedRoll) -> Self {
        Self {
            natural: pair.kept,
            raw: pair.rolls.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
enum Source {
    Seeded(ChaCha8Rng),
    Scripted { values: Vec<u32>, cursor: usize },
}

/// Injected random source for every roll the engine makes.
#[derive(Debug, Clone)]
pub struct Dice {
    source: Source,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: Source::Seeded(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Replays `values` in order, cycling when exhausted.
    ///
    /// A scripted value outside `1..=sides` is wrapped into range.
    ///
    /// # Panics
    /// If `values` is empty.
    pub fn from_scripted(values: Vec<u32>) -> Self {
        assert!(!values.is_empty(), "scripted dice need at least one value");
        Self {
            source: Source::Scripted { values, cursor: 0 },
        }
    }

    /// One roll of a die with `sides` faces.
    pub fn die(&mut self, sides: u32) -> u32 {
        let sides = sides.max(1);
        match &mut self.source {
            Source::Seeded(rng) => rng.gen_range(1..=sides),
            Source::Scripted { values, cursor } => {
                let raw = values[*cursor % values.len()];
                *cursor += 1;
                (raw.max(1) - 1) % sides + 1
            }
        }
    }

    pub fn d20(&mut self, mode: AdMode) -> D20Roll {
        match mode {
            AdMode::Normal => {
                let roll = self.die(D20);
                D20Roll {
                    natural: roll,
                    raw: vec![roll],
                }
            }
            AdMode::Advantage => self.roll_with_advantage(D20).into(),
            AdMode::Disadvantage => self.roll_with_disadvantage(D20).into(),
        }
    }

    pub fn roll_with_advantage(&mut self, sides: u32) -> PairedRoll {
        let a = self.die(sides);
        let b = self.die(sides);
        PairedRoll {
            kept: a.max(b),
            rolls: [a, b],
        }
    }

    pub fn roll_with_disadvantage(&mut self, sides: u32) -> PairedRoll {
        let a = self.die(sides);
        let b = self.die(sides);
        PairedRoll {
            kept: a.min(b),
            rolls: [a, b],
        }
    }

    pub fn percentile(&mut self) -> u32 {
        self.die(D100)
    }

    pub fn roll(&mut self, notation: &DiceNotation) -> RollResult {
        let rolls: Vec<u32> = (0..notation.count).map(|_| self.die(notation.sides)).collect();
        let total = rolls.iter().sum::<u32>() as i32 + notation.modifier;
        RollResult {
            notation: *notation,
            rolls,
            total,
        }
    }

    /// Parses then rolls, e.g. `dice.roll_str("2d6+3")`.
    pub fn roll_str(&mut self, notation: &str) -> Result<RollResult, DiceError> {
        let parsed: DiceNotation = notation.parse()?;
        Ok(self.roll(&parsed))
    }

    /// Critical damage: twice the dice, the flat modifier once.
    pub fn roll_critical(&mut self, notation: &DiceNotation) -> RollResult {
        self.roll(&notation.doubled())
    }
}

/// Natural maximum of the primary die, whatever the modifiers.
pub fn is_critical(natural: u32) -> bool {
    natural == D20
}

/// Natural minimum of the primary die, whatever the modifiers.
pub fn is_fumble(natural: u32) -> bool {
    natural == 1
}
