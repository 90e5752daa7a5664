//! Character statistics.
//!
//! ```text
//! primary scores ─┐
//!                 ├─> effective primaries ─> derived formulas ─> effective derived
//! modifiers ──────┘                                              (modifiers again)
//! ```

pub mod aggregator;
pub mod attributes;
pub mod derived;
pub mod modifiers;

pub use aggregator::{LevelUp, Maxima, StatsAggregator, StatsError};
pub use attributes::{
    AbilityScores, Attribute, MAX_SCORE, MIN_SCORE, Stat, StatCategory, StatKind, ability_mod,
};
pub use derived::{DerivedStat, Formula, proficiency_bonus};
pub use modifiers::{
    AddOutcome, ModifierError, ModifierManager, ModifierScope, ModifierSource, SourceKind,
    StatModifier,
};
