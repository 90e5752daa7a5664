use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Halves the damage of the next incoming attack after damage reduction
    /// is subtracted, never below the minimum damage. Any attack, hit or
    /// miss, uses it up. Spell, skill and item damage ignore it.
    Defending,
    Poisoned,
    Burning,
    Regenerating,
    /// Outgoing damage reduced by the magnitude.
    Weakened,
    /// Damage reduction raised by the magnitude.
    Shielded,
}

impl StatusKind {
    pub fn periodic(self, magnitude: i32) -> Option<Periodic> {
        let amount = magnitude.max(0);
        match self {
            StatusKind::Poisoned | StatusKind::Burning => Some(Periodic::Damage(amount)),
            StatusKind::Regenerating => Some(Periodic::Heal(amount)),
            StatusKind::Defending | StatusKind::Weakened | StatusKind::Shielded => None,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusKind::Defending => "defending",
            StatusKind::Poisoned => "poisoned",
            StatusKind::Burning => "burning",
            StatusKind::Regenerating => "regenerating",
            StatusKind::Weakened => "weakened",
            StatusKind::Shielded => "shielded",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Periodic {
    Damage(i32),
    Heal(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Rounds left; `None` lasts until removed or consumed.
    #[serde(default)]
    pub remaining: Option<u32>,
    #[serde(default)]
    pub magnitude: i32,
}

impl StatusEffect {
    pub fn new(kind: StatusKind) -> Self {
        Self {
            kind,
            remaining: None,
            magnitude: 0,
        }
    }

    pub fn defending() -> Self {
        Self::new(StatusKind::Defending)
    }

    pub fn for_rounds(mut self, rounds: u32) -> Self {
        self.remaining = Some(rounds);
        self
    }

    pub fn with_magnitude(mut self, magnitude: i32) -> Self {
        self.magnitude = magnitude;
        self
    }
}

/// What one end-of-round tick did to a status set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTick {
    pub periodic: Vec<(StatusKind, Periodic)>,
    pub expired: Vec<StatusKind>,
}

/// Active statuses, at most one per kind, kept in kind order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<StatusEffect>", into = "Vec<StatusEffect>")]
pub struct StatusSet {
    effects: Vec<StatusEffect>,
}

impl From<Vec<StatusEffect>> for StatusSet {
    fn from(effects: Vec<StatusEffect>) -> Self {
        let mut set = StatusSet::new();
        for effect in effects {
            set.insert(effect);
        }
        set
    }
}

impl From<StatusSet> for Vec<StatusEffect> {
    fn from(set: StatusSet) -> Self {
        set.effects
    }
}

impl StatusSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the effect of the same kind.
    pub fn insert(&mut self, effect: StatusEffect) -> Option<StatusEffect> {
        match self.effects.binary_search_by_key(&effect.kind, |e| e.kind) {
            Ok(idx) => Some(std::mem::replace(&mut self.effects[idx], effect)),
            Err(idx) => {
                self.effects.insert(idx, effect);
                None
            }
        }
    }

    pub fn remove(&mut self, kind: StatusKind) -> Option<StatusEffect> {
        let idx = self.effects.iter().position(|e| e.kind == kind)?;
        Some(self.effects.remove(idx))
    }

    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    pub fn contains(&self, kind: StatusKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn magnitude(&self, kind: StatusKind) -> i32 {
        self.get(kind).map_or(0, |e| e.magnitude)
    }

    pub fn kinds(&self) -> Vec<StatusKind> {
        self.effects.iter().map(|e| e.kind).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Collects periodic effects, then counts down durations and drops the
    /// effects that reach zero. Statuses without a duration are untouched.
    pub fn tick(&mut self) -> StatusTick {
        let periodic = self
            .effects
            .iter()
            .filter_map(|e| e.kind.periodic(e.magnitude).map(|p| (e.kind, p)))
            .collect();

        for effect in &mut self.effects {
            if let Some(rounds) = &mut effect.remaining {
                *rounds = rounds.saturating_sub(1);
            }
        }
        let mut expired = Vec::new();
        self.effects.retain(|e| {
            let done = e.remaining == Some(0);
            if done {
                expired.push(e.kind);
            }
            !done
        });

        StatusTick { periodic, expired }
    }
}
