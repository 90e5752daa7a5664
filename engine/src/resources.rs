use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::stats::{DerivedStat, StatsAggregator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Health,
    Mana,
    Stamina,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Health, Resource::Mana, Resource::Stamina];

    /// Derived stat holding this resource's maximum.
    pub fn max_stat(self) -> DerivedStat {
        match self {
            Resource::Health => DerivedStat::MaxHealth,
            Resource::Mana => DerivedStat::MaxMana,
            Resource::Stamina => DerivedStat::MaxStamina,
        }
    }

    /// Smallest maximum a pool of this kind may have.
    fn floor(self) -> i32 {
        match self {
            Resource::Health => 1,
            Resource::Mana | Resource::Stamina => 0,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Health => "health",
            Resource::Mana => "mana",
            Resource::Stamina => "stamina",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{resource}: needs {needed} but only {available} available")]
pub struct InsufficientResource {
    pub resource: Resource,
    pub needed: i32,
    pub available: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pool value {current} outside 0..={max}")]
pub struct PoolOutOfRange {
    pub current: i32,
    pub max: i32,
}

/// A bounded resource: `0 <= current <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pool {
    current: i32,
    max: i32,
}

impl<'de> Deserialize<'de> for Pool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            current: i32,
            max: i32,
        }
        let raw = Raw::deserialize(deserializer)?;
        Pool::new(raw.current, raw.max).map_err(serde::de::Error::custom)
    }
}

impl Pool {
    pub fn full(max: i32) -> Self {
        let max = max.max(0);
        Self { current: max, max }
    }

    pub fn new(current: i32, max: i32) -> Result<Self, PoolOutOfRange> {
        if max < 0 || !(0..=max).contains(&current) {
            return Err(PoolOutOfRange { current, max });
        }
        Ok(Self { current, max })
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// Removes up to `amount`, returns how much was actually removed.
    pub fn drain(&mut self, amount: i32) -> i32 {
        let applied = amount.clamp(0, self.current);
        self.current -= applied;
        applied
    }

    /// Adds up to `amount` without passing `max`, returns how much was added.
    pub fn restore(&mut self, amount: i32) -> i32 {
        let applied = amount.clamp(0, self.max - self.current);
        self.current += applied;
        applied
    }

    pub fn set_current(&mut self, value: i32) {
        self.current = value.clamp(0, self.max);
    }

    /// New maximum, current clamped into it.
    pub fn clamp_to(&mut self, max: i32) {
        self.max = max.max(0);
        self.current = self.current.min(self.max);
    }

    /// New maximum keeping the fill ratio:
    /// `round(current / old_max * new_max)`, halves rounding up.
    pub fn rescale(&mut self, max: i32) {
        let max = max.max(0);
        self.current = if self.max == 0 {
            max
        } else {
            let scaled = (2 * i64::from(self.current) * i64::from(max) + i64::from(self.max))
                / (2 * i64::from(self.max));
            scaled.clamp(0, i64::from(max)) as i32
        };
        self.max = max;
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.max)
    }
}

/// Health, mana and stamina of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePools {
    pub health: Pool,
    pub mana: Pool,
    pub stamina: Pool,
}

impl ResourcePools {
    /// Every pool full at the maxima `stats` currently yields.
    pub fn from_stats(stats: &StatsAggregator) -> Self {
        Self {
            health: Pool::full(max_for(stats, Resource::Health)),
            mana: Pool::full(max_for(stats, Resource::Mana)),
            stamina: Pool::full(max_for(stats, Resource::Stamina)),
        }
    }

    pub fn get(&self, resource: Resource) -> &Pool {
        match resource {
            Resource::Health => &self.health,
            Resource::Mana => &self.mana,
            Resource::Stamina => &self.stamina,
        }
    }

    pub fn get_mut(&mut self, resource: Resource) -> &mut Pool {
        match resource {
            Resource::Health => &mut self.health,
            Resource::Mana => &mut self.mana,
            Resource::Stamina => &mut self.stamina,
        }
    }

    pub fn can_afford(&self, resource: Resource, amount: i32) -> Result<(), InsufficientResource> {
        let available = self.get(resource).current();
        if amount > available {
            return Err(InsufficientResource {
                resource,
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    /// All-or-nothing spend.
    pub fn spend(&mut self, resource: Resource, amount: i32) -> Result<(), InsufficientResource> {
        self.can_afford(resource, amount)?;
        self.get_mut(resource).drain(amount);
        Ok(())
    }

    /// Re-reads maxima from `stats`, clamping current values.
    pub fn clamp_to(&mut self, stats: &StatsAggregator) {
        for resource in Resource::ALL {
            self.get_mut(resource).clamp_to(max_for(stats, resource));
        }
    }

    /// First pool whose stored maximum differs from what `stats` yields,
    /// as `(resource, stored, expected)`.
    pub fn stale_max(&self, stats: &StatsAggregator) -> Option<(Resource, i32, i32)> {
        Resource::ALL.into_iter().find_map(|resource| {
            let stored = self.get(resource).max();
            let expected = max_for(stats, resource);
            (stored != expected).then_some((resource, stored, expected))
        })
    }

    /// Re-reads maxima from `stats`, keeping each pool's fill ratio.
    pub fn rescale_to(&mut self, stats: &StatsAggregator) {
        for resource in Resource::ALL {
            self.get_mut(resource).rescale(max_for(stats, resource));
        }
    }
}

fn max_for(stats: &StatsAggregator, resource: Resource) -> i32 {
    stats.get(resource.max_stat().into()).max(resource.floor())
}
