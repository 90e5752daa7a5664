use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resources::{InsufficientResource, Pool, Resource, ResourcePools};
use crate::stats::{
    AddOutcome, Attribute, DerivedStat, LevelUp, ModifierError, StatKind, StatModifier,
    StatsAggregator, StatsError,
};
use crate::status::{Periodic, StatusEffect, StatusKind, StatusSet};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Player,
    Ally,
    Enemy,
    Npc,
    Creature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Opposing,
    /// Bystanders: never decide the outcome.
    Neutral,
}

impl Role {
    pub fn side(self) -> Side {
        match self {
            Role::Player | Role::Ally => Side::Player,
            Role::Enemy | Role::Creature => Side::Opposing,
            Role::Npc => Side::Neutral,
        }
    }
}

impl Side {
    /// Whether an entity on `self` counts `other` as an opponent.
    pub fn opposes(self, other: Side) -> bool {
        match (self, other) {
            (Side::Player, Side::Opposing) | (Side::Opposing, Side::Player) => true,
            (Side::Neutral, Side::Player | Side::Opposing) => true,
            _ => false,
        }
    }
}

/// Periodic effects and expirations produced by one end-of-round tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundTick {
    pub expired_modifiers: Vec<StatModifier>,
    pub periodic: Vec<PeriodicTick>,
    pub expired_statuses: Vec<StatusKind>,
}

/// A periodic effect as applied, with the holder's health right after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTick {
    pub kind: StatusKind,
    pub effect: Periodic,
    pub health: i32,
}

/// One participant's combat snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEntity {
    id: EntityId,
    name: String,
    role: Role,
    stats: StatsAggregator,
    pools: ResourcePools,
    #[serde(default)]
    statuses: StatusSet,
    #[serde(default)]
    initiative: i32,
}

impl CombatEntity {
    /// Resource pools start full at the maxima `stats` yields.
    pub fn new(
        id: impl Into<EntityId>,
        name: impl Into<String>,
        role: Role,
        stats: StatsAggregator,
    ) -> Self {
        let pools = ResourcePools::from_stats(&stats);
        Self {
            id: id.into(),
            name: name.into(),
            role,
            stats,
            pools,
            statuses: StatusSet::new(),
            initiative: 0,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn side(&self) -> Side {
        self.role.side()
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn stat(&self, stat: impl Into<StatKind>) -> i32 {
        self.stats.get(stat.into())
    }

    pub fn pools(&self) -> &ResourcePools {
        &self.pools
    }

    pub fn pool(&self, resource: Resource) -> &Pool {
        self.pools.get(resource)
    }

    pub fn health(&self) -> &Pool {
        &self.pools.health
    }

    pub fn mana(&self) -> &Pool {
        &self.pools.mana
    }

    pub fn stamina(&self) -> &Pool {
        &self.pools.stamina
    }

    pub fn statuses(&self) -> &StatusSet {
        &self.statuses
    }

    pub fn initiative(&self) -> i32 {
        self.initiative
    }

    pub(crate) fn set_initiative(&mut self, value: i32) {
        self.initiative = value;
    }

    pub fn is_defeated(&self) -> bool {
        self.pools.health.is_empty()
    }

    /// Sets a current value (e.g. a wounded character entering combat), clamped.
    pub fn with_current(mut self, resource: Resource, value: i32) -> Self {
        self.pools.get_mut(resource).set_current(value);
        self
    }

    /// Mitigation is the caller's job; returns the amount actually removed.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        self.pools.health.drain(amount)
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        self.pools.health.restore(amount)
    }

    pub fn can_afford(&self, resource: Resource, amount: i32) -> Result<(), InsufficientResource> {
        self.pools.can_afford(resource, amount)
    }

    pub fn spend(&mut self, resource: Resource, amount: i32) -> Result<(), InsufficientResource> {
        self.pools.spend(resource, amount)
    }

    pub fn add_status(&mut self, effect: StatusEffect) -> Option<StatusEffect> {
        self.statuses.insert(effect)
    }

    pub fn remove_status(&mut self, kind: StatusKind) -> Option<StatusEffect> {
        self.statuses.remove(kind)
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.statuses.contains(kind)
    }

    /// Damage reduction including a Shielded bonus.
    pub fn damage_reduction(&self) -> i32 {
        self.stat(DerivedStat::DamageReduction)
            .saturating_add(self.statuses.magnitude(StatusKind::Shielded))
    }

    /// Stat the flee roll compares against opponents.
    pub fn agility(&self) -> i32 {
        self.stat(Attribute::Dexterity)
    }

    pub fn add_modifier(&mut self, modifier: StatModifier) -> Result<AddOutcome, ModifierError> {
        let outcome = self.stats.add_modifier(modifier)?;
        self.refresh_maxima();
        Ok(outcome)
    }

    /// Raises the level and rescales every pool to keep its fill ratio.
    pub fn level_up(&mut self, new_level: u32) -> Result<LevelUp, StatsError> {
        let change = self.stats.level_up(new_level)?;
        self.pools.rescale_to(&self.stats);
        Ok(change)
    }

    /// Re-reads maxima after modifiers changed; current values are clamped.
    pub fn refresh_maxima(&mut self) {
        self.pools.clamp_to(&self.stats);
    }

    /// End-of-round bookkeeping: modifier durations, periodic statuses,
    /// status durations. Defeated entities only age their modifiers.
    pub fn tick_round(&mut self) -> RoundTick {
        let expired_modifiers = self.stats.tick();
        self.refresh_maxima();

        if self.is_defeated() {
            return RoundTick {
                expired_modifiers,
                ..RoundTick::default()
            };
        }

        let tick = self.statuses.tick();
        let mut periodic = Vec::with_capacity(tick.periodic.len());
        for (kind, effect) in tick.periodic {
            let applied = match effect {
                Periodic::Damage(amount) => Periodic::Damage(self.apply_damage(amount)),
                Periodic::Heal(amount) => Periodic::Heal(self.heal(amount)),
            };
            periodic.push(PeriodicTick {
                kind,
                effect: applied,
                health: self.health().current(),
            });
        }

        RoundTick {
            expired_modifiers,
            periodic,
            expired_statuses: tick.expired,
        }
    }
}
