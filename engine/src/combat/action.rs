use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use crate::dice::DiceNotation;
use crate::resources::Resource;
use crate::stats::StatModifier;
use crate::status::{StatusEffect, StatusKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Attack,
    Spell,
    Skill,
    Defend,
    Item,
    Flee,
    /// Reserved for content the engine does not resolve; always rejected.
    Other,
}

impl ActionKind {
    /// Kinds that resolve `effects` against their targets.
    pub fn uses_effects(self) -> bool {
        matches!(self, ActionKind::Spell | ActionKind::Skill | ActionKind::Item)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Attack => "attack",
            ActionKind::Spell => "spell",
            ActionKind::Skill => "skill",
            ActionKind::Defend => "defend",
            ActionKind::Item => "item",
            ActionKind::Flee => "flee",
            ActionKind::Other => "other",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCost {
    pub resource: Resource,
    pub amount: i32,
}

/// What a spell, skill or item does to each target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ActionEffect {
    /// Deals the action's dice roll, reduced by the target's mitigation.
    Damage,
    /// Restores the action's dice roll.
    Heal,
    ApplyStatus(StatusEffect),
    RemoveStatus(StatusKind),
    Modifier(StatModifier),
}

impl ActionEffect {
    pub fn needs_dice(&self) -> bool {
        matches!(self, ActionEffect::Damage | ActionEffect::Heal)
    }
}

/// A request to act, validated by `CombatManager::perform_action`.
///
/// ```
/// use combat_engine::{ActionKind, CombatAction, DiceNotation, Resource};
///
/// let bolt = CombatAction::new(ActionKind::Spell, "mage")
///     .targeting("goblin")
///     .costing(Resource::Mana, 5)
///     .with_dice("2d6".parse::<DiceNotation>().unwrap());
/// assert_eq!(bolt.targets().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatAction {
    kind: ActionKind,
    performer: EntityId,
    #[serde(default)]
    targets: Vec<EntityId>,
    #[serde(default)]
    cost: Option<ResourceCost>,
    #[serde(default)]
    dice: Option<DiceNotation>,
    #[serde(default)]
    effects: Vec<ActionEffect>,
}

impl CombatAction {
    pub fn new(kind: ActionKind, performer: impl Into<EntityId>) -> Self {
        Self {
            kind,
            performer: performer.into(),
            targets: Vec::new(),
            cost: None,
            dice: None,
            effects: Vec::new(),
        }
    }

    pub fn attack(
        performer: impl Into<EntityId>,
        target: impl Into<EntityId>,
        dice: DiceNotation,
    ) -> Self {
        Self::new(ActionKind::Attack, performer)
            .targeting(target)
            .with_dice(dice)
    }

    pub fn defend(performer: impl Into<EntityId>) -> Self {
        Self::new(ActionKind::Defend, performer)
    }

    pub fn flee(performer: impl Into<EntityId>) -> Self {
        Self::new(ActionKind::Flee, performer)
    }

    pub fn targeting(mut self, target: impl Into<EntityId>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn costing(mut self, resource: Resource, amount: i32) -> Self {
        self.cost = Some(ResourceCost { resource, amount });
        self
    }

    pub fn with_dice(mut self, dice: DiceNotation) -> Self {
        self.dice = Some(dice);
        self
    }

    pub fn with_effect(mut self, effect: ActionEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn performer(&self) -> &EntityId {
        &self.performer
    }

    pub fn targets(&self) -> &[EntityId] {
        &self.targets
    }

    pub fn cost(&self) -> Option<ResourceCost> {
        self.cost
    }

    pub fn dice(&self) -> Option<&DiceNotation> {
        self.dice.as_ref()
    }

    pub fn effects(&self) -> &[ActionEffect] {
        &self.effects
    }
}
