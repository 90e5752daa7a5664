use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::action::{ActionEffect, ActionKind, CombatAction};
use super::entity::{CombatEntity, EntityId, Side};
use super::error::{ActionError, InvalidTarget, StartError, TargetProblem, ValidationError};
use super::log::{AttackOutcome, CombatEvent, CombatLog, LogEntry};
use super::snapshot::{CombatSnapshot, CombatSummary};
use crate::config::CombatRules;
use crate::dice::{Dice, DiceNotation, RollResult, is_critical, is_fumble};
use crate::resources::Resource;
use crate::stats::{Attribute, DerivedStat};
use crate::status::{Periodic, StatusEffect, StatusKind};
use crate::AdMode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatState {
    #[default]
    NotStarted,
    InProgress,
    PlayerVictory,
    PlayerDefeat,
    Fled,
}

impl CombatState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CombatState::PlayerVictory | CombatState::PlayerDefeat | CombatState::Fled
        )
    }
}

impl fmt::Display for CombatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CombatState::NotStarted => "NOT_STARTED",
            CombatState::InProgress => "IN_PROGRESS",
            CombatState::PlayerVictory => "PLAYER_VICTORY",
            CombatState::PlayerDefeat => "PLAYER_DEFEAT",
            CombatState::Fled => "FLED",
        })
    }
}

/// What one accepted action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    /// Log events appended while resolving, including turn and round changes.
    pub events: Vec<CombatEvent>,
    pub state: CombatState,
}

impl ActionOutcome {
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }
}

/// Turn-based encounter state machine.
///
/// ```text
/// NOT_STARTED ─start_combat─> IN_PROGRESS ─┬─> PLAYER_VICTORY
///                                          ├─> PLAYER_DEFEAT
///                                          └─> FLED
/// ```
///
/// Randomness always comes from the `Dice` passed to each call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "CombatSnapshot", try_from = "CombatSnapshot")]
pub struct CombatManager {
    pub(super) entities: IndexMap<EntityId, CombatEntity>,
    pub(super) turn_order: Vec<EntityId>,
    pub(super) current_turn: usize,
    pub(super) round: u32,
    pub(super) state: CombatState,
    pub(super) log: CombatLog,
    pub(super) rules: CombatRules,
}

struct InitiativeRoll {
    index: usize,
    total: i32,
    dexterity: i32,
    tie_break: u32,
}

impl CombatManager {
    pub fn new(rules: CombatRules) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn rules(&self) -> &CombatRules {
        &self.rules
    }

    pub fn turn_order(&self) -> &[EntityId] {
        &self.turn_order
    }

    pub fn current_turn_index(&self) -> usize {
        self.current_turn
    }

    /// Whose turn it is; `None` unless the encounter is in progress.
    pub fn current_turn(&self) -> Option<&EntityId> {
        if self.state != CombatState::InProgress {
            return None;
        }
        self.turn_order.get(self.current_turn)
    }

    pub fn entity(&self, id: &EntityId) -> Option<&CombatEntity> {
        self.entities.get(id)
    }

    /// Entities in registration order.
    pub fn entities(&self) -> impl Iterator<Item = &CombatEntity> {
        self.entities.values()
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    /// Hands the participants back, e.g. once the encounter is over.
    pub fn into_entities(self) -> Vec<CombatEntity> {
        self.entities.into_values().collect()
    }

    pub fn get_summary(&self) -> CombatSummary {
        CombatSummary::of(self)
    }

    /// Registers `entities`, rolls initiative and opens round 1.
    ///
    /// Each participant rolls d20 + its initiative stat. Ties on the total go
    /// to the higher effective Dexterity, then to an extra d20 rolled only by
    /// the entities still tied (in registration order), then to registration
    /// order.
    pub fn start_combat(
        &mut self,
        entities: Vec<CombatEntity>,
        dice: &mut Dice,
    ) -> Result<(), StartError> {
        if self.state != CombatState::NotStarted {
            return Err(StartError::AlreadyStarted);
        }
        if entities.is_empty() {
            return Err(StartError::Empty);
        }
        let mut registered: IndexMap<EntityId, CombatEntity> = IndexMap::new();
        for entity in entities {
            if entity.is_defeated() {
                return Err(StartError::DefeatedParticipant(entity.id().clone()));
            }
            if registered.contains_key(entity.id()) {
                return Err(StartError::DuplicateEntity(entity.id().clone()));
            }
            registered.insert(entity.id().clone(), entity);
        }
        let has_side = |side: Side| registered.values().any(|e| e.side() == side);
        if !has_side(Side::Player) || !has_side(Side::Opposing) {
            return Err(StartError::MissingSide);
        }

        self.entities = registered;
        self.round = 1;

        let mut rolls = Vec::with_capacity(self.entities.len());
        for (index, entity) in self.entities.values_mut().enumerate() {
            let natural = dice.d20(AdMode::Normal).natural;
            let bonus = entity.stat(DerivedStat::Initiative);
            let total = bonus.saturating_add(natural as i32);
            entity.set_initiative(total);
            self.log.push(
                1,
                CombatEvent::Initiative {
                    entity: entity.id().clone(),
                    roll: natural,
                    bonus,
                    total,
                },
            );
            rolls.push(InitiativeRoll {
                index,
                total,
                dexterity: entity.stat(Attribute::Dexterity),
                tie_break: 0,
            });
        }

        for i in 0..rolls.len() {
            let tied = rolls
                .iter()
                .any(|r| r.index != i && (r.total, r.dexterity) == (rolls[i].total, rolls[i].dexterity));
            if tied {
                let roll = dice.d20(AdMode::Normal).natural;
                rolls[i].tie_break = roll;
                if let Some((id, _)) = self.entities.get_index(i) {
                    self.log.push(
                        1,
                        CombatEvent::TieBreak {
                            entity: id.clone(),
                            roll,
                        },
                    );
                }
            }
        }

        rolls.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then(b.dexterity.cmp(&a.dexterity))
                .then(b.tie_break.cmp(&a.tie_break))
                .then(a.index.cmp(&b.index))
        });
        self.turn_order = rolls
            .iter()
            .filter_map(|r| self.entities.get_index(r.index).map(|(id, _)| id.clone()))
            .collect();
        self.current_turn = 0;
        self.state = CombatState::InProgress;
        self.log.push(
            1,
            CombatEvent::Started {
                order: self.turn_order.clone(),
            },
        );
        Ok(())
    }

    /// Validates then resolves `action`. A rejected action leaves the
    /// encounter exactly as it was, log included.
    pub fn perform_action(
        &mut self,
        action: &CombatAction,
        dice: &mut Dice,
    ) -> Result<ActionOutcome, ActionError> {
        let targets = match self.validate(action) {
            Ok(targets) => targets,
            Err(err) => {
                tracing::warn!(performer = %action.performer(), kind = %action.kind(), "rejected: {err}");
                return Err(err);
            }
        };
        let first_event = self.log.len();
        let performer = action.performer().clone();

        self.record(CombatEvent::Action {
            entity: performer.clone(),
            kind: action.kind(),
        });
        if let Some(cost) = action.cost().filter(|c| c.amount > 0) {
            let entity = self.entity_mut(&performer);
            if entity.spend(cost.resource, cost.amount).is_ok() {
                let remaining = entity.pool(cost.resource).current();
                self.record(CombatEvent::ResourceSpent {
                    entity: performer.clone(),
                    resource: cost.resource,
                    amount: cost.amount,
                    remaining,
                });
            }
        }

        match action.kind() {
            ActionKind::Attack => {
                if let Some(notation) = action.dice() {
                    for target in &targets {
                        self.resolve_attack(&performer, target, notation, dice);
                    }
                }
            }
            ActionKind::Spell | ActionKind::Skill | ActionKind::Item => {
                self.resolve_effects(action, &targets, dice);
            }
            ActionKind::Defend => {
                let effect = StatusEffect::defending();
                self.entity_mut(&performer).add_status(effect);
                self.record(CombatEvent::StatusApplied {
                    entity: performer.clone(),
                    effect,
                });
            }
            ActionKind::Flee => self.resolve_flee(&performer, dice),
            ActionKind::Other => {}
        }
        debug_assert!(
            self.entities.values().all(|e| Resource::ALL.iter().all(|r| {
                let pool = e.pool(*r);
                (0..=pool.max()).contains(&pool.current())
            })),
            "resource pool escaped its clamp"
        );

        self.check_termination();
        if self.state == CombatState::InProgress {
            self.advance_turn();
        }

        let events = self.log.entries()[first_event..]
            .iter()
            .map(|e| e.event.clone())
            .collect();
        Ok(ActionOutcome {
            kind: action.kind(),
            events,
            state: self.state,
        })
    }

    fn validate(&self, action: &CombatAction) -> Result<Vec<EntityId>, ActionError> {
        match self.state {
            CombatState::NotStarted => return Err(ValidationError::NotStarted.into()),
            CombatState::InProgress => {}
            terminal => return Err(ActionError::CombatOver(terminal)),
        }
        let performer_id = action.performer();
        let performer = self
            .entities
            .get(performer_id)
            .ok_or_else(|| ValidationError::UnknownPerformer(performer_id.clone()))?;
        if let Some(current) = self.turn_order.get(self.current_turn) {
            if current != performer_id {
                return Err(ValidationError::NotYourTurn {
                    performer: performer_id.clone(),
                    current: current.clone(),
                }
                .into());
            }
        }
        if performer.is_defeated() {
            return Err(ValidationError::PerformerDefeated(performer_id.clone()).into());
        }

        let kind = action.kind();
        let targets: Vec<EntityId> = match kind {
            ActionKind::Other => return Err(ValidationError::UnsupportedAction(kind).into()),
            ActionKind::Attack if action.targets().is_empty() => {
                return Err(ValidationError::NoTargets(kind).into());
            }
            ActionKind::Attack => action.targets().to_vec(),
            _ if kind.uses_effects() && action.targets().is_empty() => vec![performer_id.clone()],
            _ if kind.uses_effects() => action.targets().to_vec(),
            // defend and flee act on the performer only
            _ => Vec::new(),
        };
        for target in &targets {
            let reason = match self.entities.get(target) {
                None => Some(TargetProblem::Missing),
                Some(entity) if entity.is_defeated() => Some(TargetProblem::Defeated),
                Some(_) => None,
            };
            if let Some(reason) = reason {
                return Err(InvalidTarget {
                    target: target.clone(),
                    reason,
                }
                .into());
            }
        }

        let needs_dice = match kind {
            ActionKind::Attack => true,
            _ if kind.uses_effects() => {
                action.effects().is_empty() || action.effects().iter().any(ActionEffect::needs_dice)
            }
            _ => false,
        };
        if needs_dice && action.dice().is_none() {
            return Err(ValidationError::MissingDice(kind).into());
        }
        if kind.uses_effects() {
            for effect in action.effects() {
                if let ActionEffect::Modifier(modifier) = effect {
                    modifier.validate().map_err(ValidationError::from)?;
                }
            }
        }

        if let Some(cost) = action.cost() {
            if cost.amount < 0 {
                return Err(ValidationError::NegativeCost(cost.amount).into());
            }
            performer.can_afford(cost.resource, cost.amount)?;
            // a health cost may wound but never drop the performer
            if cost.resource == Resource::Health
                && cost.amount > 0
                && cost.amount >= performer.health().current()
            {
                return Err(ValidationError::LethalCost {
                    performer: performer_id.clone(),
                    cost: cost.amount,
                }
                .into());
            }
        }
        Ok(targets)
    }

    fn resolve_attack(
        &mut self,
        attacker_id: &EntityId,
        target_id: &EntityId,
        notation: &DiceNotation,
        dice: &mut Dice,
    ) {
        if self.entity_ref(target_id).is_defeated() {
            return;
        }
        let attacker = self.entity_ref(attacker_id);
        let bonus = attacker.stat(DerivedStat::AttackBonus);
        let weakness = attacker.statuses().magnitude(StatusKind::Weakened);
        let target = self.entity_ref(target_id);
        let defense = target.stat(DerivedStat::Defense);
        let reduction = target.damage_reduction();
        let defending = target.has_status(StatusKind::Defending);

        let natural = dice.d20(AdMode::Normal).natural;
        let total = bonus.saturating_add(natural as i32);
        let outcome = if is_fumble(natural) {
            AttackOutcome::Fumble
        } else if is_critical(natural) {
            AttackOutcome::Critical
        } else if total >= defense {
            AttackOutcome::Hit
        } else {
            AttackOutcome::Miss
        };
        self.record(CombatEvent::Attack {
            attacker: attacker_id.clone(),
            target: target_id.clone(),
            natural,
            bonus,
            total,
            defense,
            outcome,
        });

        if outcome.is_hit() {
            let roll = if outcome == AttackOutcome::Critical {
                dice.roll_critical(notation)
            } else {
                dice.roll(notation)
            };
            let mut dealt = self.mitigate(roll.total, weakness, reduction);
            if defending {
                dealt = (dealt / 2).max(self.rules.min_damage);
            }
            self.deal_damage(target_id, &roll, dealt);
        }

        if defending {
            self.entity_mut(target_id).remove_status(StatusKind::Defending);
            self.record(CombatEvent::StatusConsumed {
                entity: target_id.clone(),
                kind: StatusKind::Defending,
            });
        }
    }

    fn resolve_effects(&mut self, action: &CombatAction, targets: &[EntityId], dice: &mut Dice) {
        let roll = action.dice().map(|notation| dice.roll(notation));
        let implicit = [ActionEffect::Damage];
        let effects = if action.effects().is_empty() {
            &implicit[..]
        } else {
            action.effects()
        };
        let performer = self.entity_ref(action.performer());
        let weakness = performer.statuses().magnitude(StatusKind::Weakened);

        for target_id in targets {
            for effect in effects {
                if self.entity_ref(target_id).is_defeated() {
                    break;
                }
                match (effect, &roll) {
                    (ActionEffect::Damage, Some(roll)) => {
                        let reduction = self.entity_ref(target_id).damage_reduction();
                        let dealt = self.mitigate(roll.total, weakness, reduction);
                        self.deal_damage(target_id, roll, dealt);
                    }
                    (ActionEffect::Heal, Some(roll)) => {
                        let entity = self.entity_mut(target_id);
                        let amount = entity.heal(roll.total);
                        let health = entity.health().current();
                        self.record(CombatEvent::Heal {
                            target: target_id.clone(),
                            rolls: roll.rolls.clone(),
                            amount,
                            health,
                        });
                    }
                    (ActionEffect::Damage | ActionEffect::Heal, None) => {}
                    (ActionEffect::ApplyStatus(effect), _) => {
                        self.entity_mut(target_id).add_status(*effect);
                        self.record(CombatEvent::StatusApplied {
                            entity: target_id.clone(),
                            effect: *effect,
                        });
                    }
                    (ActionEffect::RemoveStatus(kind), _) => {
                        if self.entity_mut(target_id).remove_status(*kind).is_some() {
                            self.record(CombatEvent::StatusRemoved {
                                entity: target_id.clone(),
                                kind: *kind,
                            });
                        }
                    }
                    (ActionEffect::Modifier(modifier), _) => {
                        if self.entity_mut(target_id).add_modifier(modifier.clone()).is_ok() {
                            self.record(CombatEvent::ModifierGranted {
                                entity: target_id.clone(),
                                modifier: modifier.clone(),
                            });
                        }
                    }
                }
            }
        }
    }

    fn resolve_flee(&mut self, performer_id: &EntityId, dice: &mut Dice) {
        let performer = self.entity_ref(performer_id);
        let side = performer.side();
        let own = performer.agility();
        let (sum, count) = self
            .entities
            .values()
            .filter(|e| !e.is_defeated() && side.opposes(e.side()))
            .fold((0i64, 0usize), |(sum, count), e| {
                (sum + i64::from(e.agility()), count + 1)
            });
        let chance = self.rules.flee_chance(own, sum, count);
        let roll = dice.percentile();
        let escaped = roll as i32 <= chance;
        self.record(CombatEvent::Flee {
            entity: performer_id.clone(),
            chance,
            roll,
            escaped,
        });
        if escaped {
            self.finish(CombatState::Fled);
        }
    }

    /// Flat mitigation, floored at the configured minimum.
    fn mitigate(&self, raw: i32, weakness: i32, reduction: i32) -> i32 {
        raw.saturating_sub(weakness.max(0))
            .saturating_sub(reduction.max(0))
            .max(self.rules.min_damage)
    }

    fn deal_damage(&mut self, target_id: &EntityId, roll: &RollResult, amount: i32) {
        let entity = self.entity_mut(target_id);
        let dealt = entity.apply_damage(amount);
        let health = entity.health().current();
        let defeated = entity.is_defeated();
        self.record(CombatEvent::Damage {
            target: target_id.clone(),
            rolls: roll.rolls.clone(),
            raw: roll.total,
            dealt,
            health,
        });
        if defeated {
            self.record(CombatEvent::Defeated {
                entity: target_id.clone(),
            });
        }
    }

    /// Ends the encounter once a side has no one left standing.
    fn check_termination(&mut self) {
        if self.state != CombatState::InProgress {
            return;
        }
        let standing = |side: Side| {
            self.entities
                .values()
                .any(|e| e.side() == side && !e.is_defeated())
        };
        if !standing(Side::Opposing) {
            self.finish(CombatState::PlayerVictory);
        } else if !standing(Side::Player) {
            self.finish(CombatState::PlayerDefeat);
        }
    }

    fn finish(&mut self, state: CombatState) {
        self.state = state;
        self.record(CombatEvent::Ended { state });
    }

    /// Moves to the next living entity; passing the end of the order closes
    /// the round.
    fn advance_turn(&mut self) {
        let len = self.turn_order.len();
        for _ in 0..len {
            self.current_turn += 1;
            if self.current_turn >= len {
                self.current_turn = 0;
                self.end_round();
                if self.state.is_terminal() {
                    return;
                }
            }
            if !self.entity_ref(&self.turn_order[self.current_turn]).is_defeated() {
                return;
            }
        }
    }

    fn end_round(&mut self) {
        for id in self.turn_order.clone() {
            let entity = self.entity_mut(&id);
            let was_defeated = entity.is_defeated();
            let tick = entity.tick_round();
            let now_defeated = entity.is_defeated();

            for modifier in tick.expired_modifiers {
                self.record(CombatEvent::ModifierExpired {
                    entity: id.clone(),
                    modifier,
                });
            }
            for applied in tick.periodic {
                let event = match applied.effect {
                    Periodic::Damage(amount) => CombatEvent::PeriodicDamage {
                        entity: id.clone(),
                        kind: applied.kind,
                        amount,
                        health: applied.health,
                    },
                    Periodic::Heal(amount) => CombatEvent::PeriodicHeal {
                        entity: id.clone(),
                        kind: applied.kind,
                        amount,
                        health: applied.health,
                    },
                };
                self.record(event);
            }
            for kind in tick.expired_statuses {
                self.record(CombatEvent::StatusExpired {
                    entity: id.clone(),
                    kind,
                });
            }
            if now_defeated && !was_defeated {
                self.record(CombatEvent::Defeated { entity: id.clone() });
            }
        }

        self.check_termination();
        if self.state == CombatState::InProgress {
            self.round += 1;
            self.record(CombatEvent::RoundStarted { round: self.round });
        }
    }

    fn record(&mut self, event: CombatEvent) {
        self.log.push(self.round, event);
    }

    pub(super) fn recent_log(&self) -> &[LogEntry] {
        self.log.recent(self.rules.recent_log_len)
    }

    // Ids reaching these come from the turn order or validated targets.
    fn entity_ref(&self, id: &EntityId) -> &CombatEntity {
        &self.entities[id]
    }

    fn entity_mut(&mut self, id: &EntityId) -> &mut CombatEntity {
        &mut self.entities[id]
    }
}
