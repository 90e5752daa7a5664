use std::fmt;

use serde::{Deserialize, Serialize};

use super::action::ActionKind;
use super::entity::EntityId;
use super::manager::CombatState;
use crate::resources::Resource;
use crate::stats::StatModifier;
use crate::status::{StatusEffect, StatusKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackOutcome {
    Hit,
    Critical,
    Miss,
    Fumble,
}

impl AttackOutcome {
    pub fn is_hit(self) -> bool {
        matches!(self, AttackOutcome::Hit | AttackOutcome::Critical)
    }
}

impl fmt::Display for AttackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttackOutcome::Hit => "HIT",
            AttackOutcome::Critical => "CRIT",
            AttackOutcome::Miss => "MISS",
            AttackOutcome::Fumble => "FUMBLE",
        })
    }
}

/// Everything the manager records; one variant per kind of log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CombatEvent {
    Initiative {
        entity: EntityId,
        roll: u32,
        bonus: i32,
        total: i32,
    },
    TieBreak {
        entity: EntityId,
        roll: u32,
    },
    Started {
        order: Vec<EntityId>,
    },
    Action {
        entity: EntityId,
        kind: ActionKind,
    },
    ResourceSpent {
        entity: EntityId,
        resource: Resource,
        amount: i32,
        remaining: i32,
    },
    Attack {
        attacker: EntityId,
        target: EntityId,
        natural: u32,
        bonus: i32,
        total: i32,
        defense: i32,
        outcome: AttackOutcome,
    },
    Damage {
        target: EntityId,
        rolls: Vec<u32>,
        raw: i32,
        dealt: i32,
        health: i32,
    },
    Heal {
        target: EntityId,
        rolls: Vec<u32>,
        amount: i32,
        health: i32,
    },
    StatusApplied {
        entity: EntityId,
        effect: StatusEffect,
    },
    StatusConsumed {
        entity: EntityId,
        kind: StatusKind,
    },
    StatusRemoved {
        entity: EntityId,
        kind: StatusKind,
    },
    StatusExpired {
        entity: EntityId,
        kind: StatusKind,
    },
    PeriodicDamage {
        entity: EntityId,
        kind: StatusKind,
        amount: i32,
        health: i32,
    },
    PeriodicHeal {
        entity: EntityId,
        kind: StatusKind,
        amount: i32,
        health: i32,
    },
    ModifierGranted {
        entity: EntityId,
        modifier: StatModifier,
    },
    ModifierExpired {
        entity: EntityId,
        modifier: StatModifier,
    },
    Defeated {
        entity: EntityId,
    },
    Flee {
        entity: EntityId,
        chance: i32,
        roll: u32,
        escaped: bool,
    },
    RoundStarted {
        round: u32,
    },
    Ended {
        state: CombatState,
    },
}

fn signed(value: i32) -> String {
    if value < 0 {
        format!("-{}", value.unsigned_abs())
    } else {
        format!("+{value}")
    }
}

fn duration(effect: &StatusEffect) -> String {
    match effect.remaining {
        Some(rounds) => format!(" ({rounds} rounds)"),
        None => String::new(),
    }
}

impl fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatEvent::Initiative {
                entity,
                roll,
                bonus,
                total,
            } => write!(f, "[INIT][{entity}] d20={roll} {} = {total}", signed(*bonus)),
            CombatEvent::TieBreak { entity, roll } => {
                write!(f, "[INIT][{entity}] tie-break d20={roll}")
            }
            CombatEvent::Started { order } => {
                let names: Vec<&str> = order.iter().map(EntityId::as_str).collect();
                write!(f, "[START] order: {}", names.join(", "))
            }
            CombatEvent::Action { entity, kind } => write!(f, "[TURN][{entity}] {kind}"),
            CombatEvent::ResourceSpent {
                entity,
                resource,
                amount,
                remaining,
            } => write!(f, "[COST][{entity}] -{amount} {resource} ({remaining} left)"),
            CombatEvent::Attack {
                attacker,
                target,
                natural,
                bonus,
                total,
                defense,
                outcome,
            } => write!(
                f,
                "[ATTACK][{attacker}] d20={natural} {} = {total} vs DEF {defense} on {target} → {outcome}",
                signed(*bonus)
            ),
            CombatEvent::Damage {
                target,
                rolls,
                raw,
                dealt,
                health,
            } => write!(
                f,
                "[DMG][{target}] rolls={rolls:?} raw={raw} dealt={dealt} → HP {health}"
            ),
            CombatEvent::Heal {
                target,
                rolls,
                amount,
                health,
            } => write!(f, "[HEAL][{target}] rolls={rolls:?} +{amount} → HP {health}"),
            CombatEvent::StatusApplied { entity, effect } => {
                write!(f, "[COND][{entity}] gains {}{}", effect.kind, duration(effect))
            }
            CombatEvent::StatusConsumed { entity, kind } => {
                write!(f, "[COND][{entity}] {kind} is used up")
            }
            CombatEvent::StatusRemoved { entity, kind } => {
                write!(f, "[COND][{entity}] is no longer {kind}")
            }
            CombatEvent::StatusExpired { entity, kind } => {
                write!(f, "[COND][{entity}] {kind} wears off")
            }
            CombatEvent::PeriodicDamage {
                entity,
                kind,
                amount,
                health,
            } => write!(f, "[DOT][{entity}] {kind} -{amount} → HP {health}"),
            CombatEvent::PeriodicHeal {
                entity,
                kind,
                amount,
                health,
            } => write!(f, "[HOT][{entity}] {kind} +{amount} → HP {health}"),
            CombatEvent::ModifierGranted { entity, modifier } => {
                write!(f, "[MOD][{entity}] {} {}", modifier.source, describe(modifier))
            }
            CombatEvent::ModifierExpired { entity, modifier } => write!(
                f,
                "[MOD][{entity}] {} {} expires",
                modifier.source,
                describe(modifier)
            ),
            CombatEvent::Defeated { entity } => write!(f, "[STATE][{entity}] is defeated"),
            CombatEvent::Flee {
                entity,
                chance,
                roll,
                escaped,
            } => write!(
                f,
                "[FLEE][{entity}] chance={chance}% d100={roll} → {}",
                if *escaped { "ESCAPED" } else { "FAILED" }
            ),
            CombatEvent::RoundStarted { round } => write!(f, "[ROUND] {round}"),
            CombatEvent::Ended { state } => write!(f, "[END] {state}"),
        }
    }
}

fn describe(modifier: &StatModifier) -> String {
    let pct = if modifier.is_percentage { "%" } else { "" };
    format!("{}{pct} {}", signed(modifier.value), modifier.target)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub round: u32,
    pub event: CombatEvent,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{} {}", self.round, self.event)
    }
}

/// Append-only record of an encounter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatLog {
    entries: Vec<LogEntry>,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, round: u32, event: CombatEvent) {
        match &event {
            CombatEvent::Started { .. }
            | CombatEvent::Ended { .. }
            | CombatEvent::Flee { .. }
            | CombatEvent::Defeated { .. }
            | CombatEvent::RoundStarted { .. } => tracing::info!(round, "{event}"),
            _ => tracing::debug!(round, "{event}"),
        }
        self.entries.push(LogEntry { round, event });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[LogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rendered lines, as the CLI prints them.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.event.to_string()).collect()
    }
}
