//! Persisted layout and the read-only summary projection.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::entity::{CombatEntity, EntityId, Role};
use super::error::SnapshotError;
use super::log::{CombatLog, LogEntry};
use super::manager::{CombatManager, CombatState};
use crate::config::CombatRules;
use crate::resources::Pool;
use crate::status::StatusKind;

/// Mid-encounter state as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSnapshot {
    pub entities: Vec<CombatEntity>,
    pub turn_order: Vec<EntityId>,
    pub current_turn_index: usize,
    pub round: u32,
    pub state: CombatState,
    pub log: CombatLog,
    #[serde(default)]
    pub rules: CombatRules,
}

impl From<CombatManager> for CombatSnapshot {
    fn from(manager: CombatManager) -> Self {
        Self {
            entities: manager.entities.into_values().collect(),
            turn_order: manager.turn_order,
            current_turn_index: manager.current_turn,
            round: manager.round,
            state: manager.state,
            log: manager.log,
            rules: manager.rules,
        }
    }
}

impl TryFrom<CombatSnapshot> for CombatManager {
    type Error = SnapshotError;

    fn try_from(snapshot: CombatSnapshot) -> Result<Self, Self::Error> {
        let mut entities = IndexMap::with_capacity(snapshot.entities.len());
        for entity in snapshot.entities {
            let id = entity.id().clone();
            if let Some((resource, stored, expected)) = entity.pools().stale_max(entity.stats()) {
                return Err(SnapshotError::StaleMaximum {
                    entity: id,
                    resource,
                    stored,
                    expected,
                });
            }
            if entities.insert(id.clone(), entity).is_some() {
                return Err(SnapshotError::DuplicateEntity(id));
            }
        }

        if snapshot.state != CombatState::NotStarted {
            let unique: HashSet<&EntityId> = snapshot.turn_order.iter().collect();
            if unique.len() != snapshot.turn_order.len()
                || snapshot.turn_order.len() != entities.len()
                || !snapshot.turn_order.iter().all(|id| entities.contains_key(id))
            {
                return Err(SnapshotError::TurnOrderMismatch);
            }
            if snapshot.current_turn_index >= snapshot.turn_order.len() {
                return Err(SnapshotError::TurnIndexOutOfRange {
                    index: snapshot.current_turn_index,
                    len: snapshot.turn_order.len(),
                });
            }
            if snapshot.round == 0 {
                return Err(SnapshotError::InvalidRound);
            }
        }
        if snapshot.state == CombatState::InProgress {
            let id = &snapshot.turn_order[snapshot.current_turn_index];
            if entities.get(id).is_some_and(CombatEntity::is_defeated) {
                return Err(SnapshotError::DefeatedOnTurn(id.clone()));
            }
        }

        Ok(CombatManager {
            entities,
            turn_order: snapshot.turn_order,
            current_turn: snapshot.current_turn_index,
            round: snapshot.round,
            state: snapshot.state,
            log: snapshot.log,
            rules: snapshot.rules,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub name: String,
    pub role: Role,
    pub health: Pool,
    pub mana: Pool,
    pub stamina: Pool,
    pub statuses: Vec<StatusKind>,
}

/// What narration and UI layers get to see of an encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSummary {
    pub round: u32,
    pub current_turn: Option<EntityId>,
    pub state: CombatState,
    pub entities: IndexMap<EntityId, EntitySummary>,
    pub recent_log: Vec<LogEntry>,
}

impl CombatSummary {
    pub(super) fn of(manager: &CombatManager) -> Self {
        let entities = manager
            .entities()
            .map(|e| {
                (
                    e.id().clone(),
                    EntitySummary {
                        name: e.name().to_string(),
                        role: e.role(),
                        health: *e.health(),
                        mana: *e.mana(),
                        stamina: *e.stamina(),
                        statuses: e.statuses().kinds(),
                    },
                )
            })
            .collect();
        Self {
            round: manager.round(),
            current_turn: manager.current_turn().cloned(),
            state: manager.state(),
            entities,
            recent_log: manager.recent_log().to_vec(),
        }
    }

    /// Recent log lines as rendered text.
    pub fn recent_lines(&self) -> Vec<String> {
        self.recent_log.iter().map(|e| e.event.to_string()).collect()
    }
}
