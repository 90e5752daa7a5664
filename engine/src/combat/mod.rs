//! Encounter resolution: participants, action requests and the state machine
//! that validates and applies them.

pub mod action;
pub mod entity;
pub mod error;
pub mod log;
pub mod manager;
pub mod snapshot;

pub use action::{ActionEffect, ActionKind, CombatAction, ResourceCost};
pub use entity::{CombatEntity, EntityId, PeriodicTick, Role, RoundTick, Side};
pub use error::{
    ActionError, InvalidTarget, SnapshotError, StartError, TargetProblem, ValidationError,
};
pub use log::{AttackOutcome, CombatEvent, CombatLog, LogEntry};
pub use manager::{ActionOutcome, CombatManager, CombatState};
pub use snapshot::{CombatSnapshot, CombatSummary, EntitySummary};
