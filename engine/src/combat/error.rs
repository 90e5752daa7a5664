use std::fmt;

use super::action::ActionKind;
use super::entity::EntityId;
use super::manager::CombatState;
use crate::resources::{InsufficientResource, Resource};
use crate::stats::ModifierError;

/// Why an action was refused before anything was touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("combat has not started")]
    NotStarted,
    #[error("unknown performer {0}")]
    UnknownPerformer(EntityId),
    #[error("it is {current}'s turn, not {performer}'s")]
    NotYourTurn {
        performer: EntityId,
        current: EntityId,
    },
    #[error("{0} is defeated and cannot act")]
    PerformerDefeated(EntityId),
    #[error("unsupported action type: {0}")]
    UnsupportedAction(ActionKind),
    #[error("{0} needs at least one target")]
    NoTargets(ActionKind),
    #[error("{0} needs a dice notation")]
    MissingDice(ActionKind),
    #[error("negative resource cost {0}")]
    NegativeCost(i32),
    #[error("paying {cost} health would defeat {performer}")]
    LethalCost { performer: EntityId, cost: i32 },
    #[error(transparent)]
    InvalidModifier(#[from] ModifierError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetProblem {
    Missing,
    Defeated,
}

impl fmt::Display for TargetProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetProblem::Missing => "is not in this encounter",
            TargetProblem::Defeated => "is already defeated",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("target {target} {reason}")]
pub struct InvalidTarget {
    pub target: EntityId,
    pub reason: TargetProblem,
}

/// Structured failure of `perform_action`; state is untouched whenever this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    InsufficientResource(#[from] InsufficientResource),
    #[error(transparent)]
    InvalidTarget(#[from] InvalidTarget),
    #[error("combat is over ({0})")]
    CombatOver(CombatState),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartError {
    #[error("combat already started")]
    AlreadyStarted,
    #[error("no participants")]
    Empty,
    #[error("duplicate entity id {0}")]
    DuplicateEntity(EntityId),
    #[error("{0} enters combat already defeated")]
    DefeatedParticipant(EntityId),
    #[error("an encounter needs a player side and an opposing side")]
    MissingSide,
}

/// A persisted encounter that cannot be resumed as written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("duplicate entity id {0}")]
    DuplicateEntity(EntityId),
    #[error("turn order is not a permutation of the entities")]
    TurnOrderMismatch,
    #[error("turn index {index} out of range for {len} entries")]
    TurnIndexOutOfRange { index: usize, len: usize },
    #[error("round must be at least 1 once combat has started")]
    InvalidRound,
    #[error("{0} holds the turn but is defeated")]
    DefeatedOnTurn(EntityId),
    #[error("{entity} has max {resource} {stored}, its stats give {expected}")]
    StaleMaximum {
        entity: EntityId,
        resource: Resource,
        stored: i32,
        expected: i32,
    },
}
