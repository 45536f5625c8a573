//! Error types for the game simulation.

use thiserror::Error;

use crate::ids::{ColonyId, TorbId};
use crate::torb::Action;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Why a torb cannot take part in a requested action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantIssue {
    /// The torb is dead.
    Dead,
    /// The torb has already bred this round.
    Infertile,
    /// The torb is busy with another action.
    Occupied(Action),
    /// The torb is still growing and ignores orders.
    Growing,
    /// Both sides of a pairing are the same torb.
    SameTorb,
    /// The torb does not belong to the colony issuing the order.
    NotInColony,
}

impl std::fmt::Display for ParticipantIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dead => write!(f, "is dead"),
            Self::Infertile => write!(f, "is infertile"),
            Self::Occupied(action) => write!(f, "is busy {action}"),
            Self::Growing => write!(f, "is still growing"),
            Self::SameTorb => write!(f, "cannot pair with itself"),
            Self::NotInColony => write!(f, "is not part of this colony"),
        }
    }
}

/// Why a colony cannot be scouted or attacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetIssue {
    /// A colony may not target itself.
    SelfTarget,
    /// Attacks require the target to have been discovered first.
    Undiscovered,
}

impl std::fmt::Display for TargetIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfTarget => write!(f, "a colony cannot target itself"),
            Self::Undiscovered => write!(f, "the target has not been discovered"),
        }
    }
}

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// A torb cannot breed, train, or fight in its current state.
    #[error("Torb {torb} {issue}")]
    InvalidParticipant {
        /// The offending torb.
        torb: TorbId,
        /// What is wrong with it.
        issue: ParticipantIssue,
    },

    /// A scout or attack target was refused.
    #[error("Colony {colony} cannot target colony {target}: {reason}")]
    InvalidTarget {
        /// The colony giving the order.
        colony: ColonyId,
        /// The requested target.
        target: ColonyId,
        /// Why the target was refused.
        reason: TargetIssue,
    },

    /// Round advancement was requested while colonies are still deciding.
    #[error("Round cannot advance, {} colonies are not ready", unready.len())]
    NotReady {
        /// Colonies that have not ended their turn.
        unready: Vec<ColonyId>,
    },

    /// Malformed configuration, fatal at setup.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Unknown colony identifier.
    #[error("Colony not found: {0}")]
    UnknownColony(ColonyId),

    /// Unknown torb identifier.
    #[error("Torb not found: {0}")]
    UnknownTorb(TorbId),

    /// A torb label like `"02-05"` could not be parsed or resolved.
    #[error("Invalid torb tag: {0}")]
    InvalidTorbTag(String),

    /// Bulk orders must name at least one torb and breeding needs exactly two.
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Snapshot or replay (de)serialization failure.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl GameError {
    /// Shorthand for an [`GameError::InvalidParticipant`].
    #[must_use]
    pub const fn participant(torb: TorbId, issue: ParticipantIssue) -> Self {
        Self::InvalidParticipant { torb, issue }
    }
}
