use thiserror::Error;

use crate::types::{BracketKind, MatchId, Order};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BracketError {
    #[error("No teams given")]
    NoTeams,

    #[error("Team count must be a power of two, got {count} pairs")]
    TeamCountNotPowerOfTwo { count: usize },

    #[error("Double elimination needs at least 2 team pairs, got {count}")]
    DoubleEliminationTooSmall { count: usize },

    #[error("Incompatible options: {reason}")]
    IncompatibleOptions { reason: String },

    #[error("Grand final bracket has {rounds} rounds, at most 2 are allowed")]
    TooManyFinalRounds { rounds: usize },

    #[error("Sibling of the {order:?} slot was used before it was assigned")]
    SiblingUnassigned { order: Order },

    #[error("Round {round} of the {bracket:?} bracket has no previous round to advance from")]
    NoPreviousRound { bracket: BracketKind, round: usize },

    #[error("Round {round} does not exist in the {bracket:?} bracket")]
    UnknownRound { bracket: BracketKind, round: usize },

    #[error("Match {0} does not exist")]
    UnknownMatch(MatchId),

    #[error("No team leaf with seed {seed}")]
    UnknownTeam { seed: usize },
}

impl BracketError {
    /// Raised for bad caller input at build time; fixing the input fixes the build.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BracketError::NoTeams
                | BracketError::TeamCountNotPowerOfTwo { .. }
                | BracketError::DoubleEliminationTooSmall { .. }
                | BracketError::IncompatibleOptions { .. }
        )
    }

    /// A defect in the topology builder itself.
    pub fn is_invariant(&self) -> bool {
        !self.is_configuration()
    }
}
