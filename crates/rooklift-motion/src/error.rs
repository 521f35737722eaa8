//! Errors from multi-step relocation sequences.

use rooklift_core::{Location, Square};
use rooklift_link::LinkFault;

/// A relocation sequence stopped at a failed step. Steps after it were not
/// attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("relocation {step} ({from} -> {to}) failed: {fault}")]
pub struct RelocationAborted {
    /// Zero-based index of the failed step.
    pub step: usize,
    /// Where the failed relocation started.
    pub from: Location,
    /// Where the failed relocation was headed.
    pub to: Location,
    /// What went wrong on the link.
    #[source]
    pub fault: LinkFault,
}

/// Errors from [`reflect_move`](crate::reflect_move).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    /// The move starts on, or captures from, an empty square.
    #[error("no piece on {square}")]
    EmptySquare {
        /// The empty square.
        square: Square,
    },
    /// The engine classified the move as castling but the king does not land
    /// on a castling square.
    #[error("{king_to} is not a castling destination")]
    NotCastling {
        /// Where the king was going.
        king_to: Square,
    },
    /// The link failed partway through.
    #[error(transparent)]
    Aborted(#[from] RelocationAborted),
}

/// Why [`reset_board`](crate::reset_board) ended without reaching the target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResetError {
    /// A relocation failed.
    #[error("reset aborted after {steps} relocations: {source}")]
    Aborted {
        /// Relocations completed before the failure.
        steps: usize,
        /// The failed relocation.
        source: RelocationAborted,
    },
    /// The stop signal was raised between relocations.
    #[error("reset stopped after {steps} relocations")]
    Stopped {
        /// Relocations completed.
        steps: usize,
    },
    /// The step limit ran out before the boards matched.
    #[error("reset gave up after {steps} relocations")]
    StepLimit {
        /// Relocations completed.
        steps: usize,
    },
}

impl ResetError {
    /// Relocations that completed before the reset ended.
    pub fn steps(&self) -> usize {
        match self {
            ResetError::Aborted { steps, .. } | ResetError::Stopped { steps } | ResetError::StepLimit { steps } => {
                *steps
            }
        }
    }
}
