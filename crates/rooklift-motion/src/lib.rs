//! Physical motion: relocating single pieces, playing logical moves on the
//! board, and reconciling a physical layout with a target layout.

mod error;
mod reconcile;
mod translate;

pub use error::{RelocationAborted, ResetError, TranslateError};
pub use reconcile::{ResetProgress, iter_reset_board, mismatched_squares, reset_board};
pub use translate::{Relocation, execute, plan_move, reflect_move, relocate};
