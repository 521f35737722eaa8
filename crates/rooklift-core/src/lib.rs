//! Core types for driving a physical chess board: squares and storage slots,
//! relocation commands, occupancy snapshots, the engine interface, and move
//! identification from sensor readouts.

mod board_model;
mod codec;
mod color;
mod engine;
mod error;
mod identify;
mod intent;
mod piece;
mod snapshot;
mod square;

pub use board_model::{BoardModel, OffsetTable};
pub use codec::{Command, Offset, encode, off_board_square};
pub use color::Color;
pub use engine::{GameEngine, GameStatus, Occupancy};
pub use error::{MoveParseError, PlacementError};
pub use identify::{Diff, Unidentified, classify_diff, identify_move};
pub use intent::{MoveIntent, castle_rook_move, en_passant_captured};
pub use piece::{Piece, PieceKind};
pub use snapshot::{PrettySnapshot, STARTING_PLACEMENT, Snapshot};
pub use square::{Location, Slot, Square};
