//! The narrow interface to the external chess engine.
//!
//! Rules, legality and move search live outside this workspace's core. The
//! core only asks the questions below.

use std::fmt;

use crate::color::Color;
use crate::intent::MoveIntent;
use crate::piece::Piece;
use crate::square::Square;

/// Anything that can report which piece stands on a real square.
pub trait Occupancy {
    /// Piece on `sq`, if any.
    fn piece_at(&self, sq: Square) -> Option<Piece>;
}

/// Game state as classified by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Ongoing,
    WhiteWins,
    BlackWins,
    Draw,
    /// A player resigned. Only the session knows about resignations, the
    /// engine never reports this.
    Resigned,
}

impl GameStatus {
    /// `true` once no more moves will be played.
    pub const fn is_over(self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }

    /// The winner for a decided game.
    pub const fn winner(self) -> Option<Color> {
        match self {
            GameStatus::WhiteWins => Some(Color::White),
            GameStatus::BlackWins => Some(Color::Black),
            _ => None,
        }
    }

    /// PGN-style result tag.
    pub const fn result_tag(self) -> &'static str {
        match self {
            GameStatus::Ongoing => "*",
            GameStatus::WhiteWins => "1-0",
            GameStatus::BlackWins => "0-1",
            GameStatus::Draw => "1/2-1/2",
            GameStatus::Resigned => "resigned",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.result_tag())
    }
}

/// Classification and legality queries answered by the external engine for
/// its current position.
pub trait GameEngine: Occupancy {
    /// Side to move.
    fn turn(&self) -> Color;

    /// `true` if `mv` is legal in the current position.
    fn is_legal(&self, mv: MoveIntent) -> bool;

    /// `true` if `mv` removes an enemy piece from `mv.to`. En passant
    /// captures are reported by [`GameEngine::is_en_passant`] instead.
    fn is_capture(&self, mv: MoveIntent) -> bool;

    /// `true` if `mv` is a legal en passant capture.
    fn is_en_passant(&self, mv: MoveIntent) -> bool;

    /// `true` if `mv` is a legal castling move given as the king's step.
    fn is_castling(&self, mv: MoveIntent) -> bool;

    /// Whether the game is still running.
    fn status(&self) -> GameStatus;
}

impl<T: Occupancy + ?Sized> Occupancy for &T {
    fn piece_at(&self, sq: Square) -> Option<Piece> {
        (**self).piece_at(sq)
    }
}
