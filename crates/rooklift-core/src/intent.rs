//! Move intents and the fixed geometry of castling and en passant.

use std::fmt;
use std::str::FromStr;

use crate::error::MoveParseError;
use crate::piece::PieceKind;
use crate::square::Square;

/// A logical move: the unit passed between move identification and move
/// translation.
///
/// Castling is expressed as the king's two-square step (`e1g1`), never as
/// king-takes-rook.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveIntent {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl MoveIntent {
    /// A move without promotion.
    #[inline]
    pub const fn new(from: Square, to: Square) -> MoveIntent {
        MoveIntent {
            from,
            to,
            promotion: None,
        }
    }

    /// A pawn move promoting to `kind`.
    #[inline]
    pub const fn promoting(from: Square, to: Square, kind: PieceKind) -> MoveIntent {
        MoveIntent {
            from,
            to,
            promotion: Some(kind),
        }
    }

    /// Parse UCI long algebraic notation (`e2e4`, `e7e8q`).
    pub fn from_uci(text: &str) -> Result<MoveIntent, MoveParseError> {
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(MoveParseError::BadLength {
                text: text.to_string(),
            });
        }
        let invalid = || MoveParseError::InvalidSquare {
            text: text.to_string(),
        };
        let from = Square::from_algebraic(&text[0..2]).ok_or_else(invalid)?;
        let to = Square::from_algebraic(&text[2..4]).ok_or_else(invalid)?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_fen_char(c) {
                Some(kind @ (PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)) => {
                    Some(kind)
                }
                _ => return Err(MoveParseError::InvalidPromotion { character: c }),
            },
        };
        Ok(MoveIntent { from, to, promotion })
    }

    /// UCI text for this move.
    pub fn to_uci(self) -> String {
        self.to_string()
    }
}

impl FromStr for MoveIntent {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<MoveIntent, MoveParseError> {
        MoveIntent::from_uci(s)
    }
}

impl fmt::Display for MoveIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.fen_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for MoveIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MoveIntent({self})")
    }
}

/// The rook's relocation that accompanies a castling king landing on
/// `king_to`. Only g1, c1, g8 and c8 are castling destinations.
pub fn castle_rook_move(king_to: Square) -> Option<MoveIntent> {
    let (from, to) = match king_to {
        Square::G1 => (Square::H1, Square::F1),
        Square::C1 => (Square::A1, Square::D1),
        Square::G8 => (Square::H8, Square::F8),
        Square::C8 => (Square::A8, Square::D8),
        _ => return None,
    };
    Some(MoveIntent::new(from, to))
}

/// Square of the pawn removed by an en passant capture: one rank behind the
/// destination, in the capturing pawn's direction of travel.
pub fn en_passant_captured(mv: MoveIntent) -> Option<Square> {
    let delta = if mv.to > mv.from { -8 } else { 8 };
    mv.to.shifted(delta)
}
