//! The logical game, backed by `shakmaty`.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Move, Position, Role};

use rooklift_core::{Color, GameEngine, GameStatus, MoveIntent, Occupancy, Piece, PieceKind, Snapshot, Square};

use crate::error::ConsoleError;

fn to_shakmaty(sq: Square) -> shakmaty::Square {
    shakmaty::Square::new(u32::from(sq.raw()))
}

fn from_shakmaty(sq: shakmaty::Square) -> Option<Square> {
    Square::new(sq as u8)
}

fn kind_of(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

fn color_of(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

/// The intent a `shakmaty` move corresponds to. Castling becomes the king's
/// two-square step.
pub fn intent_of(m: &Move) -> Option<MoveIntent> {
    match *m {
        Move::Normal {
            from, to, promotion, ..
        } => Some(MoveIntent {
            from: from_shakmaty(from)?,
            to: from_shakmaty(to)?,
            promotion: promotion.map(kind_of),
        }),
        Move::EnPassant { from, to } => Some(MoveIntent::new(from_shakmaty(from)?, from_shakmaty(to)?)),
        Move::Castle { king, rook } => {
            let king = from_shakmaty(king)?;
            let rook = from_shakmaty(rook)?;
            let file = if rook.file() > king.file() { 6 } else { 2 };
            Some(MoveIntent::new(king, Square::from_coords(file, king.rank())?))
        }
        Move::Put { .. } => None,
    }
}

/// A standard chess game.
#[derive(Debug, Clone, Default)]
pub struct ChessGame {
    position: Chess,
}

impl ChessGame {
    /// The starting position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a full FEN record.
    pub fn from_fen(fen: &str) -> Result<Self, ConsoleError> {
        let invalid = || ConsoleError::InvalidFen { fen: fen.to_string() };
        let parsed: Fen = fen.parse().map_err(|_| invalid())?;
        let position: Chess = parsed.into_position(CastlingMode::Standard).map_err(|_| invalid())?;
        Ok(Self { position })
    }

    /// The underlying `shakmaty` position.
    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// The legal `shakmaty` move matching `mv`.
    fn find(&self, mv: MoveIntent) -> Option<Move> {
        self.position
            .legal_moves()
            .into_iter()
            .find(|m| intent_of(m) == Some(mv))
    }

    /// Every legal move as an intent.
    pub fn legal_intents(&self) -> Vec<MoveIntent> {
        self.position.legal_moves().iter().filter_map(intent_of).collect()
    }

    /// Play `mv` if it is legal.
    pub fn play(&mut self, mv: MoveIntent) -> Result<(), ConsoleError> {
        let m = self.find(mv).ok_or_else(|| ConsoleError::IllegalMove { uci_move: mv.to_uci() })?;
        self.position.play_unchecked(&m);
        Ok(())
    }

    /// A copy of this game with `mv` played.
    pub fn played(&self, mv: MoveIntent) -> Result<Self, ConsoleError> {
        let mut next = self.clone();
        next.play(mv)?;
        Ok(next)
    }

    /// Current occupancy.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}

impl Occupancy for ChessGame {
    fn piece_at(&self, sq: Square) -> Option<Piece> {
        let piece = self.position.board().piece_at(to_shakmaty(sq))?;
        Some(Piece::new(kind_of(piece.role), color_of(piece.color)))
    }
}

impl GameEngine for ChessGame {
    fn turn(&self) -> Color {
        color_of(self.position.turn())
    }

    fn is_legal(&self, mv: MoveIntent) -> bool {
        self.find(mv).is_some()
    }

    fn is_capture(&self, mv: MoveIntent) -> bool {
        matches!(self.find(mv), Some(Move::Normal { capture: Some(_), .. }))
    }

    fn is_en_passant(&self, mv: MoveIntent) -> bool {
        matches!(self.find(mv), Some(Move::EnPassant { .. }))
    }

    fn is_castling(&self, mv: MoveIntent) -> bool {
        matches!(self.find(mv), Some(Move::Castle { .. }))
    }

    fn status(&self) -> GameStatus {
        if self.position.is_checkmate() {
            match self.turn() {
                Color::White => GameStatus::BlackWins,
                Color::Black => GameStatus::WhiteWins,
            }
        } else if self.position.is_stalemate() || self.position.is_insufficient_material() {
            GameStatus::Draw
        } else {
            GameStatus::Ongoing
        }
    }
}
