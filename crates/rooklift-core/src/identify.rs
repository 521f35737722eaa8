//! Infer the move played between two occupancy readouts.
//!
//! Only the *shape* of the difference is used: how many squares were
//! vacated and how many changed to a new occupant. The result is a best
//! guess; the caller must check it against the engine before playing it.

use tracing::debug;

use crate::engine::{GameEngine, Occupancy};
use crate::intent::{MoveIntent, castle_rook_move, en_passant_captured};
use crate::piece::{Piece, PieceKind};
use crate::square::Square;

/// Why a diff did not yield a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Unidentified {
    /// The diff shape matches no single move.
    #[error("{vacated} vacated and {occupied} occupied squares match no move shape")]
    AmbiguousDiff {
        /// Squares that went from occupied to empty.
        vacated: usize,
        /// Squares that gained a new occupant.
        occupied: usize,
    },
    /// The shape fits, but the reconstructed move fails the cross-check.
    #[error("diff does not reconstruct a legal move")]
    IllegalReconstruction,
}

/// Squares whose occupant differs between two readouts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diff {
    /// Previously occupied, now empty.
    pub vacated: Vec<Square>,
    /// Now holding a piece that was not there before (including captures).
    pub occupied: Vec<Square>,
}

impl Diff {
    /// Compare two readouts square by square.
    pub fn between<A, B>(previous: &A, current: &B) -> Diff
    where
        A: Occupancy + ?Sized,
        B: Occupancy + ?Sized,
    {
        let mut diff = Diff::default();
        for sq in Square::all() {
            let before = previous.piece_at(sq);
            let after = current.piece_at(sq);
            if before == after {
                continue;
            }
            if before.is_some() && after.is_none() {
                diff.vacated.push(sq);
            } else {
                diff.occupied.push(sq);
            }
        }
        diff
    }
}

/// Identify the move between `previous` (the engine's position before the
/// move) and `current` (a readout after it). `None` means re-sample.
pub fn identify_move<E, O>(previous: &E, current: &O) -> Option<MoveIntent>
where
    E: GameEngine + ?Sized,
    O: Occupancy + ?Sized,
{
    match classify_diff(previous, current) {
        Ok(mv) => Some(mv),
        Err(reason) => {
            debug!(%reason, "no move identified");
            None
        }
    }
}

/// Like [`identify_move`], but says why nothing was found.
pub fn classify_diff<E, O>(previous: &E, current: &O) -> Result<MoveIntent, Unidentified>
where
    E: GameEngine + ?Sized,
    O: Occupancy + ?Sized,
{
    let diff = Diff::between(previous, current);
    match (diff.vacated.as_slice(), diff.occupied.as_slice()) {
        (&[from], &[to]) => simple_move(previous, current, MoveIntent::new(from, to)),
        (&[a, b], &[c, d]) => castling_move(previous, current, [a, b], [c, d]),
        (&[a, b], &[to]) => en_passant_move(previous, [a, b], to),
        (vacated, occupied) => Err(Unidentified::AmbiguousDiff {
            vacated: vacated.len(),
            occupied: occupied.len(),
        }),
    }
}

/// Pawn stepping diagonally onto an empty square: only en passant does
/// that, and it never shows up as a one-for-one diff.
fn looks_like_en_passant<E: GameEngine + ?Sized>(previous: &E, mv: MoveIntent) -> bool {
    let is_pawn = previous
        .piece_at(mv.from)
        .is_some_and(|p| p.kind == PieceKind::Pawn);
    let distance = mv.from.raw().abs_diff(mv.to.raw());
    is_pawn && matches!(distance, 7 | 9) && previous.piece_at(mv.to).is_none()
}

fn simple_move<E, O>(previous: &E, current: &O, mut mv: MoveIntent) -> Result<MoveIntent, Unidentified>
where
    E: GameEngine + ?Sized,
    O: Occupancy + ?Sized,
{
    if looks_like_en_passant(previous, mv) || previous.is_castling(mv) {
        return Err(Unidentified::IllegalReconstruction);
    }

    let moved = previous
        .piece_at(mv.from)
        .ok_or(Unidentified::IllegalReconstruction)?;

    if moved.kind == PieceKind::Pawn && matches!(mv.to.rank(), 0 | 7) {
        let promoted = current
            .piece_at(mv.to)
            .filter(|p| p.color == moved.color)
            .ok_or(Unidentified::IllegalReconstruction)?;
        mv.promotion = Some(promoted.kind);
    }

    Ok(mv)
}

fn castling_move<E, O>(
    previous: &E,
    current: &O,
    mut vacated: [Square; 2],
    mut occupied: [Square; 2],
) -> Result<MoveIntent, Unidentified>
where
    E: GameEngine + ?Sized,
    O: Occupancy + ?Sized,
{
    let is_king = |piece: Option<Piece>| piece.is_some_and(|p| p.kind == PieceKind::King);
    if !is_king(previous.piece_at(vacated[0])) {
        vacated.swap(0, 1);
    }
    if !is_king(current.piece_at(occupied[0])) {
        occupied.swap(0, 1);
    }

    let king_move = MoveIntent::new(vacated[0], occupied[0]);
    let rook_move = MoveIntent::new(vacated[1], occupied[1]);
    if !previous.is_castling(king_move) {
        return Err(Unidentified::IllegalReconstruction);
    }

    let color = previous
        .piece_at(king_move.from)
        .ok_or(Unidentified::IllegalReconstruction)?
        .color;
    let rook = Some(Piece::new(PieceKind::Rook, color));
    if previous.piece_at(rook_move.from) != rook || current.piece_at(rook_move.to) != rook {
        return Err(Unidentified::IllegalReconstruction);
    }
    if castle_rook_move(king_move.to) != Some(rook_move) {
        return Err(Unidentified::IllegalReconstruction);
    }

    Ok(king_move)
}

fn en_passant_move<E>(previous: &E, vacated: [Square; 2], to: Square) -> Result<MoveIntent, Unidentified>
where
    E: GameEngine + ?Sized,
{
    let [a, b] = vacated;
    let (mv, captured) = if previous.is_en_passant(MoveIntent::new(a, to)) {
        (MoveIntent::new(a, to), b)
    } else if previous.is_en_passant(MoveIntent::new(b, to)) {
        (MoveIntent::new(b, to), a)
    } else {
        return Err(Unidentified::IllegalReconstruction);
    };

    if en_passant_captured(mv) != Some(captured) {
        return Err(Unidentified::IllegalReconstruction);
    }
    Ok(mv)
}

#[cfg(test)]
mod tests {
    use super::{Diff, Unidentified, classify_diff, identify_move};
    use crate::color::Color;
    use crate::engine::{GameEngine, GameStatus, Occupancy};
    use crate::intent::{MoveIntent, castle_rook_move};
    use crate::piece::{Piece, PieceKind};
    use crate::snapshot::Snapshot;
    use crate::square::Square;

    /// Minimal rules: enough geometry to answer the identifier's questions.
    struct Table {
        layout: Snapshot,
        turn: Color,
        en_passant: Option<Square>,
    }

    impl Table {
        fn new(placement: &str, turn: Color, en_passant: Option<&str>) -> Table {
            Table {
                layout: placement.parse().unwrap(),
                turn,
                en_passant: en_passant.map(sq),
            }
        }

        fn own(&self, sq: Square, kind: PieceKind) -> bool {
            self.layout.get(sq) == Some(Piece::new(kind, self.turn))
        }
    }

    impl Occupancy for Table {
        fn piece_at(&self, sq: Square) -> Option<Piece> {
            self.layout.get(sq)
        }
    }

    impl GameEngine for Table {
        fn turn(&self) -> Color {
            self.turn
        }

        fn is_legal(&self, mv: MoveIntent) -> bool {
            self.layout.get(mv.from).is_some_and(|p| p.color == self.turn)
        }

        fn is_capture(&self, mv: MoveIntent) -> bool {
            self.layout.get(mv.to).is_some_and(|p| p.color != self.turn)
        }

        fn is_en_passant(&self, mv: MoveIntent) -> bool {
            self.own(mv.from, PieceKind::Pawn)
                && self.en_passant == Some(mv.to)
                && matches!(mv.from.raw().abs_diff(mv.to.raw()), 7 | 9)
        }

        fn is_castling(&self, mv: MoveIntent) -> bool {
            let home = match self.turn {
                Color::White => Square::E1,
                Color::Black => Square::E8,
            };
            let Some(rook) = castle_rook_move(mv.to) else {
                return false;
            };
            mv.from == home
                && mv.to.rank() == home.rank()
                && self.own(home, PieceKind::King)
                && self.own(rook.from, PieceKind::Rook)
        }

        fn status(&self) -> GameStatus {
            GameStatus::Ongoing
        }
    }

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn after(placement: &str) -> Snapshot {
        placement.parse().unwrap()
    }

    #[test]
    fn diff_classifies_squares() {
        let before = Snapshot::starting_position();
        let now = after("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR");
        let diff = Diff::between(&before, &now);
        assert_eq!(diff.vacated, vec![sq("e2")]);
        assert_eq!(diff.occupied, vec![sq("e4")]);
        assert_eq!(Diff::between(&before, &before), Diff::default());
    }

    #[test]
    fn pawn_push() {
        let table = Table::new(crate::snapshot::STARTING_PLACEMENT, Color::White, None);
        let now = after("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR");
        assert_eq!(
            identify_move(&table, &now),
            Some(MoveIntent::new(sq("e2"), sq("e4")))
        );
    }

    #[test]
    fn capture_replaces_occupant() {
        let table = Table::new("4k3/8/8/3p4/4P3/8/8/4K3", Color::White, None);
        let now = after("4k3/8/8/3P4/8/8/8/4K3");
        assert_eq!(
            identify_move(&table, &now),
            Some(MoveIntent::new(sq("e4"), sq("d5")))
        );
    }

    #[test]
    fn promotion_takes_kind_from_current() {
        let table = Table::new("8/4P3/8/8/8/8/k7/4K3", Color::White, None);
        let now = after("4N3/8/8/8/8/8/k7/4K3");
        assert_eq!(
            identify_move(&table, &now),
            Some(MoveIntent::promoting(sq("e7"), sq("e8"), PieceKind::Knight))
        );
    }

    #[test]
    fn promotion_with_capture() {
        let table = Table::new("3r4/4P3/8/8/8/8/k7/4K3", Color::White, None);
        let now = after("3Q4/8/8/8/8/8/k7/4K3");
        assert_eq!(
            identify_move(&table, &now),
            Some(MoveIntent::promoting(sq("e7"), sq("d8"), PieceKind::Queen))
        );
    }

    #[test]
    fn promotion_of_wrong_color_rejected() {
        let table = Table::new("3r4/4P3/8/8/8/8/k7/4K3", Color::White, None);
        // The e7 pawn vanished and d8 still holds a black piece of a new kind.
        let now = after("3q4/8/8/8/8/8/k7/4K3");
        assert_eq!(
            classify_diff(&table, &now),
            Err(Unidentified::IllegalReconstruction)
        );
    }

    #[test]
    fn castling_both_orders() {
        let table = Table::new("r3k2r/8/8/8/8/8/8/R3K2R", Color::White, None);
        let king_side = after("r3k2r/8/8/8/8/8/8/R4RK1");
        assert_eq!(
            identify_move(&table, &king_side),
            Some(MoveIntent::new(Square::E1, Square::G1))
        );
        let queen_side = after("r3k2r/8/8/8/8/8/8/2KR3R");
        assert_eq!(
            identify_move(&table, &queen_side),
            Some(MoveIntent::new(Square::E1, Square::C1))
        );

        let table = Table::new("r3k2r/8/8/8/8/8/8/R3K2R", Color::Black, None);
        let king_side = after("r4rk1/8/8/8/8/8/8/R3K2R");
        assert_eq!(
            identify_move(&table, &king_side),
            Some(MoveIntent::new(Square::E8, Square::G8))
        );
        let queen_side = after("2kr3r/8/8/8/8/8/8/R3K2R");
        assert_eq!(
            identify_move(&table, &queen_side),
            Some(MoveIntent::new(Square::E8, Square::C8))
        );
    }

    #[test]
    fn castling_with_misplaced_rook_rejected() {
        let table = Table::new("r3k2r/8/8/8/8/8/8/R3K2R", Color::White, None);
        // King reached g1 but the rook went to d1 instead of f1.
        let now = after("r3k2r/8/8/8/8/8/8/R2R2K1");
        assert_eq!(
            classify_diff(&table, &now),
            Err(Unidentified::IllegalReconstruction)
        );
    }

    #[test]
    fn lone_king_step_to_castle_square_rejected() {
        let table = Table::new("r3k2r/8/8/8/8/8/8/R3K2R", Color::White, None);
        let now = after("r3k2r/8/8/8/8/8/8/R5KR");
        assert_eq!(
            classify_diff(&table, &now),
            Err(Unidentified::IllegalReconstruction)
        );
    }

    #[test]
    fn en_passant_either_vacated_order() {
        let table = Table::new("4k3/8/8/3pP3/8/8/8/4K3", Color::White, Some("d6"));
        let now = after("4k3/8/3P4/8/8/8/8/4K3");
        assert_eq!(
            identify_move(&table, &now),
            Some(MoveIntent::new(sq("e5"), sq("d6")))
        );

        let table = Table::new("4k3/8/8/8/3pP3/8/8/4K3", Color::Black, Some("e3"));
        let now = after("4k3/8/8/8/8/4p3/8/4K3");
        assert_eq!(
            identify_move(&table, &now),
            Some(MoveIntent::new(sq("d4"), sq("e3")))
        );
    }

    #[test]
    fn diagonal_pawn_step_to_empty_square_alone_rejected() {
        // The captured pawn was not removed yet: only one square vacated.
        let table = Table::new("4k3/8/8/3pP3/8/8/8/4K3", Color::White, Some("d6"));
        let now = after("4k3/8/3P4/3p4/8/8/8/4K3");
        assert_eq!(
            classify_diff(&table, &now),
            Err(Unidentified::IllegalReconstruction)
        );
    }

    #[test]
    fn en_passant_wrong_victim_rejected() {
        let table = Table::new("4k3/8/8/2ppP3/8/8/8/4K3", Color::White, Some("d6"));
        // The c5 pawn disappeared instead of the d5 pawn.
        let now = after("4k3/8/3P4/3p4/8/8/8/4K3");
        assert_eq!(
            classify_diff(&table, &now),
            Err(Unidentified::IllegalReconstruction)
        );
    }

    #[test]
    fn unexplained_shapes_are_ambiguous() {
        let table = Table::new(crate::snapshot::STARTING_PLACEMENT, Color::White, None);
        let unchanged = Snapshot::starting_position();
        assert_eq!(
            classify_diff(&table, &unchanged),
            Err(Unidentified::AmbiguousDiff { vacated: 0, occupied: 0 })
        );
        let two_moves = after("rnbqkbnr/pppppppp/8/8/3PP3/8/PPP2PPP/RNBQKBNR");
        assert_eq!(
            classify_diff(&table, &two_moves),
            Err(Unidentified::IllegalReconstruction)
        );
        let lifted = after("rnbqkbnr/pppppppp/8/8/8/8/PPPP1PPP/RNBQKBNR");
        assert_eq!(identify_move(&table, &lifted), None);
    }
}
