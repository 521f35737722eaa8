//! Turning one logical move into physical relocations.

use std::fmt;

use rooklift_core::{
    BoardModel, Color, GameEngine, Location, MoveIntent, Occupancy, Piece, Snapshot, Square, castle_rook_move,
    en_passant_captured, encode, off_board_square,
};
use rooklift_link::{CommandSink, Response};
use tracing::{info, warn};

use crate::error::{RelocationAborted, TranslateError};

/// One physical movement of a piece between two locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relocation {
    pub from: Location,
    pub to: Location,
}

impl Relocation {
    #[inline]
    pub fn new(from: impl Into<Location>, to: impl Into<Location>) -> Relocation {
        Relocation {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Carry the relocation out on `snapshot`. A piece taken from a slot is
    /// the one that slot stores for `perspective`.
    pub fn apply_to(self, snapshot: &mut Snapshot, perspective: Color) {
        let piece = match self.from {
            Location::Board(sq) => snapshot.set(sq, None),
            Location::OffBoard(slot) => Some(slot.piece(perspective)),
        };
        if let Location::Board(sq) = self.to {
            snapshot.set(sq, piece);
        }
    }
}

impl fmt::Display for Relocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Send one relocation command for the piece at `from`.
///
/// The command carries the piece's recorded offset within its square. On
/// success both ends are re-centered; on failure the board is untouched.
pub fn relocate<S, P>(sink: &mut S, board: &mut BoardModel<P>, from: Location, to: Location) -> Response
where
    S: CommandSink + ?Sized,
    P: Occupancy,
{
    let command = encode(from, to, board.offset(from), board.perspective());
    let response = sink.send(command);
    match &response {
        Response::Success { elapsed } => {
            board.center(from);
            board.center(to);
            info!(%from, %to, elapsed_ms = elapsed.as_millis() as u64, "relocated piece");
        }
        Response::Failure(fault) => {
            warn!(%from, %to, %fault, "relocation failed");
        }
    }
    response
}

fn piece_on<P: Occupancy>(board: &BoardModel<P>, square: Square) -> Result<Piece, TranslateError> {
    board.piece_at(square).ok_or(TranslateError::EmptySquare { square })
}

/// The relocations that carry out `mv`, in execution order.
///
/// `board` must still hold the position before `mv`.
pub fn plan_move<E: GameEngine>(board: &BoardModel<E>, mv: MoveIntent) -> Result<Vec<Relocation>, TranslateError> {
    let engine = board.position();
    let perspective = board.perspective();
    let mut plan = Vec::with_capacity(3);

    if engine.is_castling(mv) {
        let rook = castle_rook_move(mv.to).ok_or(TranslateError::NotCastling { king_to: mv.to })?;
        plan.push(Relocation::new(mv.from, mv.to));
        plan.push(Relocation::new(rook.from, rook.to));
        return Ok(plan);
    }

    let mover = piece_on(board, mv.from)?;

    if engine.is_en_passant(mv) {
        let captured = en_passant_captured(mv).ok_or(TranslateError::EmptySquare { square: mv.to })?;
        let victim = piece_on(board, captured)?;
        plan.push(Relocation::new(captured, off_board_square(victim, perspective)));
    } else if engine.is_capture(mv) {
        let victim = piece_on(board, mv.to)?;
        plan.push(Relocation::new(mv.to, off_board_square(victim, perspective)));
    }

    let mut origin = Location::Board(mv.from);
    if let Some(kind) = mv.promotion {
        plan.push(Relocation::new(mv.from, off_board_square(mover, perspective)));
        origin = off_board_square(Piece::new(kind, mover.color), perspective).into();
    }
    plan.push(Relocation::new(origin, mv.to));
    Ok(plan)
}

/// Run `plan` in order, stopping at the first failed relocation.
pub fn execute<S, P>(sink: &mut S, board: &mut BoardModel<P>, plan: &[Relocation]) -> Result<(), RelocationAborted>
where
    S: CommandSink + ?Sized,
    P: Occupancy,
{
    for (step, relocation) in plan.iter().enumerate() {
        if let Response::Failure(fault) = relocate(sink, board, relocation.from, relocation.to) {
            return Err(RelocationAborted {
                step,
                from: relocation.from,
                to: relocation.to,
                fault,
            });
        }
    }
    Ok(())
}

/// Physically play `mv` on the board.
///
/// The engine position is read, not advanced: the caller plays the move in
/// the engine once this returns `Ok`.
pub fn reflect_move<S, E>(sink: &mut S, board: &mut BoardModel<E>, mv: MoveIntent) -> Result<(), TranslateError>
where
    S: CommandSink + ?Sized,
    E: GameEngine,
{
    let plan = plan_move(board, mv)?;
    execute(sink, board, &plan)?;
    info!(%mv, relocations = plan.len(), "move reflected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use rooklift_core::{
        BoardModel, Color, Command, GameEngine, GameStatus, Location, MoveIntent, Occupancy, Offset, Piece, PieceKind,
        Slot, Snapshot, Square,
    };
    use rooklift_link::{CommandSink, LinkFault, Response};

    use super::{Relocation, plan_move, reflect_move, relocate};
    use crate::error::TranslateError;

    /// Records every command and answers from a script, succeeding once the
    /// script runs out.
    #[derive(Default)]
    struct Recorder {
        sent: Vec<Command>,
        script: VecDeque<bool>,
    }

    impl CommandSink for Recorder {
        fn send(&mut self, command: Command) -> Response {
            self.sent.push(command);
            if self.script.pop_front().unwrap_or(true) {
                Response::Success {
                    elapsed: Duration::from_millis(500),
                }
            } else {
                Response::Failure(LinkFault::Timeout {
                    waited: Duration::from_secs(10),
                })
            }
        }
    }

    /// Snapshot-backed engine answering classification by board geometry.
    struct Geometry {
        board: Snapshot,
        turn: Color,
    }

    impl Occupancy for Geometry {
        fn piece_at(&self, sq: Square) -> Option<Piece> {
            self.board.get(sq)
        }
    }

    impl GameEngine for Geometry {
        fn turn(&self) -> Color {
            self.turn
        }

        fn is_legal(&self, _mv: MoveIntent) -> bool {
            true
        }

        fn is_capture(&self, mv: MoveIntent) -> bool {
            self.board.get(mv.to).is_some()
        }

        fn is_en_passant(&self, mv: MoveIntent) -> bool {
            let pawn = matches!(self.board.get(mv.from), Some(p) if p.kind == PieceKind::Pawn);
            pawn && mv.from.file() != mv.to.file() && self.board.get(mv.to).is_none()
        }

        fn is_castling(&self, mv: MoveIntent) -> bool {
            let king = matches!(self.board.get(mv.from), Some(p) if p.kind == PieceKind::King);
            king && mv.from.file().abs_diff(mv.to.file()) == 2
        }

        fn status(&self) -> GameStatus {
            GameStatus::Ongoing
        }
    }

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn board(placement: &str, turn: Color, perspective: Color) -> BoardModel<Geometry> {
        let board = placement.parse().unwrap();
        BoardModel::new(Geometry { board, turn }, perspective)
    }

    fn decoded(sent: &[Command]) -> Vec<(i8, i8)> {
        sent.iter().map(|c| (c.from_field(), c.to_field())).collect()
    }

    fn slot(id: i8) -> Location {
        Location::OffBoard(Slot::new(id).unwrap())
    }

    #[test]
    fn pawn_push_is_one_relocation() {
        let mut board = board("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR", Color::White, Color::White);
        let mut sink = Recorder::default();
        reflect_move(&mut sink, &mut board, MoveIntent::new(sq("e2"), sq("e4"))).unwrap();
        assert_eq!(decoded(&sink.sent), vec![(12, 28)]);
    }

    #[test]
    fn kingside_castle_moves_king_then_rook() {
        let mut board = board("4k3/8/8/8/8/8/8/4K2R", Color::White, Color::White);
        let plan = plan_move(&board, MoveIntent::new(Square::E1, Square::G1)).unwrap();
        assert_eq!(
            plan,
            vec![
                Relocation::new(Square::E1, Square::G1),
                Relocation::new(Square::H1, Square::F1)
            ]
        );
        let mut sink = Recorder::default();
        reflect_move(&mut sink, &mut board, MoveIntent::new(Square::E1, Square::G1)).unwrap();
        assert_eq!(decoded(&sink.sent), vec![(4, 6), (7, 5)]);
    }

    #[test]
    fn en_passant_removes_pawn_behind_destination() {
        // White pawn e5 takes d5 en passant landing on d6.
        let board = board("4k3/8/8/3pP3/8/8/8/4K3", Color::White, Color::White);
        let plan = plan_move(&board, MoveIntent::new(sq("e5"), sq("d6"))).unwrap();
        assert_eq!(
            plan,
            vec![
                Relocation::new(sq("d5"), slot(-12)),
                Relocation::new(sq("e5"), sq("d6"))
            ]
        );
    }

    #[test]
    fn capture_parks_victim_first() {
        let board = board("4k3/8/8/3n4/4P3/8/8/4K3", Color::White, Color::White);
        let plan = plan_move(&board, MoveIntent::new(sq("e4"), sq("d5"))).unwrap();
        assert_eq!(
            plan,
            vec![
                Relocation::new(sq("d5"), slot(-9)),
                Relocation::new(sq("e4"), sq("d5"))
            ]
        );
    }

    #[test]
    fn promotion_swaps_pawn_for_stored_queen() {
        let board = board("8/4P3/8/8/8/8/8/k3K3", Color::White, Color::White);
        let mv = MoveIntent::promoting(sq("e7"), sq("e8"), PieceKind::Queen);
        let plan = plan_move(&board, mv).unwrap();
        assert_eq!(
            plan,
            vec![
                Relocation::new(sq("e7"), slot(-6)),
                Relocation::new(slot(-4), sq("e8"))
            ]
        );
    }

    #[test]
    fn capture_promotion_is_three_steps() {
        let board = board("3r4/4P3/8/8/8/8/8/k3K3", Color::White, Color::White);
        let mv = MoveIntent::promoting(sq("e7"), sq("d8"), PieceKind::Knight);
        let plan = plan_move(&board, mv).unwrap();
        assert_eq!(
            plan,
            vec![
                Relocation::new(sq("d8"), slot(-7)),
                Relocation::new(sq("e7"), slot(-6)),
                Relocation::new(slot(-3), sq("d8"))
            ]
        );
    }

    #[test]
    fn black_perspective_uses_near_group_for_black() {
        let board = board("k7/8/8/8/8/8/4p3/K7", Color::Black, Color::Black);
        let mv = MoveIntent::promoting(sq("e2"), sq("e1"), PieceKind::Rook);
        let plan = plan_move(&board, mv).unwrap();
        assert_eq!(plan[0], Relocation::new(sq("e2"), slot(-6)));
        assert_eq!(plan[1], Relocation::new(slot(-1), sq("e1")));
    }

    #[test]
    fn first_failure_skips_remaining_steps() {
        let mut board = board("4k3/8/8/8/8/8/8/4K2R", Color::White, Color::White);
        board.set_offset(Square::E1, Offset::new(0.3, 0.0));
        let mut sink = Recorder {
            script: VecDeque::from([false]),
            ..Recorder::default()
        };
        let err = reflect_move(&mut sink, &mut board, MoveIntent::new(Square::E1, Square::G1)).unwrap_err();
        assert_eq!(sink.sent.len(), 1);
        let TranslateError::Aborted(aborted) = err else {
            panic!("expected link abort, got {err:?}");
        };
        assert_eq!(aborted.step, 0);
        assert_eq!(board.offset(Location::Board(Square::E1)), Offset::new(0.3, 0.0));
    }

    #[test]
    fn success_centers_both_ends() {
        let mut board = board("4k3/8/8/8/8/8/8/4K3", Color::White, Color::White);
        board.set_offset(Square::E1, Offset::new(0.5, -0.5));
        board.set_offset(Square::D1, Offset::new(-0.2, 0.1));
        let mut sink = Recorder::default();
        let response = relocate(&mut sink, &mut board, Square::E1.into(), Square::D1.into());
        assert!(response.is_success());
        assert_eq!(sink.sent[0].offset_x_field(), 50);
        assert!(board.offset(Square::E1.into()).is_centered());
        assert!(board.offset(Square::D1.into()).is_centered());
    }

    #[test]
    fn apply_to_tracks_slots() {
        let mut snapshot: Snapshot = "8/4P3/8/8/8/8/8/8".parse().unwrap();
        Relocation::new(sq("e7"), slot(-6)).apply_to(&mut snapshot, Color::White);
        Relocation::new(slot(-4), sq("e8")).apply_to(&mut snapshot, Color::White);
        assert_eq!(snapshot.placement(), "4Q3/8/8/8/8/8/8/8");
    }

    #[test]
    fn empty_origin_is_rejected_without_io() {
        let mut board = board("4k3/8/8/8/8/8/8/4K3", Color::White, Color::White);
        let mut sink = Recorder::default();
        let err = reflect_move(&mut sink, &mut board, MoveIntent::new(sq("a2"), sq("a3"))).unwrap_err();
        assert_eq!(err, TranslateError::EmptySquare { square: sq("a2") });
        assert!(sink.sent.is_empty());
    }
}
