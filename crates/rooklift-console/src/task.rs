//! Hardware work that runs off the console thread.
//!
//! A [`Rig`] is the link plus the physical board it moves pieces on. The
//! console lends it to a worker thread for one [`Task`] and gets it back,
//! together with the [`TaskOutcome`], when the task ends.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};

use rooklift_core::{BoardModel, Color, GameStatus, Location, MoveIntent, Snapshot};
use rooklift_link::{CommandSink, Response};
use rooklift_motion::{
    Relocation, RelocationAborted, ResetError, ResetProgress, TranslateError, execute, iter_reset_board, plan_move,
    relocate, reset_board,
};
use tracing::{debug, info};

use crate::game::ChessGame;

/// Wins, losses and draws from the robot's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Record {
    pub robot_wins: u32,
    pub robot_losses: u32,
    pub draws: u32,
}

/// What `status` reports. Written by the console and, during a reset, by the
/// worker after every relocation.
#[derive(Debug, Clone)]
pub struct BoardView {
    /// Physical layout as last known.
    pub physical: Snapshot,
    /// Logical game placement.
    pub logical: Snapshot,
    pub perspective: Color,
    pub turn: Color,
    pub status: GameStatus,
    /// `true` while a task owns the rig.
    pub busy: bool,
    pub record: Record,
}

impl BoardView {
    /// Both layouts at the starting position.
    pub fn new(perspective: Color) -> BoardView {
        BoardView {
            physical: Snapshot::starting_position(),
            logical: Snapshot::starting_position(),
            perspective,
            turn: Color::White,
            status: GameStatus::Ongoing,
            busy: false,
            record: Record::default(),
        }
    }
}

/// The view shared between the console and the worker.
pub type SharedView = Arc<RwLock<BoardView>>;

/// The link and the physical board it acts on.
pub struct Rig {
    pub sink: Box<dyn CommandSink + Send>,
    pub board: BoardModel<Snapshot>,
}

impl Rig {
    /// A rig whose board holds the starting position, seen from `perspective`.
    pub fn new(sink: Box<dyn CommandSink + Send>, perspective: Color) -> Rig {
        Rig {
            sink,
            board: BoardModel::new(Snapshot::starting_position(), perspective),
        }
    }
}

/// One unit of hardware work.
#[derive(Debug)]
pub enum Task {
    /// Play `mv` from `game` on the physical board. Runs to completion or
    /// failure; `stop` is not consulted.
    RobotMove { game: ChessGame, mv: MoveIntent },
    /// Reconcile the physical board with `target`.
    Reset { target: BoardModel<Snapshot>, max_steps: usize },
    /// One reconciliation step toward `target`.
    Step { target: BoardModel<Snapshot> },
    /// A single raw relocation.
    Send { from: Location, to: Location },
}

/// How a [`Task`] ended.
#[derive(Debug)]
pub enum TaskOutcome {
    Moved {
        mv: MoveIntent,
        result: Result<(), TranslateError>,
    },
    Reset(Result<usize, ResetError>),
    Step(Result<ResetProgress, RelocationAborted>),
    Sent { relocation: Relocation, response: Response },
}

fn publish(view: &SharedView, physical: &Snapshot) {
    view.write().expect("view lock poisoned").physical = *physical;
}

/// Run `task` on `rig`, keeping `view` current.
pub fn run_task(rig: &mut Rig, task: Task, stop: &AtomicBool, view: &SharedView) -> TaskOutcome {
    let outcome = match task {
        Task::RobotMove { game, mv } => TaskOutcome::Moved {
            mv,
            result: robot_move(rig, game, mv),
        },
        Task::Reset { target, max_steps } => {
            let result = reset_board(&mut *rig.sink, &mut rig.board, &target, max_steps, stop, |relocation, board| {
                debug!(%relocation, "reset progress");
                publish(view, board.position());
            });
            TaskOutcome::Reset(result)
        }
        Task::Step { target } => TaskOutcome::Step(iter_reset_board(&mut *rig.sink, &mut rig.board, &target)),
        Task::Send { from, to } => {
            let relocation = Relocation::new(from, to);
            let response = relocate(&mut *rig.sink, &mut rig.board, from, to);
            if response.is_success() {
                let perspective = rig.board.perspective();
                relocation.apply_to(rig.board.position_mut(), perspective);
            }
            TaskOutcome::Sent { relocation, response }
        }
    };
    publish(view, rig.board.position());
    outcome
}

/// Plan `mv` against the logical game, then carry the plan out on the
/// physical board. Completed relocations are recorded even when a later one
/// fails.
fn robot_move(rig: &mut Rig, game: ChessGame, mv: MoveIntent) -> Result<(), TranslateError> {
    let perspective = rig.board.perspective();
    let planner = BoardModel::new(game, perspective);
    let plan = plan_move(&planner, mv)?;

    let result = execute(&mut *rig.sink, &mut rig.board, &plan);
    let completed = match &result {
        Ok(()) => plan.len(),
        Err(aborted) => aborted.step,
    };
    for relocation in &plan[..completed] {
        relocation.apply_to(rig.board.position_mut(), perspective);
    }
    info!(%mv, completed, planned = plan.len(), "robot move finished");
    result.map_err(TranslateError::from)
}
