//! Game session state: whose turn it is, what the physical board holds, and
//! how finished games are counted.
//!
//! The human plays the perspective color and the robot plays the other one.
//! Hardware work is handed out as a [`Task`] together with the [`Rig`], and
//! the session only advances the game once the outcome comes back.

use std::sync::{Arc, RwLock};

use rooklift_core::{
    BoardModel, Color, GameEngine, GameStatus, Location, MoveIntent, OffsetTable, Snapshot, Unidentified,
    classify_diff,
};
use rooklift_link::{CommandSink, Response};
use rooklift_motion::{ResetError, ResetProgress};
use tracing::{info, warn};

use crate::config::{SessionConfig, SessionOption};
use crate::error::ConsoleError;
use crate::game::ChessGame;
use crate::task::{BoardView, Record, Rig, SharedView, Task, TaskOutcome};

/// A finished game, from the robot's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotResult {
    Win,
    Loss,
    Draw,
}

impl RobotResult {
    pub const fn name(self) -> &'static str {
        match self {
            RobotResult::Win => "win",
            RobotResult::Loss => "loss",
            RobotResult::Draw => "draw",
        }
    }
}

/// Reported once when a game ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOver {
    pub status: GameStatus,
    pub result: RobotResult,
}

impl GameOver {
    /// The protocol line announcing the result.
    pub fn reply(self) -> String {
        format!("gameover {} robot {}", self.status, self.result.name())
    }
}

/// What a sensor reading turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The human played `mv`; the game advanced.
    Played { mv: MoveIntent, game_over: Option<GameOver> },
    /// The diff did not reconstruct a move.
    Unidentified(Unidentified),
    /// The diff reconstructed a move the game does not allow.
    Illegal(MoveIntent),
}

/// The console's session state object.
pub struct Session {
    config: SessionConfig,
    game: ChessGame,
    perspective: Color,
    /// `None` while a task has it.
    rig: Option<Rig>,
    resigned: bool,
    /// Whether the current game's end has been counted.
    reported: bool,
    record: Record,
    /// Link settings changed while the rig was out.
    pending_reconfigure: bool,
    view: SharedView,
}

impl Session {
    /// Start at the initial position with the human playing White.
    pub fn new(config: SessionConfig, mut rig: Rig) -> Session {
        rig.sink.reconfigure(config.timing, config.frame_width);
        let perspective = rig.board.perspective();
        let session = Session {
            config,
            game: ChessGame::new(),
            perspective,
            rig: Some(rig),
            resigned: false,
            reported: false,
            record: Record::default(),
            pending_reconfigure: false,
            view: Arc::new(RwLock::new(BoardView::new(perspective))),
        };
        session.publish();
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn game(&self) -> &ChessGame {
        &self.game
    }

    pub fn perspective(&self) -> Color {
        self.perspective
    }

    pub fn record(&self) -> Record {
        self.record
    }

    /// `true` while a task owns the rig.
    pub fn is_busy(&self) -> bool {
        self.rig.is_none()
    }

    /// The physical board, unless a task has it.
    pub fn physical(&self) -> Option<&BoardModel<Snapshot>> {
        self.rig.as_ref().map(|rig| &rig.board)
    }

    /// A handle to the shared view.
    pub fn view(&self) -> SharedView {
        Arc::clone(&self.view)
    }

    /// Game status including resignation.
    pub fn status(&self) -> GameStatus {
        if self.resigned {
            GameStatus::Resigned
        } else {
            self.game.status()
        }
    }

    fn publish(&self) {
        let mut view = self.view.write().expect("view lock poisoned");
        if let Some(rig) = &self.rig {
            view.physical = *rig.board.position();
        }
        view.logical = self.game.snapshot();
        view.perspective = self.perspective;
        view.turn = self.game.turn();
        view.status = self.status();
        view.busy = self.rig.is_none();
        view.record = self.record;
    }

    fn rig_mut(&mut self) -> Result<&mut Rig, ConsoleError> {
        self.rig.as_mut().ok_or(ConsoleError::Busy)
    }

    /// Start a fresh game with the human playing `perspective`. The physical
    /// board keeps its pieces; only the side it is seen from changes.
    pub fn new_game(&mut self, perspective: Color) -> Result<(), ConsoleError> {
        self.rig_mut()?.board.reorient(perspective);
        self.perspective = perspective;
        self.set_game(ChessGame::new());
        info!(%perspective, "new game");
        Ok(())
    }

    /// Replace the logical game.
    pub fn set_game(&mut self, game: ChessGame) {
        self.game = game;
        self.resigned = false;
        self.reported = self.game.status().is_over();
        self.publish();
    }

    /// Declare what the physical board holds. Offsets are reset to centered.
    pub fn declare_physical(&mut self, layout: Snapshot) -> Result<(), ConsoleError> {
        let rig = self.rig_mut()?;
        rig.board.set_position(layout);
        rig.board.set_offsets(OffsetTable::centered());
        self.publish();
        Ok(())
    }

    fn ensure_playing(&self) -> Result<(), ConsoleError> {
        let status = self.status();
        if status.is_over() {
            return Err(ConsoleError::GameOver { status });
        }
        Ok(())
    }

    /// Interpret a sensor reading taken after the human moved.
    ///
    /// On success the game advances and the reading becomes the physical
    /// layout. Anything else leaves both untouched.
    pub fn observe(&mut self, reading: Snapshot) -> Result<Observation, ConsoleError> {
        if self.rig.is_none() {
            return Err(ConsoleError::Busy);
        }
        self.ensure_playing()?;
        if self.game.turn() != self.perspective {
            return Err(ConsoleError::WrongTurn { side: "human" });
        }

        let mv = match classify_diff(&self.game, &reading) {
            Ok(mv) => mv,
            Err(reason) => {
                warn!(%reason, "observed layout is not a move");
                return Ok(Observation::Unidentified(reason));
            }
        };
        if self.game.play(mv).is_err() {
            warn!(%mv, "observed move is illegal");
            return Ok(Observation::Illegal(mv));
        }

        info!(%mv, "human moved");
        if let Some(rig) = self.rig.as_mut() {
            rig.board.set_position(reading);
        }
        let game_over = self.check_game_over();
        self.publish();
        Ok(Observation::Played { mv, game_over })
    }

    /// Count the game once it has ended.
    fn check_game_over(&mut self) -> Option<GameOver> {
        let status = self.status();
        if !status.is_over() || self.reported {
            return None;
        }
        let robot = !self.perspective;
        let result = match status {
            GameStatus::Resigned => RobotResult::Win,
            GameStatus::Draw | GameStatus::Ongoing => RobotResult::Draw,
            _ if status.winner() == Some(robot) => RobotResult::Win,
            _ => RobotResult::Loss,
        };
        match result {
            RobotResult::Win => self.record.robot_wins += 1,
            RobotResult::Loss => self.record.robot_losses += 1,
            RobotResult::Draw => self.record.draws += 1,
        }
        self.reported = true;
        info!(%status, result = result.name(), "game over");
        Some(GameOver { status, result })
    }

    /// The human gives up; the robot is credited with the win.
    pub fn resign(&mut self) -> Result<GameOver, ConsoleError> {
        self.ensure_playing()?;
        self.resigned = true;
        let over = self.check_game_over().ok_or(ConsoleError::GameOver {
            status: GameStatus::Resigned,
        })?;
        self.publish();
        Ok(over)
    }

    /// Change one option. Link settings reach the rig now, or when it
    /// returns from the running task.
    pub fn apply_option(&mut self, option: SessionOption) {
        self.config.apply(option);
        let (timing, width) = (self.config.timing, self.config.frame_width);
        match self.rig.as_mut() {
            Some(rig) => rig.sink.reconfigure(timing, width),
            None => self.pending_reconfigure = true,
        }
    }

    fn lend(&mut self, task: Task) -> Result<(Rig, Task), ConsoleError> {
        let rig = self.rig.take().ok_or(ConsoleError::Busy)?;
        self.publish();
        Ok((rig, task))
    }

    /// Hand out the rig to play the robot's `mv`.
    pub fn begin_robot_move(&mut self, mv: MoveIntent) -> Result<(Rig, Task), ConsoleError> {
        self.ensure_playing()?;
        if self.game.turn() == self.perspective {
            return Err(ConsoleError::WrongTurn { side: "robot" });
        }
        if !self.game.is_legal(mv) {
            return Err(ConsoleError::IllegalMove { uci_move: mv.to_uci() });
        }
        let game = self.game.clone();
        self.lend(Task::RobotMove { game, mv })
    }

    fn reset_target(&self) -> BoardModel<Snapshot> {
        BoardModel::new(self.game.snapshot(), self.perspective)
    }

    /// Hand out the rig to rebuild the game's layout on the physical board.
    pub fn begin_reset(&mut self) -> Result<(Rig, Task), ConsoleError> {
        let task = Task::Reset {
            target: self.reset_target(),
            max_steps: self.config.reset_step_limit,
        };
        self.lend(task)
    }

    /// Hand out the rig for a single reset step.
    pub fn begin_step(&mut self) -> Result<(Rig, Task), ConsoleError> {
        let task = Task::Step {
            target: self.reset_target(),
        };
        self.lend(task)
    }

    /// Hand out the rig for one raw relocation.
    pub fn begin_send(&mut self, from: Location, to: Location) -> Result<(Rig, Task), ConsoleError> {
        self.lend(Task::Send { from, to })
    }

    /// Take the rig back and turn the outcome into reply lines.
    pub fn finish(&mut self, mut rig: Rig, outcome: TaskOutcome) -> Vec<String> {
        if std::mem::take(&mut self.pending_reconfigure) {
            rig.sink.reconfigure(self.config.timing, self.config.frame_width);
        }
        self.rig = Some(rig);

        let mut replies = Vec::with_capacity(2);
        match outcome {
            TaskOutcome::Moved { mv, result: Ok(()) } => {
                match self.game.play(mv) {
                    Ok(()) => replies.push(format!("moved {mv}")),
                    Err(e) => replies.push(format!("failed {e}")),
                }
                if let Some(over) = self.check_game_over() {
                    replies.push(over.reply());
                }
            }
            TaskOutcome::Moved { result: Err(e), .. } => replies.push(format!("failed {e}")),
            TaskOutcome::Reset(Ok(steps)) => replies.push(format!("reset done {steps}")),
            TaskOutcome::Reset(Err(ResetError::Stopped { steps })) => replies.push(format!("reset stopped {steps}")),
            TaskOutcome::Reset(Err(e)) => replies.push(format!("reset failed {e}")),
            TaskOutcome::Step(Ok(ResetProgress::Relocated(relocation))) => {
                replies.push(format!("step {} {}", relocation.from, relocation.to));
            }
            TaskOutcome::Step(Ok(ResetProgress::Done)) => replies.push("step done".to_string()),
            TaskOutcome::Step(Err(e)) => replies.push(format!("step failed {e}")),
            TaskOutcome::Sent {
                response: Response::Success { .. },
                ..
            } => replies.push("sent".to_string()),
            TaskOutcome::Sent {
                relocation,
                response: Response::Failure(fault),
            } => replies.push(format!("failed {relocation}: {fault}")),
        }
        self.publish();
        replies
    }

    /// `status` reply lines.
    pub fn status_lines(&self) -> Vec<String> {
        let view = self.view.read().expect("view lock poisoned").clone();
        let mut lines = vec![
            format!("physical {}", view.physical.placement()),
            format!("logical {}", view.logical.placement()),
            format!("perspective {}", view.perspective),
            format!("turn {}", view.turn),
            format!("status {}", view.status),
            format!("busy {}", view.busy),
            format!(
                "record wins {} losses {} draws {}",
                view.record.robot_wins, view.record.robot_losses, view.record.draws
            ),
        ];
        lines.extend(view.physical.pretty(view.perspective).to_string().lines().map(str::to_string));
        lines.extend(self.config.describe());
        lines
    }
}
