//! Line-oriented control console for the rooklift robot.

pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod game;
pub mod session;
pub mod task;

pub use command::{Command, parse_command};
pub use config::{SessionConfig, SessionOption};
pub use console::Console;
pub use error::ConsoleError;
pub use game::ChessGame;
pub use session::{GameOver, Observation, RobotResult, Session};
pub use task::{BoardView, Record, Rig, SharedView, Task, TaskOutcome, run_task};
