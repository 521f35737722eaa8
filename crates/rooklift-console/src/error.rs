//! Console protocol errors.

use rooklift_core::{GameStatus, MoveParseError, PlacementError};

/// Errors that can occur while parsing or executing console commands.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The `position` command is missing `startpos` or `fen` keyword.
    #[error("malformed position command: missing startpos or fen keyword")]
    MalformedPosition,

    /// A command is missing a required argument.
    #[error("{command}: missing {argument}")]
    MissingArgument {
        /// The command name.
        command: &'static str,
        /// What was expected.
        argument: &'static str,
    },

    /// Failed to parse a FEN string.
    #[error("invalid FEN: {fen}")]
    InvalidFen {
        /// The FEN string that failed to parse.
        fen: String,
    },

    /// Failed to parse a piece placement.
    #[error("invalid placement: {source}")]
    InvalidPlacement {
        #[from]
        source: PlacementError,
    },

    /// Move text could not be parsed.
    #[error("invalid move: {source}")]
    InvalidMove {
        #[from]
        source: MoveParseError,
    },

    /// A move is not legal in the current position.
    #[error("illegal move: {uci_move}")]
    IllegalMove {
        /// The move in UCI notation.
        uci_move: String,
    },

    /// A square or slot name could not be parsed.
    #[error("invalid location: {text}")]
    InvalidLocation {
        /// The offending text.
        text: String,
    },

    /// A color name could not be parsed.
    #[error("invalid color: {text}")]
    InvalidColor {
        /// The offending text.
        text: String,
    },

    /// `setoption` named an option that does not exist.
    #[error("unknown option: {name}")]
    UnknownOption {
        /// The option name as given.
        name: String,
    },

    /// `setoption` value could not be parsed for the option.
    #[error("invalid value for option {name}: {value}")]
    InvalidOptionValue {
        /// The option name.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// The hardware is owned by a running task.
    #[error("busy")]
    Busy,

    /// The game has already ended.
    #[error("game is over ({status})")]
    GameOver {
        /// How it ended.
        status: GameStatus,
    },

    /// The command belongs to the other side's turn.
    #[error("not {side}'s turn")]
    WrongTurn {
        /// The side that tried to move.
        side: &'static str,
    },

    /// An I/O error occurred on the console streams.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
