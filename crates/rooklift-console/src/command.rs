//! Console command parsing.

use rooklift_core::{Color, Location, MoveIntent, Snapshot};

use crate::config::SessionOption;
use crate::error::ConsoleError;
use crate::game::ChessGame;

/// A parsed console command.
#[derive(Debug)]
pub enum Command {
    /// `isready` -- synchronization ping.
    IsReady,
    /// `newgame [white|black]` -- fresh game, human playing the given side.
    NewGame(Color),
    /// `position` -- set the logical game with optional moves applied.
    Position(ChessGame),
    /// `physical` -- declare what is on the physical board.
    Physical(Snapshot),
    /// `observe` -- a sensor reading after the human moved.
    Observe(Snapshot),
    /// `robot <move>` -- play a move with the robot.
    Robot(MoveIntent),
    /// `reset` -- rearrange the physical board to match the game.
    Reset,
    /// `step` -- a single reset relocation.
    Step,
    /// `send <from> <to>` -- one raw relocation.
    Send(Location, Location),
    /// `resign` -- the human gives up.
    Resign,
    /// `setoption name <name> value <value>`.
    SetOption(SessionOption),
    /// `status` -- print the shared board view.
    Status,
    /// `stop` -- halt the running task at the next relocation boundary.
    Stop,
    /// `quit` -- finish the running task and exit.
    Quit,
    /// Unrecognized command (ignored).
    Unknown(String),
}

impl Command {
    /// Commands that must wait while the hardware is busy.
    pub fn needs_idle(&self) -> bool {
        !matches!(self, Command::Status | Command::Stop | Command::Quit | Command::Unknown(_))
    }
}

/// Parse a single line of console input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, ConsoleError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Command::Unknown(String::new()));
    }

    match tokens[0] {
        "isready" => Ok(Command::IsReady),
        "newgame" => parse_newgame(&tokens[1..]),
        "position" => parse_position(&tokens[1..]),
        "physical" => parse_physical(&tokens[1..]),
        "observe" => {
            let text = require(&tokens[1..], "observe", "placement")?;
            Ok(Command::Observe(text.parse()?))
        }
        "robot" => {
            let text = require(&tokens[1..], "robot", "move")?;
            Ok(Command::Robot(text.parse()?))
        }
        "reset" => Ok(Command::Reset),
        "step" => Ok(Command::Step),
        "send" => parse_send(&tokens[1..]),
        "resign" => Ok(Command::Resign),
        "setoption" => parse_setoption(&tokens[1..]),
        "status" => Ok(Command::Status),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        _ => Ok(Command::Unknown(tokens[0].to_string())),
    }
}

fn require<'a>(tokens: &[&'a str], command: &'static str, argument: &'static str) -> Result<&'a str, ConsoleError> {
    tokens
        .first()
        .copied()
        .ok_or(ConsoleError::MissingArgument { command, argument })
}

fn parse_newgame(tokens: &[&str]) -> Result<Command, ConsoleError> {
    let Some(&text) = tokens.first() else {
        return Ok(Command::NewGame(Color::White));
    };
    let color = text
        .parse::<Color>()
        .map_err(|()| ConsoleError::InvalidColor { text: text.to_string() })?;
    Ok(Command::NewGame(color))
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 e7e5 ...]`
/// - `position fen <fen-string> [moves e2e4 e7e5 ...]`
fn parse_position(tokens: &[&str]) -> Result<Command, ConsoleError> {
    if tokens.is_empty() {
        return Err(ConsoleError::MalformedPosition);
    }

    let (mut game, rest) = if tokens[0] == "startpos" {
        (ChessGame::new(), &tokens[1..])
    } else if tokens[0] == "fen" {
        let end = tokens.iter().position(|&t| t == "moves").unwrap_or(tokens.len());
        let fen = tokens[1..end].join(" ");
        (ChessGame::from_fen(&fen)?, &tokens[end..])
    } else {
        return Err(ConsoleError::MalformedPosition);
    };

    if rest.first() == Some(&"moves") {
        for text in &rest[1..] {
            let mv: MoveIntent = text.parse()?;
            game.play(mv)?;
        }
    }

    Ok(Command::Position(game))
}

fn parse_physical(tokens: &[&str]) -> Result<Command, ConsoleError> {
    let text = require(tokens, "physical", "placement")?;
    if text == "startpos" {
        return Ok(Command::Physical(Snapshot::starting_position()));
    }
    Ok(Command::Physical(text.parse()?))
}

fn parse_send(tokens: &[&str]) -> Result<Command, ConsoleError> {
    let location = |index: usize, argument: &'static str| -> Result<Location, ConsoleError> {
        let text = tokens
            .get(index)
            .ok_or(ConsoleError::MissingArgument { command: "send", argument })?;
        text.parse::<Location>()
            .map_err(|()| ConsoleError::InvalidLocation { text: text.to_string() })
    };
    Ok(Command::Send(location(0, "from")?, location(1, "to")?))
}

/// Parse `setoption name <name> value <value>`. Names may not contain spaces.
fn parse_setoption(tokens: &[&str]) -> Result<Command, ConsoleError> {
    let missing = |argument| ConsoleError::MissingArgument {
        command: "setoption",
        argument,
    };
    match tokens {
        ["name", name, "value", value, ..] => Ok(Command::SetOption(SessionOption::parse(name, value)?)),
        ["name", _, ..] => Err(missing("value")),
        _ => Err(missing("name")),
    }
}
