//! Event-driven console loop.
//!
//! Commands arrive from a reader thread; hardware tasks run on a worker
//! thread that owns the [`Rig`] until it reports back. While a task runs,
//! `status`, `stop` and `quit` are answered at once and everything else
//! waits its turn in a backlog.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use tracing::{debug, info, warn};

use crate::command::{Command, parse_command};
use crate::error::ConsoleError;
use crate::session::{Observation, Session};
use crate::task::{Rig, Task, TaskOutcome, run_task};

/// Events processed by the console loop.
enum ConsoleEvent {
    Command(Result<Command, ConsoleError>),
    TaskDone(TaskDone),
    InputClosed,
}

/// Payload returned by the worker when its task ends.
struct TaskDone {
    rig: Rig,
    outcome: TaskOutcome,
}

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// The console front end over a [`Session`].
pub struct Console {
    session: Session,
    stop_flag: Arc<AtomicBool>,
    backlog: VecDeque<Command>,
}

impl Console {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            stop_flag: Arc::new(AtomicBool::new(false)),
            backlog: VecDeque::new(),
        }
    }

    /// Run on stdin and stdout until `quit` or end of input.
    pub fn run(self) -> Result<(), ConsoleError> {
        let stdout = io::stdout();
        self.run_with(BufReader::new(io::stdin()), &mut stdout.lock())?;
        Ok(())
    }

    /// Run on arbitrary streams. Returns the session once the loop ends.
    ///
    /// End of input lets the running task and the backlog finish; `quit`
    /// stops the running task at its next boundary and drops the backlog.
    pub fn run_with<R, W>(mut self, input: R, output: &mut W) -> Result<Session, ConsoleError>
    where
        R: BufRead + Send + 'static,
        W: Write,
    {
        let (tx, rx) = mpsc::channel::<ConsoleEvent>();

        let input_tx = tx.clone();
        std::thread::spawn(move || {
            for line in input.lines() {
                let Ok(line) = line else { break };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                debug!(cmd = %trimmed, "received command");
                if input_tx.send(ConsoleEvent::Command(parse_command(trimmed))).is_err() {
                    return;
                }
            }
            let _ = input_tx.send(ConsoleEvent::InputClosed);
        });

        let mut closing = false;
        for event in &rx {
            match event {
                ConsoleEvent::Command(Ok(cmd)) => {
                    if self.session.is_busy() && cmd.needs_idle() {
                        debug!(?cmd, "queued while busy");
                        self.backlog.push_back(cmd);
                    } else if self.dispatch(cmd, &tx, output)? == Flow::Quit {
                        self.shutdown(&rx, output)?;
                        break;
                    }
                }
                ConsoleEvent::Command(Err(e)) => {
                    warn!(error = %e, "command rejected");
                    writeln!(output, "error {e}")?;
                }
                ConsoleEvent::TaskDone(done) => {
                    self.finish_task(done, output)?;
                    if self.drain_backlog(&tx, output)? == Flow::Quit {
                        self.shutdown(&rx, output)?;
                        break;
                    }
                }
                ConsoleEvent::InputClosed => closing = true,
            }
            output.flush()?;
            if closing && !self.session.is_busy() && self.backlog.is_empty() {
                break;
            }
        }

        output.flush()?;
        info!("console shutting down");
        Ok(self.session)
    }

    /// Handle queued commands until one starts a task or the queue empties.
    fn drain_backlog<W: Write>(&mut self, tx: &mpsc::Sender<ConsoleEvent>, output: &mut W) -> Result<Flow, ConsoleError> {
        while !self.session.is_busy() {
            let Some(cmd) = self.backlog.pop_front() else { break };
            if self.dispatch(cmd, tx, output)? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Stop any running task and wait for the worker to return the rig.
    fn shutdown<W: Write>(&mut self, rx: &mpsc::Receiver<ConsoleEvent>, output: &mut W) -> Result<(), ConsoleError> {
        self.backlog.clear();
        if !self.session.is_busy() {
            return Ok(());
        }
        self.stop_flag.store(true, Ordering::Release);
        for event in rx {
            if let ConsoleEvent::TaskDone(done) = event {
                self.finish_task(done, output)?;
                break;
            }
        }
        Ok(())
    }

    fn finish_task<W: Write>(&mut self, done: TaskDone, output: &mut W) -> Result<(), ConsoleError> {
        for reply in self.session.finish(done.rig, done.outcome) {
            writeln!(output, "{reply}")?;
        }
        Ok(())
    }

    fn dispatch<W: Write>(
        &mut self,
        cmd: Command,
        tx: &mpsc::Sender<ConsoleEvent>,
        output: &mut W,
    ) -> Result<Flow, ConsoleError> {
        let result = match cmd {
            Command::IsReady => {
                writeln!(output, "readyok")?;
                Ok(())
            }
            Command::NewGame(perspective) => self.session.new_game(perspective),
            Command::Position(game) => {
                self.session.set_game(game);
                Ok(())
            }
            Command::Physical(layout) => self.session.declare_physical(layout),
            Command::Observe(reading) => self.session.observe(reading).and_then(|observation| {
                match observation {
                    Observation::Played { mv, game_over } => {
                        writeln!(output, "observed {mv}")?;
                        if let Some(over) = game_over {
                            writeln!(output, "{}", over.reply())?;
                        }
                    }
                    Observation::Unidentified(_) => writeln!(output, "unidentified")?,
                    Observation::Illegal(mv) => writeln!(output, "illegal {mv}")?,
                }
                Ok(())
            }),
            Command::Robot(mv) => self.session.begin_robot_move(mv).map(|job| self.spawn(job, tx)),
            Command::Reset => self.session.begin_reset().map(|job| self.spawn(job, tx)),
            Command::Step => self.session.begin_step().map(|job| self.spawn(job, tx)),
            Command::Send(from, to) => self.session.begin_send(from, to).map(|job| self.spawn(job, tx)),
            Command::Resign => self.session.resign().and_then(|over| {
                writeln!(output, "{}", over.reply())?;
                Ok(())
            }),
            Command::SetOption(option) => {
                self.session.apply_option(option);
                Ok(())
            }
            Command::Status => {
                for line in self.session.status_lines() {
                    writeln!(output, "{line}")?;
                }
                Ok(())
            }
            Command::Stop => {
                self.stop_flag.store(true, Ordering::Release);
                Ok(())
            }
            Command::Quit => return Ok(Flow::Quit),
            Command::Unknown(name) => {
                debug!(%name, "ignoring unknown command");
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            Err(ConsoleError::Io { source }) => return Err(ConsoleError::Io { source }),
            Err(e) => {
                warn!(error = %e, "command failed");
                writeln!(output, "error {e}")?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Run `task` on a worker thread with a fresh stop flag.
    fn spawn(&mut self, (mut rig, task): (Rig, Task), tx: &mpsc::Sender<ConsoleEvent>) {
        self.stop_flag = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&self.stop_flag);
        let view = self.session.view();
        let tx = tx.clone();
        debug!(?task, "starting task");

        std::thread::spawn(move || {
            let outcome = run_task(&mut rig, task, &stop, &view);
            let _ = tx.send(ConsoleEvent::TaskDone(TaskDone { rig, outcome }));
        });
    }
}
