//! Scripted console sessions over a simulated link.

use std::time::Duration;

use rooklift_console::{Console, Rig, Session, SessionConfig};
use rooklift_core::{Color, Command, GameEngine, Location, Offset, Square, encode};
use rooklift_link::{
    CommandSink, FrameWidth, LinkTiming, ManualClock, PhysicalLink, Response, SimulatedLines,
};

/// Simulated link whose mover follows frame width changes.
struct Sim {
    link: PhysicalLink<SimulatedLines<ManualClock>, ManualClock>,
    mover: SimulatedLines<ManualClock>,
}

impl CommandSink for Sim {
    fn send(&mut self, command: Command) -> Response {
        self.link.send(command)
    }

    fn reconfigure(&mut self, timing: LinkTiming, width: FrameWidth) {
        self.mover.set_frame_bits(width.bits());
        self.link.reconfigure(timing, width);
    }
}

/// Acknowledges every command after a short real delay.
struct Slow;

impl CommandSink for Slow {
    fn send(&mut self, _command: Command) -> Response {
        std::thread::sleep(Duration::from_millis(20));
        Response::Success {
            elapsed: Duration::from_millis(20),
        }
    }
}

fn simulated() -> (Rig, SimulatedLines<ManualClock>) {
    let clock = ManualClock::new();
    let mover = SimulatedLines::new(clock.clone(), 16, Duration::from_millis(1500));
    let probe = mover.clone();
    let link = PhysicalLink::open(
        mover.clone(),
        clock,
        LinkTiming::default().instant_edges(),
        FrameWidth::Upper16,
    )
    .unwrap();
    (Rig::new(Box::new(Sim { link, mover }), Color::White), probe)
}

/// Run `script` to end of input and return the reply lines and the session.
fn run(rig: Rig, script: &'static str) -> (Vec<String>, Session) {
    let mut output = Vec::new();
    let session = Console::new(Session::new(SessionConfig::default(), rig))
        .run_with(script.as_bytes(), &mut output)
        .unwrap();
    let text = String::from_utf8(output).unwrap();
    (text.lines().map(str::to_string).collect(), session)
}

#[test]
fn game_turns_alternate() {
    let (rig, probe) = simulated();
    let script = "isready\n\
                  observe rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR\n\
                  robot e7e5\n\
                  observe rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R\n\
                  robot b8c6\n";
    let (replies, session) = run(rig, script);
    assert_eq!(replies, ["readyok", "observed e2e4", "moved e7e5", "observed g1f3", "moved b8c6"]);
    assert_eq!(probe.frames().len(), 2);
    assert_eq!(
        session.physical().unwrap().position().placement(),
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R"
    );
}

#[test]
fn robot_mate_is_reported() {
    let (rig, _probe) = simulated();
    let script = "observe rnbqkbnr/pppppppp/8/8/8/5P2/PPPPP1PP/RNBQKBNR\n\
                  robot e7e5\n\
                  observe rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR\n\
                  robot d8h4\n\
                  resign\n";
    let (replies, session) = run(rig, script);
    assert_eq!(replies[3], "moved d8h4");
    assert_eq!(replies[4], "gameover 0-1 robot win");
    assert_eq!(replies[5], "error game is over (0-1)");
    assert_eq!(session.record().robot_wins, 1);
}

#[test]
fn bad_input_is_reported_not_fatal() {
    let (rig, _probe) = simulated();
    let script = "robot e2e4\n\
                  frobnicate\n\
                  position fen bad\n\
                  setoption name Hash value 16\n\
                  observe 8/8\n\
                  isready\n";
    let (replies, _session) = run(rig, script);
    assert_eq!(replies.len(), 5);
    assert_eq!(replies[0], "error not robot's turn");
    assert!(replies[1].starts_with("error invalid FEN"));
    assert!(replies[2].starts_with("error unknown option"));
    assert!(replies[3].starts_with("error invalid placement"));
    assert_eq!(replies[4], "readyok");
}

#[test]
fn reset_rebuilds_empty_board() {
    let (rig, probe) = simulated();
    let (replies, session) = run(rig, "physical 8/8/8/8/8/8/8/8\nreset\n");
    assert_eq!(replies, ["reset done 32"]);
    assert_eq!(probe.frames().len(), 32);
    assert_eq!(
        session.physical().unwrap().position().placement(),
        rooklift_core::STARTING_PLACEMENT
    );
}

#[test]
fn frame_width_follows_option() {
    let (rig, probe) = simulated();
    let script = "physical startpos\n\
                  setoption name FrameBits value 32\n\
                  send e2 e4\n";
    let (replies, _session) = run(rig, script);
    assert_eq!(replies, ["sent"]);
    let e2 = Location::Board(Square::from_algebraic("e2").unwrap());
    let e4 = Location::Board(Square::from_algebraic("e4").unwrap());
    let expected = encode(e2, e4, Offset::CENTER, Color::White);
    assert_eq!(probe.frames(), [expected.raw()]);
}

#[test]
fn late_ack_fails_send() {
    let (rig, _probe) = simulated();
    let (replies, session) = run(rig, "setoption name AckMax value 500\nsend e2 e4\n");
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("failed e2 -> e4"), "{}", replies[0]);
    assert!(session.physical().unwrap().piece_at(Square::from_algebraic("e2").unwrap()).is_some());
}

#[test]
fn quit_stops_reset() {
    let rig = Rig::new(Box::new(Slow), Color::White);
    let (replies, session) = run(rig, "physical 8/8/8/8/8/8/8/8\nreset\nisready\nquit\n");
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("reset stopped"), "{}", replies[0]);
    let placed = session.physical().unwrap().position().count();
    assert!(placed < 32);
}

#[test]
fn new_game_as_black_lets_robot_open() {
    let (rig, _probe) = simulated();
    let (replies, session) = run(rig, "newgame black\nrobot e2e4\n");
    assert_eq!(replies, ["moved e2e4"]);
    assert_eq!(session.perspective(), Color::Black);
    assert_eq!(session.game().turn(), Color::Black);
}
