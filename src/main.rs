use std::time::Duration;

use anyhow::Result;
use rooklift_console::{Console, Rig, Session, SessionConfig};
use rooklift_core::{Color, Command};
use rooklift_link::{
    CommandSink, FrameWidth, LinkTiming, ManualClock, PhysicalLink, Response, SimulatedLines,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Acknowledgment delay of the simulated mover.
const SIMULATED_ACK: Duration = Duration::from_millis(1500);

/// A link to the simulated mover, on a clock that advances instead of
/// sleeping. The mover follows frame width changes.
struct DryRun {
    link: PhysicalLink<SimulatedLines<ManualClock>, ManualClock>,
    mover: SimulatedLines<ManualClock>,
}

impl CommandSink for DryRun {
    fn send(&mut self, command: Command) -> Response {
        self.link.send(command)
    }

    fn reconfigure(&mut self, timing: LinkTiming, width: FrameWidth) {
        self.mover.set_frame_bits(width.bits());
        self.link.reconfigure(timing, width);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    info!("rooklift starting");

    let config = SessionConfig::default();
    let clock = ManualClock::new();
    let mover = SimulatedLines::new(clock.clone(), config.frame_width.bits(), SIMULATED_ACK);
    let link = PhysicalLink::open(mover.clone(), clock, config.timing, config.frame_width)?;
    let rig = Rig::new(Box::new(DryRun { link, mover }), Color::White);

    Console::new(Session::new(config, rig)).run()?;
    Ok(())
}
