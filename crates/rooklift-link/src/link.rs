//! The bit-serial link to the mover.
//!
//! A command is clocked out MSB first on DATA, one bit per CLOCK pulse. The
//! mover then pulls RESPONSE low once it has finished the relocation. The
//! acknowledgment only counts if it arrives inside the plausibility window
//! of [`LinkTiming`]: too early is noise, too late is a timeout.

use std::time::Duration;

use rooklift_core::Command;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{LineError, LinkFault};
use crate::lines::LinkLines;
use crate::timing::{FrameWidth, LinkTiming};

/// Outcome of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Acknowledged inside the window, `elapsed` after polling started.
    Success { elapsed: Duration },
    /// Rejected acknowledgment, timeout, or line failure.
    Failure(LinkFault),
}

impl Response {
    /// `true` for [`Response::Success`].
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    /// The fault, if the command failed.
    pub fn fault(&self) -> Option<&LinkFault> {
        match self {
            Response::Success { .. } => None,
            Response::Failure(fault) => Some(fault),
        }
    }

    /// Convert into a `Result`, keeping the fault.
    pub fn into_result(self) -> Result<Duration, LinkFault> {
        match self {
            Response::Success { elapsed } => Ok(elapsed),
            Response::Failure(fault) => Err(fault),
        }
    }
}

impl From<LinkFault> for Response {
    fn from(fault: LinkFault) -> Self {
        Response::Failure(fault)
    }
}

/// Anything that executes relocation commands one at a time.
///
/// [`PhysicalLink`] is the hardware implementation. Higher layers only see
/// this trait so they can run against a recording sink in tests.
pub trait CommandSink {
    /// Execute `command` and wait for its outcome.
    fn send(&mut self, command: Command) -> Response;

    /// Adopt new timing and frame width for later commands. Sinks without
    /// timing ignore this.
    fn reconfigure(&mut self, _timing: LinkTiming, _width: FrameWidth) {}
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn send(&mut self, command: Command) -> Response {
        (**self).send(command)
    }

    fn reconfigure(&mut self, timing: LinkTiming, width: FrameWidth) {
        (**self).reconfigure(timing, width);
    }
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn send(&mut self, command: Command) -> Response {
        (**self).send(command)
    }

    fn reconfigure(&mut self, timing: LinkTiming, width: FrameWidth) {
        (**self).reconfigure(timing, width);
    }
}

/// Owns the three link lines for its whole lifetime.
///
/// Lines are acquired in [`PhysicalLink::open`] and released when the link
/// is dropped, with both outputs driven low first. Only one command is ever
/// outstanding: [`send`](CommandSink::send) blocks until the acknowledgment
/// resolves.
#[derive(Debug)]
pub struct PhysicalLink<L: LinkLines, C: Clock> {
    lines: L,
    clock: C,
    timing: LinkTiming,
    width: FrameWidth,
    released: bool,
}

impl<L: LinkLines, C: Clock> PhysicalLink<L, C> {
    /// Acquire `lines` and drive both outputs low.
    pub fn open(mut lines: L, clock: C, timing: LinkTiming, width: FrameWidth) -> Result<Self, LineError> {
        lines.acquire()?;
        if let Err(err) = lines.set_data(false).and_then(|()| lines.set_clock(false)) {
            lines.release();
            return Err(err);
        }
        info!(bits = width.bits(), "link lines acquired");
        Ok(Self {
            lines,
            clock,
            timing,
            width,
            released: false,
        })
    }

    /// Current timing.
    pub fn timing(&self) -> LinkTiming {
        self.timing
    }

    /// Replace the timing used by subsequent commands.
    pub fn set_timing(&mut self, timing: LinkTiming) {
        self.timing = timing;
    }

    /// Current frame width.
    pub fn frame_width(&self) -> FrameWidth {
        self.width
    }

    /// Change how many command bits go on the wire.
    pub fn set_frame_width(&mut self, width: FrameWidth) {
        self.width = width;
    }

    /// Drive both outputs low and release the lines. Also done on drop.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        // Best effort: the lines go back to the backend either way.
        let _ = self.lines.set_data(false);
        let _ = self.lines.set_clock(false);
        self.lines.release();
        info!("link lines released");
    }

    /// Clock the frame out, MSB first.
    fn transmit(&mut self, command: Command) -> Result<(), LineError> {
        let bits = self.width.bits();
        let frame = match self.width {
            FrameWidth::Upper16 => u32::from(command.upper_half()),
            FrameWidth::Full32 => command.raw(),
        };
        for i in (0..bits).rev() {
            let bit = (frame >> i) & 1 == 1;
            self.lines.set_data(bit)?;
            self.lines.set_clock(true)?;
            self.clock.sleep(self.timing.edge_delay);
            self.lines.set_clock(false)?;
            self.clock.sleep(self.timing.edge_delay);
        }
        debug!(frame = format_args!("{frame:#x}"), bits, "frame transmitted");
        Ok(())
    }

    /// Poll RESPONSE until it goes low or the window closes.
    ///
    /// The last sample is aimed at exactly `ack_max`, so an acknowledgment
    /// arriving on the boundary still counts. A sample that lands past
    /// `ack_max` is a timeout whatever RESPONSE reads.
    fn await_ack(&mut self) -> Result<Duration, LinkFault> {
        let LinkTiming {
            ack_min,
            ack_max,
            poll_interval,
            ..
        } = self.timing;
        let start = self.clock.now();
        loop {
            let elapsed = self.clock.now().saturating_sub(start);
            if elapsed > ack_max {
                return Err(LinkFault::Timeout { waited: elapsed });
            }
            if self.lines.response_low()? {
                if elapsed < ack_min {
                    return Err(LinkFault::NoiseRejected { elapsed });
                }
                return Ok(elapsed);
            }
            if elapsed >= ack_max {
                return Err(LinkFault::Timeout { waited: elapsed });
            }
            let remaining = ack_max - elapsed;
            self.clock.sleep(poll_interval.min(remaining).max(Duration::from_micros(1)));
        }
    }
}

impl<L: LinkLines, C: Clock> CommandSink for PhysicalLink<L, C> {
    fn send(&mut self, command: Command) -> Response {
        if self.released {
            return Response::Failure(LineError::Released.into());
        }
        if let Err(err) = self.transmit(command) {
            warn!(?command, %err, "transmit failed");
            return Response::Failure(err.into());
        }
        self.clock.sleep(self.timing.settle_delay);

        match self.await_ack() {
            Ok(elapsed) => {
                debug!(?command, elapsed_ms = elapsed.as_millis() as u64, "acknowledged");
                Response::Success { elapsed }
            }
            Err(fault) => {
                warn!(?command, %fault, "command not acknowledged");
                Response::Failure(fault)
            }
        }
    }

    fn reconfigure(&mut self, timing: LinkTiming, width: FrameWidth) {
        self.timing = timing;
        self.width = width;
        info!(bits = width.bits(), ack_max_ms = timing.ack_max.as_millis() as u64, "link reconfigured");
    }
}

impl<L: LinkLines, C: Clock> Drop for PhysicalLink<L, C> {
    fn drop(&mut self) {
        self.release();
    }
}
