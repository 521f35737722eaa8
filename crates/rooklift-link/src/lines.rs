//! The three signals of the mover link, and a simulated mover behind them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::debug;

use crate::clock::Clock;
use crate::error::LineError;

/// DATA and CLOCK outputs plus the active-low RESPONSE input.
///
/// A backend owns the underlying hardware handles. [`acquire`] is called once
/// before use and [`release`] once at the end, both by
/// [`PhysicalLink`](crate::PhysicalLink).
///
/// [`acquire`]: LinkLines::acquire
/// [`release`]: LinkLines::release
pub trait LinkLines {
    /// Request the lines from the backend.
    fn acquire(&mut self) -> Result<(), LineError>;

    /// Drive DATA.
    fn set_data(&mut self, high: bool) -> Result<(), LineError>;

    /// Drive CLOCK.
    fn set_clock(&mut self, high: bool) -> Result<(), LineError>;

    /// Sample RESPONSE; `true` when it is pulled low (acknowledged).
    fn response_low(&mut self) -> Result<bool, LineError>;

    /// Give the lines back to the backend.
    fn release(&mut self);
}

impl<L: LinkLines + ?Sized> LinkLines for Box<L> {
    fn acquire(&mut self) -> Result<(), LineError> {
        (**self).acquire()
    }

    fn set_data(&mut self, high: bool) -> Result<(), LineError> {
        (**self).set_data(high)
    }

    fn set_clock(&mut self, high: bool) -> Result<(), LineError> {
        (**self).set_clock(high)
    }

    fn response_low(&mut self) -> Result<bool, LineError> {
        (**self).response_low()
    }

    fn release(&mut self) {
        (**self).release();
    }
}

#[derive(Debug, Default)]
struct MoverState {
    acquired: bool,
    data: bool,
    clock: bool,
    frame_bits: u32,
    shift: u32,
    received_bits: u32,
    frames: Vec<u32>,
    ack_at: Option<Duration>,
    scripted: VecDeque<Option<Duration>>,
    default_delay: Option<Duration>,
}

/// A mover peripheral simulated in memory.
///
/// Bits are shifted in on each rising CLOCK edge. When a frame is complete
/// the mover "moves" and pulls RESPONSE low after its acknowledgment delay,
/// counted from the frame's last rising edge and held until the next frame
/// starts. Clones share state, so a test can keep one handle while the link
/// owns another.
#[derive(Debug, Clone)]
pub struct SimulatedLines<C> {
    clock: C,
    state: Arc<Mutex<MoverState>>,
}

impl<C: Clock> SimulatedLines<C> {
    /// A mover reading `frame_bits`-bit frames and acknowledging every one
    /// after `ack_delay`.
    pub fn new(clock: C, frame_bits: u32, ack_delay: Duration) -> Self {
        let state = MoverState {
            frame_bits,
            default_delay: Some(ack_delay),
            ..MoverState::default()
        };
        Self {
            clock,
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, MoverState> {
        self.state.lock().expect("simulated mover mutex poisoned")
    }

    /// Set the acknowledgment delay for frames without a scripted delay.
    /// `None` means never acknowledge.
    pub fn set_ack_delay(&self, delay: Option<Duration>) {
        self.state().default_delay = delay;
    }

    /// Queue acknowledgment delays for the next frames, in order. `None`
    /// makes that frame time out.
    pub fn script<I>(&self, delays: I)
    where
        I: IntoIterator<Item = Option<Duration>>,
    {
        self.state().scripted.extend(delays);
    }

    /// Change the frame width the mover expects.
    pub fn set_frame_bits(&self, bits: u32) {
        let mut state = self.state();
        state.frame_bits = bits;
        state.shift = 0;
        state.received_bits = 0;
    }

    /// Every complete frame received so far.
    pub fn frames(&self) -> Vec<u32> {
        self.state().frames.clone()
    }

    /// `true` between acquire and release.
    pub fn is_acquired(&self) -> bool {
        self.state().acquired
    }

    /// Current level of the DATA and CLOCK outputs.
    pub fn outputs(&self) -> (bool, bool) {
        let state = self.state();
        (state.data, state.clock)
    }
}

impl<C: Clock> LinkLines for SimulatedLines<C> {
    fn acquire(&mut self) -> Result<(), LineError> {
        self.state().acquired = true;
        Ok(())
    }

    fn set_data(&mut self, high: bool) -> Result<(), LineError> {
        let mut state = self.state();
        if !state.acquired {
            return Err(LineError::Released);
        }
        state.data = high;
        Ok(())
    }

    fn set_clock(&mut self, high: bool) -> Result<(), LineError> {
        let now = self.clock.now();
        let mut state = self.state();
        if !state.acquired {
            return Err(LineError::Released);
        }
        let rising = high && !state.clock;
        state.clock = high;
        if !rising {
            return Ok(());
        }

        if state.received_bits == 0 {
            state.ack_at = None;
        }
        state.shift = (state.shift << 1) | u32::from(state.data);
        state.received_bits += 1;

        if state.received_bits >= state.frame_bits {
            let frame = state.shift;
            state.frames.push(frame);
            state.shift = 0;
            state.received_bits = 0;
            let delay = match state.scripted.pop_front() {
                Some(scripted) => scripted,
                None => state.default_delay,
            };
            state.ack_at = delay.map(|d| now + d);
            debug!(frame = format_args!("{frame:#x}"), ack_in = ?delay, "simulated mover received frame");
        }
        Ok(())
    }

    fn response_low(&mut self) -> Result<bool, LineError> {
        let now = self.clock.now();
        let state = self.state();
        if !state.acquired {
            return Err(LineError::Released);
        }
        Ok(state.ack_at.is_some_and(|at| now >= at))
    }

    fn release(&mut self) {
        let mut state = self.state();
        state.acquired = false;
        state.ack_at = None;
    }
}
