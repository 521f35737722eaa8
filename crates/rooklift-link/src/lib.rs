//! The hardware link between the host and the piece mover: three signal
//! lines, a time source, and the timing-qualified command exchange on top.

mod clock;
mod error;
mod link;
mod lines;
mod timing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LineError, LinkFault};
pub use lines::{LinkLines, SimulatedLines};
pub use link::{CommandSink, PhysicalLink, Response};
pub use timing::{FrameWidth, LinkTiming};
