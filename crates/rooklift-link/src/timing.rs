//! Link timing and frame configuration.

use std::time::Duration;

/// How many bits of each 32-bit command go on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameWidth {
    /// The 16 most significant bits: from location and offset x. This is
    /// what the deployed mover firmware reads.
    #[default]
    Upper16,
    /// All 32 bits. Needs firmware that clocks in a full word.
    Full32,
}

impl FrameWidth {
    /// Number of bits per frame.
    pub const fn bits(self) -> u32 {
        match self {
            FrameWidth::Upper16 => 16,
            FrameWidth::Full32 => 32,
        }
    }

    /// Frame width for a bit count, if supported.
    pub const fn from_bits(bits: u32) -> Option<FrameWidth> {
        match bits {
            16 => Some(FrameWidth::Upper16),
            32 => Some(FrameWidth::Full32),
            _ => None,
        }
    }
}

/// Delays and acknowledgment window used by the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTiming {
    /// Hold time after each CLOCK edge.
    pub edge_delay: Duration,
    /// Pause between the last CLOCK edge and the first RESPONSE sample.
    pub settle_delay: Duration,
    /// Acknowledgments earlier than this are noise.
    pub ack_min: Duration,
    /// Acknowledgments later than this never count.
    pub ack_max: Duration,
    /// RESPONSE sampling period.
    pub poll_interval: Duration,
}

impl LinkTiming {
    /// Timing with no clock-edge or settle delays, for simulated links.
    pub fn instant_edges(self) -> LinkTiming {
        LinkTiming {
            edge_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
            ..self
        }
    }
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            edge_delay: Duration::from_millis(200),
            settle_delay: Duration::from_millis(200),
            ack_min: Duration::from_millis(100),
            ack_max: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{FrameWidth, LinkTiming};

    #[test]
    fn default_window() {
        let timing = LinkTiming::default();
        assert_eq!(timing.ack_min, Duration::from_millis(100));
        assert_eq!(timing.ack_max, Duration::from_secs(10));
        assert!(timing.poll_interval <= timing.ack_min);
    }

    #[test]
    fn instant_edges_keeps_window() {
        let timing = LinkTiming::default().instant_edges();
        assert_eq!(timing.edge_delay, Duration::ZERO);
        assert_eq!(timing.settle_delay, Duration::ZERO);
        assert_eq!(timing.ack_max, Duration::from_secs(10));
    }

    #[test]
    fn frame_widths() {
        assert_eq!(FrameWidth::default().bits(), 16);
        assert_eq!(FrameWidth::from_bits(32), Some(FrameWidth::Full32));
        assert_eq!(FrameWidth::from_bits(8), None);
    }
}
