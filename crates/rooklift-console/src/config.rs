//! Session configuration and the options `setoption` can change.

use std::time::Duration;

use rooklift_link::{FrameWidth, LinkTiming};

use crate::error::ConsoleError;

/// Knobs adjustable via `setoption`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Link delays and acknowledgment window.
    pub timing: LinkTiming,
    /// Bits per command frame.
    pub frame_width: FrameWidth,
    /// Relocations allowed for one `reset` before giving up.
    pub reset_step_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timing: LinkTiming::default(),
            frame_width: FrameWidth::default(),
            reset_step_limit: 256,
        }
    }
}

/// One `setoption` assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOption {
    EdgeDelay(Duration),
    SettleDelay(Duration),
    AckMin(Duration),
    AckMax(Duration),
    PollInterval(Duration),
    FrameBits(FrameWidth),
    ResetStepLimit(usize),
}

impl SessionOption {
    /// Parse `name` and `value` as given after `setoption name ... value`.
    /// Names are case-insensitive; durations are in milliseconds.
    pub fn parse(name: &str, value: &str) -> Result<SessionOption, ConsoleError> {
        let invalid = || ConsoleError::InvalidOptionValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        let millis = || value.parse::<u64>().map(Duration::from_millis).map_err(|_| invalid());

        let option = match name.to_ascii_lowercase().as_str() {
            "edgedelay" => SessionOption::EdgeDelay(millis()?),
            "settledelay" => SessionOption::SettleDelay(millis()?),
            "ackmin" => SessionOption::AckMin(millis()?),
            "ackmax" => SessionOption::AckMax(millis()?),
            "pollinterval" => {
                let interval = millis()?;
                if interval.is_zero() {
                    return Err(invalid());
                }
                SessionOption::PollInterval(interval)
            }
            "framebits" => {
                let bits = value.parse().map_err(|_| invalid())?;
                SessionOption::FrameBits(FrameWidth::from_bits(bits).ok_or_else(invalid)?)
            }
            "resetsteplimit" => SessionOption::ResetStepLimit(value.parse().map_err(|_| invalid())?),
            _ => {
                return Err(ConsoleError::UnknownOption {
                    name: name.to_string(),
                });
            }
        };
        Ok(option)
    }
}

impl SessionConfig {
    /// Apply one option.
    pub fn apply(&mut self, option: SessionOption) {
        match option {
            SessionOption::EdgeDelay(d) => self.timing.edge_delay = d,
            SessionOption::SettleDelay(d) => self.timing.settle_delay = d,
            SessionOption::AckMin(d) => self.timing.ack_min = d,
            SessionOption::AckMax(d) => self.timing.ack_max = d,
            SessionOption::PollInterval(d) => self.timing.poll_interval = d,
            SessionOption::FrameBits(width) => self.frame_width = width,
            SessionOption::ResetStepLimit(limit) => self.reset_step_limit = limit,
        }
    }

    /// Options in `option name ... default ...` form, for `status`.
    pub fn describe(&self) -> Vec<String> {
        let ms = |d: Duration| d.as_millis();
        vec![
            format!("option name EdgeDelay value {}", ms(self.timing.edge_delay)),
            format!("option name SettleDelay value {}", ms(self.timing.settle_delay)),
            format!("option name AckMin value {}", ms(self.timing.ack_min)),
            format!("option name AckMax value {}", ms(self.timing.ack_max)),
            format!("option name PollInterval value {}", ms(self.timing.poll_interval)),
            format!("option name FrameBits value {}", self.frame_width.bits()),
            format!("option name ResetStepLimit value {}", self.reset_step_limit),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rooklift_link::FrameWidth;

    use super::{SessionConfig, SessionOption};
    use crate::error::ConsoleError;

    #[test]
    fn parses_known_options() {
        assert_eq!(
            SessionOption::parse("AckMax", "5000").unwrap(),
            SessionOption::AckMax(Duration::from_secs(5))
        );
        assert_eq!(
            SessionOption::parse("framebits", "32").unwrap(),
            SessionOption::FrameBits(FrameWidth::Full32)
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            SessionOption::parse("FrameBits", "24"),
            Err(ConsoleError::InvalidOptionValue { .. })
        ));
        assert!(matches!(
            SessionOption::parse("PollInterval", "0"),
            Err(ConsoleError::InvalidOptionValue { .. })
        ));
        assert!(matches!(
            SessionOption::parse("Hash", "16"),
            Err(ConsoleError::UnknownOption { .. })
        ));
    }

    #[test]
    fn apply_updates_timing() {
        let mut config = SessionConfig::default();
        config.apply(SessionOption::AckMin(Duration::from_millis(250)));
        config.apply(SessionOption::ResetStepLimit(10));
        assert_eq!(config.timing.ack_min, Duration::from_millis(250));
        assert_eq!(config.reset_step_limit, 10);
        assert!(config.describe().contains(&"option name AckMin value 250".to_string()));
    }
}
