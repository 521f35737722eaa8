//! Link failures.

use std::time::Duration;

/// Errors raised by a line backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    /// A line could not be requested from the backend.
    #[error("line {line} unavailable: {reason}")]
    Unavailable {
        /// Which signal: DATA, CLOCK or RESPONSE.
        line: &'static str,
        /// Backend-specific reason.
        reason: String,
    },
    /// The lines were used after being released.
    #[error("lines already released")]
    Released,
}

/// Why a command did not get a valid acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkFault {
    /// RESPONSE went low before the minimum plausible delay: treated as noise.
    #[error("acknowledgment after {elapsed:?} is implausibly fast")]
    NoiseRejected {
        /// Time from the start of polling to the observed acknowledgment.
        elapsed: Duration,
    },
    /// RESPONSE never went low within the maximum wait.
    #[error("no acknowledgment within {waited:?}")]
    Timeout {
        /// How long the link polled.
        waited: Duration,
    },
    /// The line backend failed while driving or sampling a signal.
    #[error("line failure: {source}")]
    Line {
        /// The backend error.
        #[from]
        source: LineError,
    },
}
