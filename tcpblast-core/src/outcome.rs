use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Terminal status of one attempt. Failures are data, not errors: they are
/// folded into the aggregate report and never abort the run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    ConnectFailed,
    WriteFailed,
    ReadFailed,
    Timeout,
}

impl OutcomeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ConnectFailed => "connect_failed",
            Self::WriteFailed => "write_failed",
            Self::ReadFailed => "read_failed",
            Self::Timeout => "timeout",
        }
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// The immutable record of one attempt. Produced by a worker, then owned
/// exclusively by the collector.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    /// Request index in `0..total_requests`; unique per run.
    pub index: u64,
    pub started_at: SystemTime,

    /// Connect-start to last byte received (or to the failing step).
    pub latency: Duration,
    pub status: OutcomeStatus,

    pub bytes_sent: u64,
    pub bytes_received: u64,
}
