use tcpblast_core::AggregateReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// The run completed but every single attempt failed.
    AllAttemptsFailed = 10,

    /// The run was cancelled before all requests were dispatched; the
    /// report is partial.
    Interrupted = 20,

    /// Invalid CLI/config input (bad flags, port 0, concurrency above the
    /// request count, etc.).
    InvalidInput = 30,

    /// Internal/runtime error (IO errors, worker join failures, report
    /// persistence failures).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_report(report: &AggregateReport, total_requests: u64) -> Self {
        if !report.complete {
            return Self::Interrupted;
        }
        if total_requests > 0 && report.success_count == 0 {
            return Self::AllAttemptsFailed;
        }
        Self::Success
    }
}
