use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("`host` must be a non-empty host name or address")]
    InvalidHost,

    #[error("`port` must be in 1..=65535")]
    InvalidPort,

    #[error("`concurrency` must be a positive integer")]
    InvalidConcurrency,

    #[error("`concurrency` ({concurrency}) must not exceed `requests` ({requests})")]
    ConcurrencyExceedsRequests { concurrency: u64, requests: u64 },

    #[error("collector holds {recorded} outcomes but {dispatched} indices were dispatched")]
    CollectorIncomplete { recorded: u64, dispatched: u64 },

    #[error("failed to write report to `{path}`: {source}")]
    ReportWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// Whether this error comes from run configuration (rejected before any
    /// worker spawns) rather than from the run itself.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidHost
                | Self::InvalidPort
                | Self::InvalidConcurrency
                | Self::ConcurrencyExceedsRequests { .. }
        )
    }
}
