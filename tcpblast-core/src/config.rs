use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::probe::Probe;

/// Immutable configuration for one load-generation run.
///
/// Built once from external input (CLI/env) and validated before any worker
/// spawns; the engine never mutates it.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub host: String,
    pub port: u16,

    /// Total number of requests to issue across all workers.
    pub total_requests: u64,

    /// Concurrency ceiling. The dispatcher spawns
    /// `min(concurrency, total_requests)` workers.
    pub concurrency: u64,

    /// Budget for a single attempt, covering connect, write and read.
    pub per_request_timeout: Duration,

    /// Where to persist the aggregate report, if persistence is requested.
    pub result_path: Option<PathBuf>,

    pub probe: Probe,
}

impl RunConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            total_requests: 10_000,
            concurrency: 16,
            per_request_timeout: Duration::from_secs(5),
            result_path: None,
            probe: Probe::ping(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidHost);
        }
        if self.port == 0 {
            return Err(Error::InvalidPort);
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidConcurrency);
        }
        if self.total_requests > 0 && self.concurrency > self.total_requests {
            return Err(Error::ConcurrencyExceedsRequests {
                concurrency: self.concurrency,
                requests: self.total_requests,
            });
        }
        Ok(())
    }

    /// Number of workers the dispatcher actually spawns.
    #[must_use]
    pub fn worker_count(&self) -> u64 {
        self.concurrency.min(self.total_requests)
    }
}
