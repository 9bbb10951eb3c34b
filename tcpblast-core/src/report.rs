use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::outcome::OutcomeStatus;

/// Latency summary over *successful* attempts.
///
/// Percentile p is the exact sample at 1-indexed rank `ceil(p * n)`, clamped
/// to `[1, n]` — nearest-rank over the sorted success latencies, not an
/// approximation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyPercentiles {
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
    pub max: Duration,
    pub min: Duration,
    pub mean: Duration,
}

/// Final statistical summary of a run. Created once at run end and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub total_attempted: u64,
    pub success_count: u64,

    /// Failed attempts by terminal status. Statuses with zero failures are
    /// absent; `BTreeMap` keeps serialization byte-deterministic.
    pub failure_counts: BTreeMap<OutcomeStatus, u64>,

    /// `None` is the explicit "undefined" sentinel for a run with no
    /// successes; it is serialized as `null`, never omitted.
    pub latency: Option<LatencyPercentiles>,

    pub wall_clock: Duration,

    /// Successful requests per second over the wall clock; 0 for an empty or
    /// zero-duration run.
    pub throughput_req_per_sec: f64,

    /// False when the run was cancelled before every index produced an
    /// outcome (`total_attempted < total_requests`).
    pub complete: bool,
}

impl AggregateReport {
    /// Sum of all failure counts.
    #[must_use]
    pub fn failure_total(&self) -> u64 {
        self.failure_counts.values().sum()
    }

    /// Renders the report as the same pretty JSON document the report writer
    /// persists. Used as the stdout fallback when persistence fails.
    pub fn render_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// Persists `report` to `path`, creating parent directories as needed.
///
/// A failure here does not erase the in-memory report; callers are expected
/// to fall back to printing it.
pub fn write_report(report: &AggregateReport, path: &Path) -> Result<()> {
    let write_err = |source: std::io::Error| Error::ReportWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = report
        .render_json()
        .map_err(|e| write_err(std::io::Error::other(e)))?;
    std::fs::write(path, json).map_err(write_err)
}

/// Reads a previously persisted report back. Every field round-trips.
pub fn read_report(path: &Path) -> Result<AggregateReport> {
    let data = std::fs::read(path)?;
    let report = serde_json::from_slice(&data).map_err(|e| Error::Io(std::io::Error::other(e)))?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> AggregateReport {
        let mut failure_counts = BTreeMap::new();
        failure_counts.insert(OutcomeStatus::ConnectFailed, 3);
        failure_counts.insert(OutcomeStatus::Timeout, 1);

        AggregateReport {
            total_attempted: 10,
            success_count: 6,
            failure_counts,
            latency: Some(LatencyPercentiles {
                p50: Duration::from_millis(12),
                p90: Duration::from_millis(40),
                p99: Duration::from_millis(95),
                max: Duration::from_millis(95),
                min: Duration::from_millis(3),
                mean: Duration::from_micros(21_500),
            }),
            wall_clock: Duration::from_secs(2),
            throughput_req_per_sec: 3.0,
            complete: true,
        }
    }

    #[test]
    fn failure_total_sums_counts() {
        assert_eq!(sample_report().failure_total(), 4);
    }

    #[test]
    fn render_is_idempotent() {
        let report = sample_report();
        let a = match report.render_json() {
            Ok(v) => v,
            Err(err) => panic!("render failed: {err}"),
        };
        let b = match report.render_json() {
            Ok(v) => v,
            Err(err) => panic!("render failed: {err}"),
        };
        assert_eq!(a, b);
        assert!(a.ends_with('\n'));
    }

    #[test]
    fn report_round_trips_through_file() {
        let report = sample_report();
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(err) => panic!("tempdir failed: {err}"),
        };
        let path = dir.path().join("nested").join("report.json");

        if let Err(err) = write_report(&report, &path) {
            panic!("write_report failed: {err}");
        }
        let back = match read_report(&path) {
            Ok(r) => r,
            Err(err) => panic!("read_report failed: {err}"),
        };
        assert_eq!(report, back);
    }

    #[test]
    fn undefined_latency_serializes_as_null() {
        let mut report = sample_report();
        report.latency = None;
        report.success_count = 0;

        let json = match report.render_json() {
            Ok(v) => v,
            Err(err) => panic!("render failed: {err}"),
        };
        assert!(json.contains("\"latency\": null"));
    }

    #[test]
    fn write_fails_on_unwritable_destination() {
        let report = sample_report();
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(err) => panic!("tempdir failed: {err}"),
        };
        // The directory itself is not a writable file destination.
        let err = write_report(&report, dir.path());
        assert!(matches!(err, Err(Error::ReportWrite { .. })));
    }
}
