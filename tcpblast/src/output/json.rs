use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::Arc;

use tcpblast_core::{AggregateReport, RunConfig};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _config: &RunConfig) {}

    fn progress(&self, _total: u64) -> Option<tcpblast_core::ProgressFn> {
        Some(Arc::new(move |u| {
            let line = JsonProgressLine {
                kind: "progress",
                completed: u.completed,
                total: u.total,
                elapsed_secs: u.elapsed.as_secs_f64(),
            };
            emit_json_line(&line);
        }))
    }

    fn print_summary(&self, report: &AggregateReport) -> anyhow::Result<()> {
        let line = build_summary_line(report);
        emit_json_line(&line);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub completed: u64,
    pub total: u64,
    pub elapsed_secs: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub total_attempted: u64,
    pub success_count: u64,
    pub failure_counts: BTreeMap<String, u64>,

    /// `null` when the run had no successful requests.
    pub latency: Option<JsonLatencySummary>,

    pub wall_clock_secs: f64,
    pub throughput_req_per_sec: f64,
    pub complete: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonLatencySummary {
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
}

fn build_summary_line(report: &AggregateReport) -> JsonSummaryLine {
    let failure_counts = report
        .failure_counts
        .iter()
        .map(|(status, count)| (status.as_str().to_string(), *count))
        .collect::<BTreeMap<_, _>>();

    let ms = |d: std::time::Duration| d.as_secs_f64() * 1_000.0;

    let latency = report.latency.as_ref().map(|l| JsonLatencySummary {
        p50_ms: ms(l.p50),
        p90_ms: ms(l.p90),
        p99_ms: ms(l.p99),
        min_ms: ms(l.min),
        max_ms: ms(l.max),
        mean_ms: ms(l.mean),
    });

    JsonSummaryLine {
        kind: "summary",
        total_attempted: report.total_attempted,
        success_count: report.success_count,
        failure_counts,
        latency,
        wall_clock_secs: report.wall_clock.as_secs_f64(),
        throughput_req_per_sec: report.throughput_req_per_sec,
        complete: report.complete,
    }
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
