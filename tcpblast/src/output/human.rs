use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::ProgressBar;
use tcpblast_core::{AggregateReport, RunConfig};

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    bar: Mutex<Option<ProgressBar>>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, config: &RunConfig) {
        println!("target: {}:{}", config.host, config.port);
        println!(
            "requests: {}  concurrency: {}  timeout: {}",
            config.total_requests,
            config.worker_count(),
            format_duration_single(config.per_request_timeout)
        );
        println!();
    }

    fn progress(&self, total: u64) -> Option<tcpblast_core::ProgressFn> {
        let bar = ProgressBar::new(total);
        *self
            .bar
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(bar.clone());

        Some(Arc::new(move |u| {
            bar.set_position(u.completed);
        }))
    }

    fn print_summary(&self, report: &AggregateReport) -> anyhow::Result<()> {
        if let Some(bar) = self
            .bar
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            bar.finish_and_clear();
        }

        println!(
            "requests    {} attempted, {} succeeded, {} failed",
            report.total_attempted,
            report.success_count,
            report.failure_total()
        );

        if !report.failure_counts.is_empty() {
            let breakdown = report
                .failure_counts
                .iter()
                .map(|(status, count)| format!("{}={count}", status.as_str()))
                .collect::<Vec<_>>()
                .join(" ");
            println!("failures    {breakdown}");
        }

        match &report.latency {
            Some(lat) => {
                println!(
                    "latency     p50={} p90={} p99={} min={} max={} mean={}",
                    format_duration_single(lat.p50),
                    format_duration_single(lat.p90),
                    format_duration_single(lat.p99),
                    format_duration_single(lat.min),
                    format_duration_single(lat.max),
                    format_duration_single(lat.mean),
                );
            }
            None => println!("latency     undefined (no successful requests)"),
        }

        println!(
            "throughput  {:.1} req/s over {}",
            report.throughput_req_per_sec,
            format_duration_single(report.wall_clock)
        );

        if !report.complete {
            println!("run         INCOMPLETE (cancelled before all requests were issued)");
        }

        Ok(())
    }
}

/// Renders a duration as a single rounded component in one of: us, ms, s.
/// Keeps summary lines short and unit-stable.
pub(crate) fn format_duration_single(d: Duration) -> String {
    let total_ns: u128 = (d.as_secs() as u128) * 1_000_000_000u128 + u128::from(d.subsec_nanos());

    const NS_PER_US: u128 = 1_000;
    const NS_PER_MS: u128 = 1_000_000;
    const NS_PER_S: u128 = 1_000_000_000;

    fn round_div(value: u128, unit: u128) -> u128 {
        (value + (unit / 2)) / unit
    }

    if total_ns >= NS_PER_S {
        return format!("{}s", round_div(total_ns, NS_PER_S));
    }
    if total_ns >= NS_PER_MS {
        return format!("{}ms", round_div(total_ns, NS_PER_MS));
    }
    format!("{}us", round_div(total_ns, NS_PER_US))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_renders_as_single_unit() {
        assert_eq!(format_duration_single(Duration::from_secs(2)), "2s");
        assert_eq!(format_duration_single(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration_single(Duration::from_micros(90)), "90us");
    }

    #[test]
    fn duration_rounds_to_nearest() {
        assert_eq!(format_duration_single(Duration::from_micros(1_499)), "1ms");
        assert_eq!(format_duration_single(Duration::from_micros(1_500)), "2ms");
        assert_eq!(format_duration_single(Duration::from_millis(1_600)), "2s");
    }
}
