use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::outcome::RequestOutcome;
use crate::report::{AggregateReport, LatencyPercentiles};

/// Accumulates outcomes from all workers.
///
/// `record` is the only mutation shared across workers; everything else
/// happens after the dispatcher has joined them.
#[derive(Debug, Default)]
pub struct Collector {
    outcomes: Mutex<Vec<RequestOutcome>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one outcome. Safe under concurrent invocation; outcomes are
    /// never overwritten or merged.
    pub fn record(&self, outcome: RequestOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(outcome);
    }

    /// Number of outcomes recorded so far.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len() as u64
    }

    pub(crate) fn drain(&self) -> Vec<RequestOutcome> {
        std::mem::take(
            &mut *self
                .outcomes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    /// Folds every recorded outcome into the final report. The collector is
    /// empty afterwards; call this once, after all workers have joined.
    pub fn finalize(&self, wall_clock: Duration, total_requests: u64) -> AggregateReport {
        let outcomes = self.drain();

        let total_attempted = outcomes.len() as u64;
        let mut failure_counts: BTreeMap<_, u64> = BTreeMap::new();
        let mut success_latencies: Vec<Duration> = Vec::with_capacity(outcomes.len());

        for outcome in &outcomes {
            if outcome.status.is_success() {
                success_latencies.push(outcome.latency);
            } else {
                *failure_counts.entry(outcome.status).or_default() += 1;
            }
        }

        success_latencies.sort_unstable();
        let success_count = success_latencies.len() as u64;

        let latency = summarize_latencies(&success_latencies);

        let wall_secs = wall_clock.as_secs_f64();
        let throughput_req_per_sec = if wall_secs > 0.0 {
            success_count as f64 / wall_secs
        } else {
            0.0
        };

        AggregateReport {
            total_attempted,
            success_count,
            failure_counts,
            latency,
            wall_clock,
            throughput_req_per_sec,
            complete: total_attempted == total_requests,
        }
    }
}

fn summarize_latencies(sorted: &[Duration]) -> Option<LatencyPercentiles> {
    let (&min, &max) = match (sorted.first(), sorted.last()) {
        (Some(min), Some(max)) => (min, max),
        _ => return None,
    };

    let total: Duration = sorted.iter().sum();
    let mean = total / sorted.len() as u32;

    Some(LatencyPercentiles {
        p50: nearest_rank(sorted, 0.50),
        p90: nearest_rank(sorted, 0.90),
        p99: nearest_rank(sorted, 0.99),
        max,
        min,
        mean,
    })
}

/// Exact nearest-rank percentile: the sample at 1-indexed rank `ceil(p * n)`,
/// clamped to `[1, n]`. Callers guarantee `sorted` is non-empty.
fn nearest_rank(sorted: &[Duration], p: f64) -> Duration {
    let n = sorted.len();
    let rank = ((p * n as f64).ceil() as usize).clamp(1, n);
    sorted[rank - 1]
}
