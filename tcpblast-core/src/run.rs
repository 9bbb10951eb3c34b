use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;

use crate::collector::Collector;
use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::probe::Probe;
use crate::report::AggregateReport;
use crate::signal::StopSignal;
use crate::worker;

pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    pub completed: u64,
    pub total: u64,
    pub elapsed: Duration,
}

/// State shared by every worker in a run.
#[derive(Debug)]
struct WorkerContext {
    host: String,
    port: u16,
    budget: Duration,
    probe: Probe,
    total: u64,

    /// Pull-based distribution: workers race on this counter, so slow
    /// requests never stall a pre-assigned range.
    next_index: AtomicU64,

    collector: Collector,
    stop: Arc<StopSignal>,
}

/// Runs the full request volume to completion and returns the aggregate
/// report. Blocks until every index has produced exactly one outcome.
pub async fn run(config: &RunConfig) -> Result<AggregateReport> {
    run_with_stop(config, Arc::new(StopSignal::new()), None).await
}

/// Like [`run`], but cancellable: when `stop` fires, workers stop pulling
/// new indices, in-flight attempts are abandoned (closing their sockets),
/// and the report is finalized from the outcomes recorded so far with
/// `complete == false`.
pub async fn run_with_stop(
    config: &RunConfig,
    stop: Arc<StopSignal>,
    progress: Option<ProgressFn>,
) -> Result<AggregateReport> {
    config.validate()?;

    let total = config.total_requests;
    let started = Instant::now();

    let ctx = Arc::new(WorkerContext {
        host: config.host.clone(),
        port: config.port,
        budget: config.per_request_timeout,
        probe: config.probe.clone(),
        total,
        next_index: AtomicU64::new(0),
        collector: Collector::new(),
        stop,
    });

    if total == 0 {
        return Ok(ctx.collector.finalize(started.elapsed(), 0));
    }

    let workers = config.worker_count();
    let mut handles = Vec::with_capacity(workers as usize);
    for _ in 0..workers {
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move { worker_loop(&ctx).await }));
    }

    let progress_handle = progress.map(|progress| {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Skip the immediate first tick so the first emission lands at
            // ~1s, like any later one.
            interval.tick().await;

            loop {
                interval.tick().await;
                (progress)(ProgressUpdate {
                    completed: ctx.collector.completed(),
                    total,
                    elapsed: started.elapsed(),
                });
            }
        })
    });

    let joined = join_workers(handles).await;

    if let Some(handle) = progress_handle {
        handle.abort();
        let _ = handle.await;
    }
    joined?;

    let wall_clock = started.elapsed();
    let recorded = ctx.collector.completed();

    // Every index must have produced exactly one outcome unless the run was
    // cancelled mid-flight.
    if !ctx.stop.is_stopped() && recorded != total {
        return Err(Error::CollectorIncomplete {
            recorded,
            dispatched: total,
        });
    }

    Ok(ctx.collector.finalize(wall_clock, total))
}

/// Awaits every worker handle, even after one fails, so no task is left
/// detached when an error is propagated.
async fn join_workers(handles: Vec<tokio::task::JoinHandle<()>>) -> Result<()> {
    let mut first_err = None;
    for handle in handles {
        if let Err(err) = handle.await {
            first_err.get_or_insert(err);
        }
    }
    match first_err {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

async fn worker_loop(ctx: &WorkerContext) {
    loop {
        if ctx.stop.is_stopped() {
            break;
        }

        let index = ctx.next_index.fetch_add(1, Ordering::Relaxed);
        if index >= ctx.total {
            break;
        }

        let outcome = tokio::select! {
            outcome = worker::attempt(index, &ctx.host, ctx.port, ctx.budget, &ctx.probe) => outcome,
            // Dropping the attempt future closes its socket.
            () = ctx.stop.wait() => break,
        };
        ctx.collector.record(outcome);
    }
}
