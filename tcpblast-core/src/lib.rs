mod collector;
mod config;
mod error;
mod outcome;
mod probe;
mod report;
mod run;
mod signal;
mod worker;

pub use collector::Collector;
pub use config::RunConfig;
pub use error::{Error, Result};
pub use outcome::{OutcomeStatus, RequestOutcome};
pub use probe::Probe;
pub use report::{AggregateReport, LatencyPercentiles, read_report, write_report};
pub use run::{ProgressFn, ProgressUpdate, run, run_with_stop};
pub use signal::StopSignal;
pub use worker::attempt;
