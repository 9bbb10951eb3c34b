use std::path::PathBuf;
use std::sync::Arc;

use tcpblast_core::{Probe, RunConfig, StopSignal, write_report};

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

const DEFAULT_RESULTS_PATH: &str = "tcpblast-results.json";

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.output);

    let config = RunConfig {
        host: args.host,
        port: args.port,
        total_requests: args.requests,
        concurrency: args.concurrency,
        per_request_timeout: args.timeout,
        result_path: args.results_path,
        probe: Probe::ping(),
    };
    config.validate().map_err(invalid_input)?;

    out.print_header(&config);

    let stop = Arc::new(StopSignal::new());
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupt received, aborting in-flight requests");
                stop.stop();
            }
        });
    }

    let progress = out.progress(config.total_requests);
    let report = tcpblast_core::run_with_stop(&config, stop, progress)
        .await
        .map_err(core_error)?;

    out.print_summary(&report).map_err(RunError::RuntimeError)?;

    if !report.complete {
        eprintln!(
            "run interrupted: {} of {} requests completed",
            report.total_attempted, config.total_requests
        );
    }

    if args.save_results {
        let path = config
            .result_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_PATH));

        if let Err(err) = write_report(&report, &path) {
            // The aggregate must survive a persistence failure: dump it to
            // stdout before surfacing the error.
            if let Ok(json) = report.render_json() {
                print!("{json}");
            }
            return Err(RunError::RuntimeError(
                anyhow::Error::new(err).context("failed to persist results"),
            ));
        }
        eprintln!("results written to {}", path.display());
    }

    Ok(ExitCode::from_report(&report, config.total_requests))
}

fn invalid_input(err: tcpblast_core::Error) -> RunError {
    RunError::InvalidInput(anyhow::Error::new(err))
}

fn core_error(err: tcpblast_core::Error) -> RunError {
    if err.is_config() {
        RunError::InvalidInput(anyhow::Error::new(err))
    } else {
        RunError::RuntimeError(anyhow::Error::new(err).context("load run failed"))
    }
}
