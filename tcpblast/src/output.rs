use tcpblast_core::{AggregateReport, RunConfig};

use crate::cli::OutputFormat;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, config: &RunConfig);
    fn progress(&self, total: u64) -> Option<tcpblast_core::ProgressFn>;
    fn print_summary(&self, report: &AggregateReport) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new()),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
