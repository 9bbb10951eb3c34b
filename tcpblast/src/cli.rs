use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 5s, 250ms)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!("invalid duration '{s}' (expected e.g. 5s, 250ms)"));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 5s, 250ms)"))?;

    match unit_str.trim() {
        "" | "s" | "sec" | "secs" => Ok(Duration::from_secs(value)),
        "ms" | "msec" | "msecs" => Ok(Duration::from_millis(value)),
        "us" | "usec" | "usecs" => Ok(Duration::from_micros(value)),
        "m" | "min" | "mins" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        _ => Err(format!("invalid duration '{s}' (expected e.g. 5s, 250ms)")),
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    HumanReadable,
    /// Emit JSON progress/summary lines (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "tcpblast",
    author,
    version,
    about = "Concurrent TCP load-generation client",
    long_about = "tcpblast opens a bounded pool of concurrent TCP connections against a target host:port, drives a fixed total request volume through them, measures per-request latency and outcome, and prints (optionally persists) an aggregate report.",
    after_help = "Examples:\n  tcpblast run --host 127.0.0.1 --port 9000\n  tcpblast run --host 127.0.0.1 --port 9000 --requests 1000 --concurrency 50\n  tcpblast run --host 127.0.0.1 --port 9000 --save-results --results-path out/report.json\n\nFlags fall back to TCPBLAST_HOST, TCPBLAST_PORT, TCPBLAST_REQUESTS, TCPBLAST_CONCURRENCY and TCPBLAST_TIMEOUT."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a load-generation pass against a target
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Target host name or address
    #[arg(long, env = "TCPBLAST_HOST")]
    pub host: String,

    /// Target TCP port (1-65535)
    #[arg(long, env = "TCPBLAST_PORT")]
    pub port: u16,

    /// Total number of requests to issue
    #[arg(long, env = "TCPBLAST_REQUESTS", default_value_t = 10_000)]
    pub requests: u64,

    /// Number of concurrent connections (must not exceed the request count)
    #[arg(long, env = "TCPBLAST_CONCURRENCY", default_value_t = 16)]
    pub concurrency: u64,

    /// Per-request timeout covering connect, write and read (e.g. 5s, 250ms)
    #[arg(long, env = "TCPBLAST_TIMEOUT", value_parser = parse_duration, default_value = "5s")]
    pub timeout: Duration,

    /// Persist the aggregate report to disk after the run
    #[arg(long)]
    pub save_results: bool,

    /// Report destination (default: tcpblast-results.json; only used with --save-results)
    #[arg(long, value_name = "PATH")]
    pub results_path: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_accepts_common_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("100us"), Ok(Duration::from_micros(100)));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10x").is_err());
    }

    #[test]
    fn cli_parses_run_with_overrides() {
        let parsed = Cli::try_parse_from([
            "tcpblast",
            "run",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--requests",
            "100",
            "--concurrency",
            "10",
            "--timeout",
            "250ms",
            "--save-results",
            "--results-path",
            "out/report.json",
            "--output",
            "json",
        ]);

        let cli = match parsed {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };

        let Command::Run(args) = cli.command;
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 9000);
        assert_eq!(args.requests, 100);
        assert_eq!(args.concurrency, 10);
        assert_eq!(args.timeout, Duration::from_millis(250));
        assert!(args.save_results);
        assert_eq!(args.results_path, Some(PathBuf::from("out/report.json")));
        assert!(matches!(args.output, OutputFormat::Json));
    }

    #[test]
    fn cli_defaults_requests_and_concurrency() {
        let parsed = Cli::try_parse_from(["tcpblast", "run", "--host", "h", "--port", "80"]);
        let cli = match parsed {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };

        let Command::Run(args) = cli.command;
        assert_eq!(args.requests, 10_000);
        assert_eq!(args.concurrency, 16);
        assert_eq!(args.timeout, Duration::from_secs(5));
        assert!(!args.save_results);
        assert!(matches!(args.output, OutputFormat::HumanReadable));
    }
}
