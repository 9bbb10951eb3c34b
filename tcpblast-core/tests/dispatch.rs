use std::sync::Arc;
use std::time::Duration;

use tcpblast_core::{OutcomeStatus, RunConfig, StopSignal, run, run_with_stop};
use tcpblast_testserver::{Behavior, TestServer};

fn config_for(host: String, port: u16, requests: u64, concurrency: u64) -> RunConfig {
    let mut cfg = RunConfig::new(host, port);
    cfg.total_requests = requests;
    cfg.concurrency = concurrency;
    cfg.per_request_timeout = Duration::from_secs(5);
    cfg
}

/// Grabs a port that nothing is listening on.
async fn free_port() -> anyhow::Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

#[tokio::test]
async fn zero_requests_yields_empty_complete_report() -> anyhow::Result<()> {
    let cfg = config_for("127.0.0.1".to_string(), 9, 0, 16);

    let report = run(&cfg).await?;

    assert_eq!(report.total_attempted, 0);
    assert_eq!(report.success_count, 0);
    assert!(report.failure_counts.is_empty());
    assert_eq!(report.latency, None);
    assert_eq!(report.throughput_req_per_sec, 0.0);
    assert!(report.complete);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn echo_server_every_request_succeeds() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let cfg = config_for(
        server.addr().ip().to_string(),
        server.addr().port(),
        100,
        10,
    );

    let report = run(&cfg).await?;

    assert_eq!(report.total_attempted, 100);
    assert_eq!(report.success_count, 100);
    assert!(report.failure_counts.is_empty());
    assert!(report.complete);
    assert!(report.throughput_req_per_sec > 0.0);

    let lat = match &report.latency {
        Some(l) => l,
        None => panic!("expected latency percentiles for a successful run"),
    };
    assert!(lat.min <= lat.p50);
    assert!(lat.p50 <= lat.p90);
    assert!(lat.p90 <= lat.p99);
    assert!(lat.p99 <= lat.max);

    assert_eq!(server.stats().requests_total(), 100);
    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_target_records_connect_failures() -> anyhow::Result<()> {
    let port = free_port().await?;
    let cfg = config_for("127.0.0.1".to_string(), port, 20, 4);

    let report = run(&cfg).await?;

    assert_eq!(report.total_attempted, 20);
    assert_eq!(report.success_count, 0);
    assert_eq!(
        report.failure_counts.get(&OutcomeStatus::ConnectFailed),
        Some(&20)
    );
    // No successes: latency must be the explicit undefined sentinel.
    assert_eq!(report.latency, None);
    assert!(report.complete);
    assert_eq!(
        report.success_count + report.failure_total(),
        report.total_attempted
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn stalled_server_records_timeouts() -> anyhow::Result<()> {
    let server = TestServer::start_with(Behavior::Stall).await?;
    let mut cfg = config_for(server.addr().ip().to_string(), server.addr().port(), 4, 2);
    cfg.per_request_timeout = Duration::from_millis(200);

    let report = run(&cfg).await?;

    assert_eq!(report.total_attempted, 4);
    assert_eq!(report.success_count, 0);
    assert_eq!(report.failure_counts.get(&OutcomeStatus::Timeout), Some(&4));
    assert!(report.complete);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_connections_are_terminal_outcomes_not_losses() -> anyhow::Result<()> {
    let server = TestServer::start_with(Behavior::CloseOnAccept).await?;
    let cfg = config_for(server.addr().ip().to_string(), server.addr().port(), 20, 4);

    let report = run(&cfg).await?;

    // Every index still produced exactly one (failed) outcome.
    assert_eq!(report.total_attempted, 20);
    assert_eq!(report.success_count, 0);
    assert_eq!(report.failure_total(), 20);
    assert!(report.complete);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_run_preserves_completed_outcomes() -> anyhow::Result<()> {
    let server = TestServer::start_with(Behavior::Slow(Duration::from_millis(50))).await?;
    let cfg = config_for(server.addr().ip().to_string(), server.addr().port(), 100, 4);

    let stop = Arc::new(StopSignal::new());
    let handle = {
        let stop = stop.clone();
        tokio::spawn(async move { run_with_stop(&cfg, stop, None).await })
    };

    // Let some requests finish, then cancel mid-run.
    tokio::time::sleep(Duration::from_millis(300)).await;
    stop.stop();

    let report = handle.await??;
    server.shutdown().await;

    assert!(!report.complete);
    assert!(report.total_attempted > 0, "some requests should finish");
    assert!(
        report.total_attempted < 100,
        "cancellation should cut the run short (got {})",
        report.total_attempted
    );
    assert_eq!(
        report.success_count + report.failure_total(),
        report.total_attempted
    );
    Ok(())
}

#[tokio::test]
async fn invalid_config_is_rejected_before_dispatch() {
    // Concurrency above the request count must be rejected.
    let cfg = config_for("127.0.0.1".to_string(), 9, 10, 16);
    let err = match run(&cfg).await {
        Err(e) => e,
        Ok(_) => panic!("expected a config error"),
    };
    assert!(err.is_config());
}
