use std::time::{Duration, Instant, SystemTime};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout_at;

use crate::outcome::{OutcomeStatus, RequestOutcome};
use crate::probe::Probe;

const READ_CHUNK: usize = 1024;

/// One full attempt for `index`: connect, write the probe request, read the
/// response. Each step is independently fallible and shares a single deadline
/// budget. Never retries; always returns a terminal outcome. The socket is
/// owned by this future, so every exit path (including the caller dropping
/// the future on cancellation) closes the connection.
pub async fn attempt(
    index: u64,
    host: &str,
    port: u16,
    budget: Duration,
    probe: &Probe,
) -> RequestOutcome {
    let started_at = SystemTime::now();
    let start = Instant::now();
    let deadline = tokio::time::Instant::now() + budget;

    let finish = |status: OutcomeStatus, latency: Duration, sent: u64, received: u64| {
        RequestOutcome {
            index,
            started_at,
            latency,
            status,
            bytes_sent: sent,
            bytes_received: received,
        }
    };

    // Step 1: connect. A deadline that expires here is a connect failure,
    // not a read timeout.
    let mut stream = match timeout_at(deadline, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(_)) | Err(_) => {
            return finish(OutcomeStatus::ConnectFailed, start.elapsed(), 0, 0);
        }
    };

    // Step 2: write the probe payload.
    let request = probe.request_bytes();
    match timeout_at(deadline, stream.write_all(request)).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => return finish(OutcomeStatus::WriteFailed, start.elapsed(), 0, 0),
        Err(_) => return finish(OutcomeStatus::Timeout, start.elapsed(), 0, 0),
    }
    let bytes_sent = request.len() as u64;

    // Step 3: read until the probe says the response is complete, EOF, or
    // the byte threshold.
    let mut response = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        if probe.response_complete(&response) {
            break;
        }

        match timeout_at(deadline, stream.read(&mut chunk)).await {
            Ok(Ok(0)) => {
                // EOF before any payload is a dropped connection, not a
                // completed response.
                if response.is_empty() {
                    return finish(
                        OutcomeStatus::ReadFailed,
                        start.elapsed(),
                        bytes_sent,
                        0,
                    );
                }
                break;
            }
            Ok(Ok(n)) => response.extend_from_slice(&chunk[..n]),
            Ok(Err(_)) => {
                return finish(
                    OutcomeStatus::ReadFailed,
                    start.elapsed(),
                    bytes_sent,
                    response.len() as u64,
                );
            }
            Err(_) => {
                return finish(
                    OutcomeStatus::Timeout,
                    start.elapsed(),
                    bytes_sent,
                    response.len() as u64,
                );
            }
        }
    }

    // Latency is connect-start to last byte received.
    finish(
        OutcomeStatus::Success,
        start.elapsed(),
        bytes_sent,
        response.len() as u64,
    )
}
