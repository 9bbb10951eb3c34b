use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// How the server treats accepted connections.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Answer each newline-terminated request with an `{"status": "OK"}`
    /// line immediately.
    Echo,
    /// Like `Echo`, but wait before replying.
    Slow(Duration),
    /// Drop the connection without reading or writing.
    CloseOnAccept,
    /// Read requests but never reply (drives the client timeout path).
    Stall,
}

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    accepted_total: Arc<AtomicU64>,
    requests_total: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_accepted(&self) {
        self.accepted_total.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_requests(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted_total(&self) -> u64 {
        self.accepted_total.load(Ordering::Relaxed)
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }
}

/// An in-process TCP server speaking the probe protocol, for tests and
/// local experiments.
#[derive(Debug)]
pub struct TestServer {
    addr: SocketAddr,
    stats: TestServerStats,
    shutdown: Option<oneshot::Sender<()>>,
    accept_task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(Behavior::Echo).await
    }

    pub async fn start_with(behavior: Behavior) -> anyhow::Result<Self> {
        let bind_addr: SocketAddr = "127.0.0.1:0".parse()?;
        Self::start_on(bind_addr, behavior).await
    }

    pub async fn start_on(bind_addr: SocketAddr, behavior: Behavior) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        let addr = listener.local_addr()?;
        let stats = TestServerStats::default();

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let accept_stats = stats.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { break };
                        accept_stats.inc_accepted();
                        let stats = accept_stats.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, behavior, stats).await;
                        });
                    }
                }
            }
        });

        Ok(Self {
            addr,
            stats,
            shutdown: Some(shutdown_tx),
            accept_task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    /// Stops accepting new connections. Already-spawned connection tasks
    /// finish on their own.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.accept_task.await;
    }
}

async fn handle_connection(mut stream: TcpStream, behavior: Behavior, stats: TestServerStats) {
    match behavior {
        // Dropping the stream closes it.
        Behavior::CloseOnAccept => {}

        Behavior::Stall => {
            let mut buf = [0u8; 1024];
            loop {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        }

        Behavior::Echo | Behavior::Slow(_) => {
            let mut pending = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                // Serve one reply per newline-terminated request, allowing
                // several requests on one connection.
                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    pending.drain(..=pos);
                    stats.inc_requests();

                    if let Behavior::Slow(delay) = behavior {
                        tokio::time::sleep(delay).await;
                    }

                    let mut reply = serde_json::json!({ "status": "OK" }).to_string();
                    reply.push('\n');
                    if stream.write_all(reply.as_bytes()).await.is_err() {
                        return;
                    }
                }

                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => pending.extend_from_slice(&buf[..n]),
                }
            }
        }
    }
}
