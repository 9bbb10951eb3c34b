use std::net::SocketAddr;
use std::time::Duration;

use tcpblast_testserver::{Behavior, TestServer};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut bind_addr: SocketAddr = "127.0.0.1:0".parse()?;
    let mut behavior = Behavior::Echo;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--bind requires an address, e.g. 127.0.0.1:0")
                })?;
                bind_addr = addr.parse()?;
            }
            "--slow-ms" => {
                let ms: u64 = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--slow-ms requires a value"))?
                    .parse()?;
                behavior = Behavior::Slow(Duration::from_millis(ms));
            }
            "-h" | "--help" => {
                eprintln!(
                    "tcpblast-testserver\n\nUSAGE:\n  tcpblast-testserver [--bind 127.0.0.1:0] [--slow-ms N]\n\nOUTPUT:\n  Prints ADDR=<host:port> to stdout once ready."
                );
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let server = TestServer::start_on(bind_addr, behavior).await?;
    println!("ADDR={}", server.addr());

    tokio::signal::ctrl_c().await?;
    server.shutdown().await;
    Ok(())
}
