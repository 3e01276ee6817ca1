use std::time::Duration;

use anyhow::Context;
use clap::Args;
use retry_backoff::after;
use tokio::net::TcpStream;

use super::{BackoffArgs, Run};

#[derive(Debug, Args)]
pub struct Connect {
    /// Address to connect to, as host:port
    addr: String,
    #[command(flatten)]
    backoff: BackoffArgs,
    /// Timeout for each connection attempt, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
}

impl Run for Connect {
    type Response = ();

    async fn run(self) -> anyhow::Result<Self::Response> {
        let mut backoff = self.backoff.build();
        let timeout = Duration::from_millis(self.timeout_ms);

        loop {
            tracing::info!(addr = %self.addr, "attempting to connect");

            match tokio::time::timeout(timeout, TcpStream::connect(&self.addr)).await {
                Ok(Ok(stream)) => {
                    backoff.reset();
                    tracing::info!(addr = %self.addr, peer = ?stream.peer_addr().ok(), "connected");
                    println!("connected to {}", self.addr);
                    return Ok(());
                }
                Ok(Err(e)) => tracing::warn!(addr = %self.addr, "failed to connect: {e}"),
                Err(_) => tracing::warn!(addr = %self.addr, "timed out after {}ms", self.timeout_ms),
            }

            tokio::select! {
                res = after(&mut backoff) => {
                    res.with_context(|| format!("giving up on {}", self.addr))?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted, abandoning connection attempts");
                    return Ok(());
                }
            }
        }
    }
}
