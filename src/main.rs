// Host simulator: reads one JSON request per line from stdin and writes one
// JSON response per line to stdout. Logs go to stderr.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use vision_bridge_lib::commands::{Request, respond};
use vision_bridge_lib::{BridgeConfig, BridgeError, WorkerPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BridgeConfig::from_env();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .compact();

    subscriber.init();

    info!("=== Vision bridge starting (workers: {}) ===", config.workers);
    let pool = WorkerPool::new(config);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("Failed to read request line")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let result = match serde_json::from_str::<Request>(line) {
            Ok(request) => pool.execute(request).await,
            Err(e) => {
                warn!("Rejected malformed request: {}", e);
                Err(BridgeError::unsupported(format!("Malformed request: {}", e)))
            }
        };
        let mut response = serde_json::to_vec(&respond(result)).context("Failed to encode response")?;
        response.push(b'\n');
        stdout.write_all(&response).await.context("Failed to write response")?;
        stdout.flush().await?;
        debug!("Response written");
    }

    info!("Input closed, shutting down");
    Ok(())
}
