//! Log every ACSP event received on a UDP port.
//!
//! ```text
//! acsp-listen [config.yaml]
//! ```
//!
//! Without a path the default configuration is used. `ACSP_BIND`,
//! `ACSP_SERVER` and `ACSP_RESUBSCRIBE_SECS` override the file; `RUST_LOG`
//! controls verbosity.

use anyhow::Context;
use futures::StreamExt;
use tracing::info;

use acsp::{Acsp, ListenerConfig, LoggingSink, Sink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => ListenerConfig::load(&path)
            .with_context(|| format!("loading {}", path.to_string_lossy()))?,
        None => ListenerConfig::default(),
    };
    let config = config.with_env_overrides().context("applying environment overrides")?;

    let connection = Acsp::listen(&config).await.context("starting listener")?;
    let mut outcomes = std::pin::pin!(connection.outcomes());
    let mut sink = LoggingSink;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            outcome = outcomes.next() => match outcome {
                Some(outcome) => sink.accept(&outcome),
                None => {
                    info!("Listener stopped");
                    break;
                }
            },
        }
    }

    let stats = connection.stats();
    info!(
        events = stats.events,
        malformed = stats.malformed,
        unknown = stats.unknown,
        "Shutting down"
    );
    Ok(())
}
