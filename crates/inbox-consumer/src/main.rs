//! inbox replay consumer
//!
//! Feeds JSON-lines deliveries from stdin through the full receive pipeline:
//! - Strict config (`INBOX_CONFIG`, default `inbox.yaml`)
//! - Metadata parsing + ordered subscriber dispatch
//! - Encrypted payloads saved under `writer.output_dir`
//! - Prometheus-style metrics printed on EOF

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

use inbox_consumer::replay::{self, LogAcknowledger, SaveEncrypted, UnavailableDecryptor};
use inbox_consumer::{app_state, config};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::var("INBOX_CONFIG").unwrap_or_else(|_| "inbox.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");

    let state = app_state::AppState::new(cfg, Arc::new(UnavailableDecryptor))
        .expect("consumer state build failed");
    state
        .dispatcher()
        .subscribe(Arc::new(SaveEncrypted::new(state.output_dir())))
        .expect("subscribe failed");

    let (tx, rx) = mpsc::channel(state.cfg().consumer.channel_capacity);
    let runner = state.runner(Arc::new(LogAcknowledger));
    let consumer = tokio::spawn(async move { runner.run(rx).await });

    tracing::info!(config = %path, "inbox replay starting");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match replay::parse_line(&line) {
            Ok(delivery) => {
                if tx.send(delivery).await.is_err() {
                    tracing::error!("consumer stopped early");
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, "skipping malformed replay line"),
        }
    }
    drop(tx);

    match consumer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "consumer failed"),
        Err(e) => tracing::error!(error = %e, "consumer task panicked"),
    }

    print!("{}", state.metrics().render());
}
