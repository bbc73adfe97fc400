//! Entry point for the QA Metrics binary.
//!
//! Running this binary starts an HTTP server over the monthly record
//! store.  The store document is read from `QA_DATA_FILE` (default
//! `data/qa-data.json`) and the server binds to `QA_BIND_ADDR` (default
//! `127.0.0.1:3000`).  Log verbosity follows `RUST_LOG`.

use std::sync::Arc;

use anyhow::Context;
use qa_metrics::config::Config;
use qa_metrics::service::QaService;
use qa_metrics::store::JsonFileStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("qa_metrics=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let store = JsonFileStore::open(&config.data_file)
        .with_context(|| format!("failed to open record store {}", config.data_file.display()))?;
    tracing::info!(path = %store.path().display(), "record store ready");

    let service = QaService::new(Arc::new(store));
    qa_metrics::api::serve(&config.bind_addr, service).await
}
