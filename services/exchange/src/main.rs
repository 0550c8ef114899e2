//! Marketplace persistence service entry point.
//!
//! # Purpose
//! Wires configuration, the entity store backend, and the HTTP router, then
//! starts the API server and the metrics listener.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup
//! logic.
mod api;
mod app;
mod auth;
mod config;
mod index;
mod model;
mod notify;
mod observability;
mod store;

use anyhow::Context;
use app::{AppState, build_router};
use std::future::Future;
use std::sync::Arc;
use store::{EntityStore, memory::MemoryStore, remote::RemoteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::ExchangeConfig::from_env_or_yaml().expect("exchange config");
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: config::ExchangeConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("exchange");
    let state = build_state(config.clone())?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);

    let addr = config.bind_addr;
    tracing::info!(%addr, "exchange listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

fn build_state(config: config::ExchangeConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn EntityStore> = match config.storage {
        config::StorageBackend::Memory => Arc::new(MemoryStore::new()),
        config::StorageBackend::Remote => {
            let remote = config
                .remote
                .as_ref()
                .context("remote store configuration missing")?;
            Arc::new(RemoteStore::connect(remote)?)
        }
    };
    tracing::info!(
        backend = store.backend_name(),
        durable = store.is_durable(),
        "entity store ready"
    );

    Ok(AppState {
        api_version: "v1".to_string(),
        store,
        index_cap: config.index_cap,
        feed_limit: config.feed_limit,
    })
}
