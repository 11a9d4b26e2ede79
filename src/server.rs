//! HTTP Server and Metrics Collection
//!
//! This module implements the Prometheus exporter HTTP server and the metric collection loop.
//!
//! # Architecture
//!
//! - **Startup**: resolves the target CPCs, builds the resource cache and runs its
//!   one-time setup; a setup failure aborts startup
//! - **HTTP Server**: Axum-based server exposing `/metrics`, `/health`, and `/` endpoints
//! - **Collection Loop**: Background task that periodically walks the cache and updates metrics
//! - **Live Updates**: Background task refreshing subscribed resources' properties
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - Health check (returns 200 if the last cycle succeeded, 503 otherwise)
//!
//! # Concurrency
//!
//! The cache sits behind a `tokio::sync::Mutex` taken for a whole collection
//! cycle, so its indexes are only ever mutated from one cycle at a time. The
//! live-update task only swaps property snapshots on shared resources.

use crate::cache::{ResourceCache, TargetScope};
use crate::collectors::{self, CollectionContext, CollectionStatus};
use crate::config::Config;
use crate::console::RestConsoleClient;
use crate::error::ExporterError;
use crate::metrics::MetricsCollector;
use anyhow::Context;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration};
use tracing::{error, info};

type SharedCache = Arc<Mutex<ResourceCache<RestConsoleClient>>>;

#[derive(Clone)]
struct AppState {
    config: Config,
    metrics: MetricsCollector,
    cache: SharedCache,
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let metrics = MetricsCollector::with_namespace(&config.metrics.namespace)?;
    let client = Arc::new(RestConsoleClient::new(config.console.clone())?);

    let targets = TargetScope::resolve(client.as_ref(), &config.metrics.target_cpcs)
        .await
        .context("Failed to resolve target CPCs")?;

    let enabled_groups = config.enabled_metric_groups();
    info!(
        "Setting up resource cache for {} CPCs and {} metric groups",
        targets.len(),
        enabled_groups.len()
    );
    let mut cache = ResourceCache::new(Arc::clone(&client), targets);
    cache
        .setup(&enabled_groups)
        .await
        .context("Failed to set up the resource cache")?;

    client.spawn_auto_update(Duration::from_secs(
        config.metrics.auto_update_interval_seconds,
    ));

    let state = AppState {
        config: config.clone(),
        metrics: metrics.clone(),
        cache: Arc::new(Mutex::new(cache)),
    };

    // Start background metrics collection
    let collection_state = state.clone();
    tokio::spawn(async move {
        collect_metrics_loop(collection_state).await;
    });

    // Build the router
    let app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(ExporterError::Io)
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ExporterError::Server(e.to_string()))?;

    Ok(())
}

async fn collect_metrics_loop(state: AppState) {
    let mut ticker = interval(Duration::from_secs(
        state.config.metrics.scrape_interval_seconds,
    ));

    loop {
        ticker.tick().await;

        if let Err(e) = collect_metrics(&state).await {
            error!("Failed to collect metrics: {}", e);
            state.metrics.up.set(0.0);
        } else {
            state.metrics.up.set(1.0);
        }
    }
}

async fn collect_metrics(state: &AppState) -> anyhow::Result<()> {
    info!("Collecting metrics from the HMC");

    let mut cache = state.cache.lock().await;
    let mut ctx = CollectionContext {
        cache: &mut *cache,
        metrics: &state.metrics,
    };

    state.metrics.reset();
    let mut all_success = true;

    // Helper macro to track success
    macro_rules! collect {
        ($collector:expr) => {
            match $collector.await? {
                CollectionStatus::Success => {}
                CollectionStatus::Failed => all_success = false,
            }
        };
    }

    collect!(collectors::collect_resource_metrics(&mut ctx));
    collect!(collectors::collect_nic_metrics(&mut ctx));
    collect!(collectors::collect_cache_metrics(&mut ctx));

    if !all_success {
        anyhow::bail!("Some resources could not be refreshed from the HMC");
    }

    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    r#"<html>
<head><title>HMC Exporter</title></head>
<body>
<h1>HMC Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let up_value = state.metrics.up.get();

    if up_value > 0.0 {
        (axum::http::StatusCode::OK, "OK")
    } else {
        (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "HMC unreachable",
        )
    }
}
