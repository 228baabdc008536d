/// Server setup and initialization
///
/// Wires together the store, compiler, runner and HTTP routes.
/// Provides the main application factory function for creating the Axum app.

use crate::{
    api::{create_api_routes, AppState},
    config::Config,
    runtime::{GraphCompiler, ScriptRunner},
    workflow::store::{InMemoryWorkflowStore, WorkflowStore},
};
use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

/// Create the main Axum application backed by a fresh in-memory store
pub fn create_app(config: &Config) -> Router {
    tracing::info!("📋 Initializing in-memory workflow store");
    create_app_with_store(config, Arc::new(InMemoryWorkflowStore::new()))
}

/// Create the Axum application around an existing store
pub fn create_app_with_store(config: &Config, store: Arc<dyn WorkflowStore>) -> Router {
    tracing::info!(
        "⚙️ Execution: interpreter '{}', timeout {}s, {:?} ordering",
        config.execution.interpreter,
        config.execution.timeout_secs,
        config.execution.ordering
    );

    let app_state = AppState {
        store,
        compiler: GraphCompiler::new(config.execution.ordering),
        runner: ScriptRunner::from_config(&config.execution),
    };

    Router::new()
        // Health check endpoint
        .route("/api/health", get(health_check))
        // Workflow management and execution routes
        .merge(create_api_routes().with_state(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Install the global tracing subscriber (`RUST_LOG`, default `info`)
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .try_init();
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    init_tracing();

    tracing::info!("Starting AgentBlocks server...");

    let app = create_app(&config);

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
///
/// GET /api/health
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
