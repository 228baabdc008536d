/// Execution endpoints
///
/// `/api/execute/{id}` only acknowledges the request; it does not run anything.
/// Compiling and running a stored workflow live under the workflow resource.

use crate::{
    api::{error::ApiError, workflows::AppState},
    runtime::{CompiledProgram, ExecutionResult},
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};

pub fn create_execution_routes() -> Router<AppState> {
    Router::new()
        .route("/api/execute/{id}", post(execute_workflow))
        .route("/api/workflows/{id}/compile", post(compile_workflow))
        .route("/api/workflows/{id}/run", post(run_workflow))
}

/// Placeholder execution
///
/// POST /api/execute/{id}
async fn execute_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let workflow = state.store.get(&id)?;
    tracing::info!("📥 Execute requested for workflow: {}", workflow.id);

    Ok(Json(json!({
        "status": "executed",
        "workflow_id": workflow.id,
        "result": "Workflow execution not yet implemented"
    })))
}

/// Compile a stored workflow without running it
///
/// POST /api/workflows/{id}/compile
/// Returns: { "code": "...", "order": [...], "bindings": { ... } }
async fn compile_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CompiledProgram>, ApiError> {
    let workflow = state.store.get(&id)?;
    Ok(Json(state.compiler.compile(&workflow)?))
}

/// Compile a stored workflow and run it
///
/// POST /api/workflows/{id}/run
/// Returns: { "success", "output", "error", "code", "exit_status" }
async fn run_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExecutionResult>, ApiError> {
    let workflow = state.store.get(&id)?;
    let program = state.compiler.compile(&workflow)?;

    tracing::info!(
        "🚀 Running workflow '{}' ({} nodes in order)",
        workflow.id,
        program.order.len()
    );
    Ok(Json(state.runner.run(&program.source).await))
}
