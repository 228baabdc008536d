/// Workflow management REST API endpoints
///
/// CRUD over the workflow store plus sub-resource appends for nodes and
/// connections. Handlers are thin: validation lives in the store.

use crate::{
    api::error::ApiError,
    runtime::{GraphCompiler, ScriptRunner},
    workflow::{
        store::WorkflowStore,
        types::{
            Connection, ConnectionSpec, CreateWorkflowRequest, NodePatch, NodeSpec, Workflow,
            WorkflowNode, WorkflowPatch,
        },
    },
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Workflow store shared by all handlers
    pub store: Arc<dyn WorkflowStore>,
    /// Compiler used by the compile and run endpoints
    pub compiler: GraphCompiler,
    /// Runner for compiled programs
    pub runner: ScriptRunner,
}

/// Create workflow management routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", get(list_workflows).post(create_workflow))
        .route("/api/workflows/{id}", get(get_workflow).put(update_workflow))
        .route("/api/workflows/{id}/nodes", post(add_node))
        .route("/api/workflows/{id}/nodes/{node_id}", patch(update_node))
        .route("/api/workflows/{id}/connections", post(add_connection))
}

/// List all workflows
///
/// GET /api/workflows
async fn list_workflows(State(state): State<AppState>) -> Json<Vec<Workflow>> {
    Json(state.store.list())
}

/// Create a new workflow
///
/// POST /api/workflows
/// Body: { "id"?: "...", "name"?: "...", "description"?: "..." }
async fn create_workflow(
    State(state): State<AppState>,
    payload: Result<Json<CreateWorkflowRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Workflow>), ApiError> {
    let Json(request) = payload?;
    let workflow = state.store.create(request);
    Ok((StatusCode::CREATED, Json(workflow)))
}

/// Get a specific workflow by ID
///
/// GET /api/workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, ApiError> {
    Ok(Json(state.store.get(&id)?))
}

/// Update an existing workflow
///
/// PUT /api/workflows/{id}
/// Body: any of { "name", "description", "nodes", "connections" }
async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<WorkflowPatch>, JsonRejection>,
) -> Result<Json<Workflow>, ApiError> {
    // Unknown workflow wins over a bad body
    state.store.get(&id)?;
    let Json(patch) = payload?;
    Ok(Json(state.store.update(&id, patch)?))
}

/// Append a node to a workflow
///
/// POST /api/workflows/{id}/nodes
/// Body: { "id"?, "type"?, "position"?, "properties"?, "inputs"?, "outputs"? }
async fn add_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NodeSpec>, JsonRejection>,
) -> Result<(StatusCode, Json<WorkflowNode>), ApiError> {
    state.store.get(&id)?;
    let Json(spec) = payload?;
    let node = state.store.append_node(&id, spec)?;
    Ok((StatusCode::CREATED, Json(node)))
}

/// Move a node or replace its properties
///
/// PATCH /api/workflows/{id}/nodes/{node_id}
/// Body: { "position"?: { "x", "y" }, "properties"?: { ... } }
async fn update_node(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(String, String)>,
    payload: Result<Json<NodePatch>, JsonRejection>,
) -> Result<Json<WorkflowNode>, ApiError> {
    state.store.get(&id)?;
    let Json(patch) = payload?;
    Ok(Json(state.store.update_node(&id, &node_id, patch)?))
}

/// Append a connection to a workflow
///
/// POST /api/workflows/{id}/connections
/// Body: { "id"?, "source_node", "source_output", "target_node", "target_input" }
async fn add_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ConnectionSpec>, JsonRejection>,
) -> Result<(StatusCode, Json<Connection>), ApiError> {
    state.store.get(&id)?;
    let Json(spec) = payload?;
    let connection = state.store.append_connection(&id, spec)?;
    Ok((StatusCode::CREATED, Json(connection)))
}
