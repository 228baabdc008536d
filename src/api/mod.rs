/// HTTP API Layer
///
/// This module provides the REST API endpoints. It handles:
/// - Workflow CRUD and node/connection appends
/// - Compiling and running stored workflows
/// - Mapping domain errors to JSON error responses

// Error type shared by all handlers
pub mod error;

// Workflow management endpoints (GET/POST/PUT/PATCH)
pub mod workflows;

// Execute, compile and run endpoints
pub mod execution;

use axum::Router;

pub use error::ApiError;
pub use execution::create_execution_routes;
pub use workflows::{create_workflow_routes, AppState};

/// All `/api` routes except the health check
pub fn create_api_routes() -> Router<AppState> {
    create_workflow_routes().merge(create_execution_routes())
}
