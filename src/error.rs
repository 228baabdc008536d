//! Domain errors for the workflow store and the graph compiler.

use thiserror::Error;

/// Errors returned by [`crate::workflow::WorkflowStore`] operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("Node '{node_id}' not found in workflow '{workflow_id}'")]
    NodeNotFound { workflow_id: String, node_id: String },

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid properties for '{node_type}' node: {source}")]
    InvalidProperties {
        node_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while linearizing a workflow into source text
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Node '{node_id}' uses '{name}' as a variable name, which is not a valid identifier")]
    InvalidIdentifier { node_id: String, name: String },

    #[error("Connection '{connection_id}' references unknown node '{node_id}'")]
    UnknownNode {
        connection_id: String,
        node_id: String,
    },

    #[error("Workflow connections contain a cycle")]
    Cycle,
}
