/// Workflow documents on disk
///
/// Workflows are saved as pretty-printed JSON in the same shape the HTTP API
/// returns, so a document exported from the editor can be loaded by the demo
/// runner and vice versa.

use crate::workflow::types::Workflow;
use anyhow::{Context, Result};
use std::path::Path;

/// Serialize a workflow to its pretty-printed JSON document form
pub fn to_document(workflow: &Workflow) -> Result<String> {
    serde_json::to_string_pretty(workflow).context("Failed to serialize workflow")
}

/// Parse a workflow from a JSON document
pub fn from_document(json: &str) -> Result<Workflow> {
    serde_json::from_str(json).context("Failed to parse workflow")
}

pub async fn save_workflow(path: impl AsRef<Path>, workflow: &Workflow) -> Result<()> {
    let path = path.as_ref();
    let json = to_document(workflow)?;

    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write workflow file {}", path.display()))?;

    tracing::info!("💾 Saved workflow '{}' to {}", workflow.id, path.display());
    Ok(())
}

pub async fn load_workflow(path: impl AsRef<Path>) -> Result<Workflow> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read workflow file {}", path.display()))?;

    let workflow = from_document(&contents)?;
    tracing::info!(
        "📥 Loaded workflow '{}' ({} nodes, {} connections) from {}",
        workflow.id,
        workflow.nodes.len(),
        workflow.connections.len(),
        path.display()
    );
    Ok(workflow)
}
