/// Workflow Management Layer
///
/// This module handles workflow definitions and their in-memory store:
/// - Type definitions (Workflow, WorkflowNode, Connection)
/// - Lock-free in-memory store behind the WorkflowStore trait
/// - JSON documents on disk for the demo runner

// Core workflow type definitions
pub mod types;

// In-memory store using ArcSwap
pub mod store;

// JSON document load/save
pub mod document;

// Re-export commonly used types
pub use store::{InMemoryWorkflowStore, WorkflowStore};
pub use types::{Connection, NodeKind, Position, Workflow, WorkflowNode};
