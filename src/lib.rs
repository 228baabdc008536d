/// AgentBlocks: backend for a visual workflow editor
///
/// Stores workflow graphs in memory behind a REST API, compiles them into
/// Python source and runs the result in an interpreter subprocess.

// Core configuration and setup
pub mod config;

// Domain errors for the store and compiler
pub mod error;

// Workflow management layer - type definitions, in-memory store, JSON documents
pub mod workflow;

// Runtime layer - graph compiler and script runner
pub mod runtime;

// HTTP API layer - REST endpoints for workflows and execution
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use runtime::{CompiledProgram, ExecutionResult, GraphCompiler, OrderingStrategy, ScriptRunner};
pub use server::{create_app, start_server};
pub use workflow::{Connection, InMemoryWorkflowStore, NodeKind, Position, Workflow, WorkflowNode, WorkflowStore};
