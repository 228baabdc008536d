/// Runtime Layer
///
/// Turns workflows into runnable programs and runs them:
/// - Ordering nodes spatially or along connections (petgraph)
/// - Emitting Python statements per node kind
/// - Running the result in an interpreter subprocess with a timeout

// Workflow -> source text
pub mod compiler;

// Source text -> child process -> captured output
pub mod runner;

// Re-export main types
pub use compiler::{CompiledProgram, GraphCompiler, OrderingStrategy};
pub use runner::{ExecutionResult, ScriptRunner};
