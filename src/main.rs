/// AgentBlocks server
///
/// Main entry point. Loads configuration from the environment and starts the
/// HTTP server with workflow management and execution endpoints.

use agentblocks::{
    config::Config,
    server::{init_tracing, start_server},
};

/// Application entry point
///
/// The server provides:
/// - Workflow management API at /api/workflows/*
/// - Placeholder execution at /api/execute/{id}
/// - Health check at /api/health
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Subscriber first so configuration warnings are not dropped
    init_tracing();

    // Load configuration (defaults to 0.0.0.0:5000 and python3)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
