/// Configuration management for the AgentBlocks backend
///
/// Handles server binding and execution parameters for the script runner.

use crate::runtime::compiler::OrderingStrategy;
use serde::{Deserialize, Serialize};

/// Main application configuration
///
/// `Config::default()` reads `AGENTBLOCKS_*` environment variables, falling
/// back to built-in values for container deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Compilation and execution configuration
    pub execution: ExecutionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// How workflows are compiled and run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Interpreter binary invoked with the generated script as its only argument
    pub interpreter: String,
    /// Wall-clock limit for a single run, in seconds
    pub timeout_secs: u64,
    /// Node ordering used by the compiler
    pub ordering: OrderingStrategy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("AGENTBLOCKS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("AGENTBLOCKS_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            interpreter: std::env::var("AGENTBLOCKS_INTERPRETER")
                .unwrap_or_else(|_| "python3".to_string()),
            timeout_secs: timeout_secs_from(std::env::var("AGENTBLOCKS_EXEC_TIMEOUT_SECS").ok()),
            ordering: match std::env::var("AGENTBLOCKS_ORDERING") {
                Ok(value) => value.parse().unwrap_or_else(|e| {
                    tracing::warn!("{}, falling back to spatial ordering", e);
                    OrderingStrategy::Spatial
                }),
                Err(_) => OrderingStrategy::Spatial,
            },
        }
    }
}

/// Default run limit when the environment gives none or an unusable one
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Parse a timeout override; zero would kill every run immediately
fn timeout_secs_from(raw: Option<String>) -> u64 {
    match raw {
        Some(value) => match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                tracing::warn!(
                    "Invalid AGENTBLOCKS_EXEC_TIMEOUT_SECS '{}', falling back to {}s",
                    value,
                    DEFAULT_TIMEOUT_SECS
                );
                DEFAULT_TIMEOUT_SECS
            }
        },
        None => DEFAULT_TIMEOUT_SECS,
    }
}

impl Config {
    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_falls_back_when_absent_zero_or_garbage() {
        assert_eq!(timeout_secs_from(None), DEFAULT_TIMEOUT_SECS);
        assert_eq!(timeout_secs_from(Some("0".to_string())), DEFAULT_TIMEOUT_SECS);
        assert_eq!(timeout_secs_from(Some("abc".to_string())), DEFAULT_TIMEOUT_SECS);
        assert_eq!(timeout_secs_from(Some("-5".to_string())), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn timeout_accepts_positive_seconds() {
        assert_eq!(timeout_secs_from(Some("5".to_string())), 5);
        assert_eq!(timeout_secs_from(Some(" 120 ".to_string())), 120);
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}
