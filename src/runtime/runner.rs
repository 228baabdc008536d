/// Script runner
///
/// Executes compiled source with an external interpreter in a child process and
/// captures its output. Every failure is reported inside the returned
/// [`ExecutionResult`]; callers never see an error from `run`.

use crate::config::ExecutionConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Outcome of running a compiled program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// True when the interpreter exited with status 0
    pub success: bool,
    /// Captured standard output
    pub output: String,
    /// Captured standard error on failure, or the reason the run could not happen
    pub error: Option<String>,
    /// The source text that was executed
    pub code: String,
    /// Interpreter exit code; None when it never started, timed out or was killed by a signal
    pub exit_status: Option<i32>,
}

impl ExecutionResult {
    fn failure(code: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            code: code.to_string(),
            exit_status: None,
        }
    }
}

/// Runs source text through an interpreter binary, one temporary file per run
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: String,
    timeout: Duration,
}

impl ScriptRunner {
    pub fn new(interpreter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(config.interpreter.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `code` and wait for it, up to the configured timeout
    pub async fn run(&self, code: &str) -> ExecutionResult {
        let start_time = std::time::Instant::now();
        tracing::info!("🚀 Running program with '{}' ({} bytes)", self.interpreter, code.len());

        let result = match self.try_run(code).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("❌ Could not run program: {:#}", e);
                ExecutionResult::failure(code, format!("{e:#}"))
            }
        };

        let duration = start_time.elapsed();
        if result.success {
            tracing::info!("✅ Program finished in {:?}", duration);
        } else {
            tracing::warn!(
                "⚠️ Program failed after {:?} (exit status: {:?})",
                duration,
                result.exit_status
            );
        }
        result
    }

    async fn try_run(&self, code: &str) -> Result<ExecutionResult> {
        // Removed from disk when dropped at the end of the run
        let mut script = tempfile::Builder::new()
            .prefix("agentblocks_")
            .suffix(".py")
            .tempfile()
            .context("Failed to create temporary script file")?;
        script
            .write_all(code.as_bytes())
            .and_then(|_| script.flush())
            .context("Failed to write temporary script file")?;
        tracing::debug!("📄 Wrote program to {}", script.path().display());

        let child = Command::new(&self.interpreter)
            .arg(script.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to execute interpreter '{}'", self.interpreter))?;

        // Dropping the wait future on timeout kills the child
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.context("Failed to collect interpreter output")?,
            Err(_) => {
                tracing::warn!("⏱️ Program exceeded timeout of {:?}, killed", self.timeout);
                return Ok(ExecutionResult::failure(
                    code,
                    format!("Execution timed out after {:?}", self.timeout),
                ));
            }
        };

        let success = output.status.success();
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        Ok(ExecutionResult {
            success,
            output: stdout,
            error: (!success).then_some(stderr),
            code: code.to_string(),
            exit_status: output.status.code(),
        })
    }
}
