// src/oracle/claude_cli.rs — Oracle backed by the `claude` command-line tool
//
// Runs `<command> -p` with the request on stdin and returns stdout.
// Authentication is whatever the CLI itself is configured with.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::Oracle;
use crate::infra::errors::PromptsmithError;

pub struct ClaudeCliOracle {
    command: String,
}

impl ClaudeCliOracle {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn unavailable(&self, message: impl Into<String>) -> PromptsmithError {
        PromptsmithError::OracleUnavailable {
            oracle: self.id().to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Oracle for ClaudeCliOracle {
    fn id(&self) -> &str {
        "claude-cli"
    }

    async fn transform(&self, request: &str) -> Result<String, PromptsmithError> {
        let mut child = Command::new(&self.command)
            .arg("-p")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.unavailable(format!("failed to spawn '{}': {e}", self.command)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.unavailable("failed to open stdin"))?;
        stdin
            .write_all(request.as_bytes())
            .await
            .map_err(|e| self.unavailable(format!("failed to write request: {e}")))?;
        // Close stdin so the CLI sees end of input.
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.unavailable(format!("failed to read output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.unavailable(format!(
                "exited with {}: {}",
                output.status,
                crate::util::truncate_str(stderr.trim(), 300)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
