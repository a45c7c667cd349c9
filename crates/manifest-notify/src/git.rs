use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{NotifyError, Result};

#[async_trait]
pub trait CommitSource: Send + Sync {
    /// Full message (subject and body) of the commit at HEAD.
    async fn latest_message(&self) -> Result<String>;
}

/// Reads commit messages by shelling out to the `git` binary.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    bin: Option<PathBuf>,
}

impl GitCli {
    /// Use whichever `git` is on PATH at read time.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(bin: impl Into<PathBuf>) -> Self {
        Self {
            bin: Some(bin.into()),
        }
    }
}

#[async_trait]
impl CommitSource for GitCli {
    async fn latest_message(&self) -> Result<String> {
        let bin = match &self.bin {
            Some(bin) => bin.clone(),
            None => which::which("git").map_err(|e| {
                NotifyError::VersionControl(format!("git not found on PATH: {e}"))
            })?,
        };

        let mut cmd = Command::new(&bin);
        cmd.args(["log", "--format=%B", "-n", "1", "HEAD"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| {
            NotifyError::VersionControl(format!("spawning {}: {e}", bin.display()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NotifyError::VersionControl(format!(
                "git log exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| {
            NotifyError::VersionControl("commit message is not valid UTF-8".to_string())
        })?;

        // git terminates %B output with newlines of its own
        Ok(stdout.trim_end_matches(|c| c == '\n' || c == '\r').to_string())
    }
}
