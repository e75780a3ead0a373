//! Invocation of the external `ems-flasher` tool
//!
//! The flasher is an opaque collaborator: it receives an argument list, and
//! its exit status and captured output are all this crate looks at.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::FlasherConfig;
use crate::errors::{EmsError, Result};

/// Captured result of one tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Anything that can run flasher command lines
#[async_trait]
pub trait FlasherBackend: Send + Sync {
    /// Run the tool once. `Err` means the tool could not be started at all;
    /// a non-zero exit is reported through `ToolOutput`.
    async fn invoke(&self, args: &[String]) -> Result<ToolOutput>;

    /// Human-readable name for logs
    fn describe(&self) -> String;
}

/// Backend that spawns the real `ems-flasher` executable
#[derive(Debug, Clone)]
pub struct EmsFlasher {
    program: PathBuf,
}

impl EmsFlasher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &FlasherConfig) -> Self {
        Self::new(config.program.clone())
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

#[async_trait]
impl FlasherBackend for EmsFlasher {
    async fn invoke(&self, args: &[String]) -> Result<ToolOutput> {
        log::debug!("Executing: {} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                EmsError::ToolUnavailable(format!("{}: {}", self.program.display(), e))
            })?;

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn describe(&self) -> String {
        self.program.display().to_string()
    }
}
