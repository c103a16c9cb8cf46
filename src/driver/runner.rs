//! Command runners for the provisioning driver.
//!
//! A runner executes one shell command line, locally or on a remote host
//! over `ssh`, and returns its standard output.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{DriverError, Result};

/// Executes command lines on the hypervisor host.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` and returns its standard output.
    ///
    /// # Errors
    ///
    /// Returns `Spawn` if the command cannot start and `CommandFailed` if it
    /// exits unsuccessfully.
    async fn run(&self, command: &str) -> Result<String>;
}

/// Runs commands on the local host through `sh -c`.
#[derive(Debug, Default, Clone)]
pub struct LocalRunner;

/// Runs commands on a remote host through `ssh`.
#[derive(Debug, Clone)]
pub struct SshRunner {
    target: String,
    port: Option<u16>,
    identity: Option<PathBuf>,
}

impl LocalRunner {
    /// Creates a local runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SshRunner {
    /// Creates a runner for `target` (`user@host` or `host`).
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            port: None,
            identity: None,
        }
    }

    /// Sets the SSH port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the identity file.
    #[must_use]
    pub fn with_identity(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity = Some(path.into());
        self
    }

    /// Arguments passed to `ssh` for `command`.
    #[must_use]
    pub fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = vec![String::from("-o"), String::from("BatchMode=yes")];
        if let Some(port) = self.port {
            args.push(String::from("-p"));
            args.push(port.to_string());
        }
        if let Some(identity) = &self.identity {
            args.push(String::from("-i"));
            args.push(identity.display().to_string());
        }
        args.push(self.target.clone());
        args.push(command.to_string());
        args
    }
}

#[async_trait]
impl CommandRunner for LocalRunner {
    async fn run(&self, command: &str) -> Result<String> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        run_process(cmd, command).await
    }
}

#[async_trait]
impl CommandRunner for SshRunner {
    async fn run(&self, command: &str) -> Result<String> {
        let mut cmd = Command::new("ssh");
        cmd.args(self.ssh_args(command));
        run_process(cmd, command).await
    }
}

async fn run_process(mut cmd: Command, command_line: &str) -> Result<String> {
    debug!("Running: {command_line}");

    let output = cmd
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| DriverError::Spawn {
            command: command_line.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(DriverError::CommandFailed {
            command: command_line.to_string(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
