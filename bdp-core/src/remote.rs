//! Remote command execution over SSH.
//!
//! Every remote step of a deployment is a single `ssh <host> <command>`
//! invocation, executed synchronously and strictly in sequence. Output is
//! appended to the deployment's log file so the log reads as one linear
//! timeline. A non-zero exit aborts the caller; there is no retry and no
//! timeout, leaving partial state for manual inspection.

use crate::error::{BdpError, Result};
use crate::paths;
use crate::progress::Progress;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Transport seam for running a shell command on a remote host.
///
/// Implementations must treat each command as atomic: run it to completion
/// and report a non-zero exit as an error.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `command` on `host`, waiting for it to finish.
    async fn run(&self, host: &str, command: &str) -> Result<()>;
}

/// The real SSH transport.
///
/// Spawns `ssh` with stdout and stderr redirected to an append-only log
/// file, one file per deployment run.
pub struct SshShell {
    log_path: PathBuf,
}

impl SshShell {
    /// Create a shell logging to a fresh timestamped deployment log.
    pub fn new() -> Self {
        Self { log_path: paths::deploy_log_path() }
    }

    /// Create a shell logging to a specific file.
    pub fn with_log(log_path: impl Into<PathBuf>) -> Self {
        Self { log_path: log_path.into() }
    }

    /// Path of the log file this shell appends to.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    fn open_log(&self) -> Result<std::fs::File> {
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BdpError::io(parent, e))?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| BdpError::io(&self.log_path, e))
    }
}

impl Default for SshShell {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteShell for SshShell {
    async fn run(&self, host: &str, command: &str) -> Result<()> {
        debug!(host, command, "Running remote command");
        let mut log = self.open_log()?;
        writeln!(log, "\nExecuting: ssh {host} {command}")
            .map_err(|e| BdpError::io(&self.log_path, e))?;
        let stdout = log.try_clone().map_err(|e| BdpError::io(&self.log_path, e))?;

        let status = Command::new("ssh")
            .arg(host)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(log))
            .status()
            .await
            .map_err(|e| BdpError::SshFailed { host: host.to_string(), source: e })?;

        if !status.success() {
            return Err(BdpError::RemoteCommandFailed {
                host: host.to_string(),
                command: command.to_string(),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

/// Reset the per-deployment working directory on every node.
///
/// Removes `work_dir` recursively on the master and then on each worker in
/// topology order, then recreates it with mode 0770 in the same order.
/// Safe to repeat: the end state is the same on every run.
pub async fn reset_work_dirs(
    shell: &dyn RemoteShell,
    work_dir: &str,
    master: &str,
    workers: &[String],
    progress: &Progress,
) -> Result<()> {
    progress.log(2, &format!("Purging \"{work_dir}\" on master ({master})..."));
    shell.run(master, &format!("rm -rf \"{work_dir}\"")).await?;
    progress.log(2, &format!("Purging \"{work_dir}\" on workers..."));
    for worker in workers {
        shell.run(worker, &format!("rm -rf \"{work_dir}\"")).await?;
    }

    progress.log(2, "Creating directory structure on master...");
    shell.run(master, &format!("mkdir -p \"{work_dir}\"")).await?;
    progress.log(2, "Setting permissions on directory structure on master...");
    shell.run(master, &format!("chmod 0770 \"{work_dir}\"")).await?;
    progress.log(2, "Creating directory structure and setting permissions on workers...");
    for worker in workers {
        shell.run(worker, &format!("mkdir -p \"{work_dir}\"")).await?;
        shell.run(worker, &format!("chmod 0770 \"{work_dir}\"")).await?;
    }
    progress.log(2, "Clean environment set up.");
    Ok(())
}
