//! Error types for bdp.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bdp operations.
pub type Result<T> = std::result::Result<T, BdpError>;

/// Main error type for bdp.
#[derive(Error, Debug)]
pub enum BdpError {
    /// A caller-supplied contract violation: too few machines, a missing
    /// required setting, or an unknown setting.
    #[error("Invalid setup: {reason}")]
    InvalidSetup { reason: String },

    // Registry errors
    #[error("Framework {framework} has not been registered")]
    FrameworkNotRegistered { framework: String },

    #[error("Version {version} of {framework} has not been registered")]
    VersionNotRegistered { framework: String, version: String },

    #[error("Framework {framework} has already been registered")]
    FrameworkAlreadyRegistered { framework: String },

    #[error("Version {version} of {framework} has already been registered")]
    VersionAlreadyRegistered { framework: String, version: String },

    // Remote execution errors
    #[error("Remote command on {host} exited with status {status}: {command}")]
    RemoteCommandFailed { host: String, command: String, status: i32 },

    #[error("Failed to run ssh to {host}: {source}")]
    SshFailed {
        host: String,
        #[source]
        source: std::io::Error,
    },

    // Archive errors
    #[error("Download failed: {reason}")]
    DownloadFailed { reason: String },

    #[error("Install failed: {reason}")]
    InstallFailed { reason: String },

    #[error("Archive not present at {path:?}")]
    MissingArchive { path: PathBuf },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BdpError {
    /// Build an `InvalidSetup` error from any message.
    pub fn invalid_setup(reason: impl Into<String>) -> Self {
        Self::InvalidSetup { reason: reason.into() }
    }

    /// Build an `Io` error carrying the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
