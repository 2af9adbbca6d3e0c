//! Centralized path configuration for bdp.
//!
//! All data paths go through this module so the CLI and the library agree
//! on where frameworks, configuration templates and logs live.

use std::path::PathBuf;

/// Get the bdp data directory.
///
/// Resolution order:
/// 1. `BDP_DATA_DIR` environment variable
/// 2. `~/.bdp` in the invoking user's home directory
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BDP_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir().map(|h| h.join(".bdp")).unwrap_or_else(|| PathBuf::from(".bdp"))
}

/// Directory where framework distributions are unpacked.
pub fn frameworks_dir() -> PathBuf {
    data_dir().join("frameworks")
}

/// Directory holding the shipped configuration template sets, one
/// subdirectory per framework key.
pub fn conf_dir() -> PathBuf {
    data_dir().join("conf")
}

/// Directory holding deployment logs.
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Path of the append-only log for one deployment run.
///
/// The file name carries a timestamp so every deployment compiles its own
/// linear timeline of remote command output.
pub fn deploy_log_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    logs_dir().join(format!("deploy_log_{}.txt", stamp))
}

/// Path of the persistent configuration file.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}
