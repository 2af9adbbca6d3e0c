//! `bdp install` command - install a framework distribution.

use anyhow::{Context, Result};
use bdp_core::Progress;
use std::path::PathBuf;

/// Install a framework version into the framework directory.
pub async fn install(
    framework: &str,
    version: &str,
    reinstall: bool,
    download_if_missing: bool,
    framework_dir: Option<PathBuf>,
) -> Result<()> {
    let manager = super::manager(framework_dir, None)?;
    manager
        .install(framework, version, reinstall, download_if_missing, &Progress::stdout())
        .await
        .with_context(|| format!("Failed to install {framework} {version}"))
}
