//! `bdp download` command - fetch a framework distribution archive.

use anyhow::{Context, Result};
use bdp_core::Progress;
use std::path::PathBuf;

/// Download a framework archive into the archive directory.
pub async fn download(
    framework: &str,
    version: &str,
    force: bool,
    framework_dir: Option<PathBuf>,
) -> Result<()> {
    let manager = super::manager(framework_dir, None)?;
    manager
        .download(framework, version, force, &Progress::stdout())
        .await
        .with_context(|| format!("Failed to download {framework} {version}"))
}
