//! CLI command implementations

pub mod deploy;
pub mod download;
pub mod frameworks;
pub mod install;

use anyhow::{Context, Result};
use bdp_core::{Config, FrameworkManager, FrameworkRegistry};
use std::path::PathBuf;

/// Build a framework manager from the built-in registry.
///
/// Command-line overrides win; everything else comes from the persisted
/// config, whose `conf_dir` points the manager at the shipped template
/// sets.
pub(crate) fn manager(
    framework_dir: Option<PathBuf>,
    conf_dir: Option<PathBuf>,
) -> Result<FrameworkManager> {
    let registry = FrameworkRegistry::builtin().context("Failed to build framework registry")?;
    let config = Config::load().context("Failed to load config")?;
    let framework_dir = framework_dir.unwrap_or_else(|| PathBuf::from(&config.framework_dir));
    let conf_dir = conf_dir.unwrap_or_else(|| PathBuf::from(&config.conf_dir));
    Ok(FrameworkManager::new(registry, framework_dir).with_conf_dir(conf_dir))
}
