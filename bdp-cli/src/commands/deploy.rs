//! `bdp deploy` command - deploy an installed framework to a cluster.
//!
//! On success prints exactly one machine-parseable line,
//! `MASTER_NODE:<hostname>`, naming the host that became master.

use anyhow::{Context, Result};
use bdp_core::{Progress, Settings, SshShell};
use colored::Colorize;
use std::path::PathBuf;

pub struct DeployArgs {
    pub framework: String,
    pub version: String,
    pub settings: Vec<String>,
    pub machines: Vec<String>,
    pub settings_files: Vec<PathBuf>,
    pub list_settings: bool,
    pub quiet: bool,
    pub framework_dir: Option<PathBuf>,
    pub conf_dir: Option<PathBuf>,
}

/// Deploy a framework version, or list its supported settings.
pub async fn deploy(args: DeployArgs) -> Result<()> {
    let manager = super::manager(args.framework_dir, args.conf_dir)?;

    if args.list_settings {
        let schema = manager
            .supported_settings(&args.framework, &args.version)
            .context("Failed to look up framework settings")?;
        if schema.is_empty() {
            println!("No settings available");
            return Ok(());
        }
        let width = schema.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, description) in schema {
            println!("{:width$}  {}", key, description);
        }
        return Ok(());
    }

    // Settings files first, command-line pairs override.
    let mut settings = Settings::new();
    for file in &args.settings_files {
        settings
            .merge_file(file)
            .with_context(|| format!("Failed to read settings file {}", file.display()))?;
    }
    for pair in &args.settings {
        settings.set_pair(pair).context("Invalid setting on command line")?;
    }

    let shell = SshShell::new();
    let progress = if args.quiet { Progress::quiet() } else { Progress::stdout() };
    if !args.quiet {
        println!("Remote command output is logged to {}", shell.log_path().display().to_string().cyan());
    }

    let master = manager
        .deploy(&args.framework, &args.version, &args.machines, settings, &shell, &progress)
        .await
        .with_context(|| format!("Failed to deploy {} {}", args.framework, args.version))?;

    println!("MASTER_NODE:{master}");
    Ok(())
}
