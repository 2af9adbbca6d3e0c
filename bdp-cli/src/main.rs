use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "bdp")]
#[command(about = "Install and deploy Big Data frameworks over SSH", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported Big Data frameworks
    Frameworks {
        /// List all supported versions
        #[arg(long)]
        versions: bool,
    },

    /// Download a framework distribution archive
    Download {
        /// Name of the framework
        framework: String,

        /// Version of the framework
        version: String,

        /// Force a redownload even if the archive is present
        #[arg(long)]
        force: bool,

        /// Installation directory for Big Data frameworks
        #[arg(short, long)]
        framework_dir: Option<PathBuf>,
    },

    /// Install a framework distribution
    Install {
        /// Name of the framework
        framework: String,

        /// Version of the framework
        version: String,

        /// Force a clean reinstallation of the framework
        #[arg(long)]
        reinstall: bool,

        /// Fail instead of downloading when the archive is missing
        #[arg(long)]
        no_download: bool,

        /// Installation directory for Big Data frameworks
        #[arg(short, long)]
        framework_dir: Option<PathBuf>,
    },

    /// Deploy an installed framework to a set of machines
    Deploy {
        /// Name of the framework
        framework: String,

        /// Version of the framework
        version: String,

        /// Settings as 'key=value' pairs, overriding values from settings files
        settings: Vec<String>,

        /// Machine to deploy to; the first one becomes the master
        #[arg(short, long = "machine")]
        machines: Vec<String>,

        /// Read settings from a file, imported in order of appearance
        #[arg(short, long = "settings-file", value_name = "SETTINGS_FILE")]
        settings_files: Vec<PathBuf>,

        /// List settings supported by the framework and version, then exit
        #[arg(long)]
        list_settings: bool,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,

        /// Installation directory for Big Data frameworks
        #[arg(short, long)]
        framework_dir: Option<PathBuf>,

        /// Base directory of the configuration template sets
        #[arg(long)]
        conf_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Frameworks { versions } => commands::frameworks::frameworks(versions),
        Commands::Download { framework, version, force, framework_dir } => {
            commands::download::download(&framework, &version, force, framework_dir).await
        }
        Commands::Install { framework, version, reinstall, no_download, framework_dir } => {
            commands::install::install(&framework, &version, reinstall, !no_download, framework_dir)
                .await
        }
        Commands::Deploy {
            framework,
            version,
            settings,
            machines,
            settings_files,
            list_settings,
            quiet,
            framework_dir,
            conf_dir,
        } => {
            commands::deploy::deploy(commands::deploy::DeployArgs {
                framework,
                version,
                settings,
                machines,
                settings_files,
                list_settings,
                quiet,
                framework_dir,
                conf_dir,
            })
            .await
        }
    }
}
