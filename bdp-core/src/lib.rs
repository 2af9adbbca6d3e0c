//! bdp Core Library
//!
//! Installs and deploys versioned Big Data frameworks (Spark, ZooKeeper,
//! InfluxDB) onto a set of machines reachable over SSH: one master, the
//! rest workers.

pub mod config;
pub mod error;
pub mod frameworks;
pub mod manager;
pub mod paths;
pub mod progress;
pub mod registry;
pub mod remote;
pub mod settings;
pub mod template;

// Re-export commonly used items
pub use config::Config;
pub use error::{BdpError, Result};
pub use frameworks::{DeployContext, Deployer};
pub use manager::FrameworkManager;
pub use progress::Progress;
pub use registry::{ArchiveFormat, Framework, FrameworkRegistry, FrameworkVersion};
pub use remote::{RemoteShell, SshShell};
pub use settings::{Settings, SettingsSchema};
pub use template::Substitutions;
