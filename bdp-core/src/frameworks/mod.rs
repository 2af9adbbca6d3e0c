//! Framework implementations and the deploy capability they share.
//!
//! Every framework follows the same orchestration: validate settings,
//! select topology, render configuration templates, reset remote working
//! directories, launch the cluster on the master. Each implementation is a
//! [`Deployer`] composed into a [`crate::registry::Framework`].

mod influxdb;
mod spark;
mod zookeeper;

pub use influxdb::{influxdb_framework, InfluxDbDeployer};
pub use spark::{spark_framework, SparkDeployer};
pub use zookeeper::{zookeeper_framework, ZookeeperDeployer};

use crate::error::{BdpError, Result};
use crate::progress::Progress;
use crate::registry::FrameworkVersion;
use crate::remote::RemoteShell;
use crate::settings::{Settings, SettingsSchema};
use async_trait::async_trait;
use std::path::Path;

/// Everything one deployment run needs, bundled at the call site.
pub struct DeployContext<'a> {
    /// Installation root of the unpacked distribution.
    pub install_dir: &'a Path,
    /// Base directory of this framework's template sets.
    pub template_root: &'a Path,
    /// The resolved version being deployed.
    pub version: &'a FrameworkVersion,
    /// Ordered machine list; position 0 is the master.
    pub machines: &'a [String],
    /// Raw deployment settings; consumed by validation.
    pub settings: Settings,
    /// Remote command transport.
    pub shell: &'a dyn RemoteShell,
    /// Progress reporter.
    pub progress: &'a Progress,
}

/// The deploy capability every framework implements.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// The deployment settings this framework requires.
    fn settings_schema(&self) -> SettingsSchema;

    /// Run one deployment, returning the resolved master host.
    async fn deploy(&self, ctx: DeployContext<'_>) -> Result<String>;
}

/// Name of the invoking user, taken from the environment.
pub(crate) fn current_user() -> Result<String> {
    std::env::var("USER")
        .map_err(|_| BdpError::invalid_setup("USER environment variable is not set"))
}
