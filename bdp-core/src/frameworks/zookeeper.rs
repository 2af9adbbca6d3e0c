//! ZooKeeper deployment.
//!
//! Single-node deployment: only machine 0 is used. ZooKeeper takes no
//! deployment settings; its templates only need the invoking user.

use super::{current_user, DeployContext, Deployer};
use crate::error::{BdpError, Result};
use crate::registry::{ArchiveFormat, Framework, FrameworkVersion};
use crate::settings::SettingsSchema;
use crate::template::{render_templates, Substitutions};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Client port ZooKeeper listens on after launch.
const ZOOKEEPER_CLIENT_PORT: u16 = 2181;

/// The ZooKeeper framework with its built-in version catalogue.
pub fn zookeeper_framework() -> Result<Framework> {
    let mut framework = Framework::new("zookeeper", "ZooKeeper", Arc::new(ZookeeperDeployer));
    framework.add_version(FrameworkVersion::new(
        "3.4.8",
        "https://archive.apache.org/dist/zookeeper/zookeeper-3.4.8/zookeeper-3.4.8.tar.gz",
        ArchiveFormat::TarGz,
        "zookeeper-3.4.8",
        "3.4.x",
    ))?;
    Ok(framework)
}

/// Deploy capability for single-node ZooKeeper.
pub struct ZookeeperDeployer;

#[async_trait]
impl Deployer for ZookeeperDeployer {
    fn settings_schema(&self) -> SettingsSchema {
        &[]
    }

    async fn deploy(&self, ctx: DeployContext<'_>) -> Result<String> {
        if ctx.machines.is_empty() {
            return Err(BdpError::invalid_setup(
                "ZooKeeper requires at least one machine to run on",
            ));
        }
        ctx.settings.validate(self.settings_schema(), "ZooKeeper")?;

        let master = ctx.machines[0].clone();
        ctx.progress.log(0, &format!("Selected ZooKeeper machine \"{master}\"."));

        let zookeeper_home = std::fs::canonicalize(ctx.install_dir)
            .map_err(|e| BdpError::io(ctx.install_dir, e))?;

        let user = current_user()?;
        let mut substitutions = Substitutions::new();
        substitutions.insert("__USER__", &user);

        let template_dir = ctx.template_root.join(ctx.version.template_set());
        let config_dir = zookeeper_home.join("conf");
        ctx.progress.log(1, "Generating configuration files...");
        render_templates(&template_dir, &config_dir, &substitutions, ctx.progress)?;
        ctx.progress.log(2, "Configuration files generated.");

        ctx.progress.log(1, "Creating a clean environment on the ZooKeeper machine...");
        let work_dir = format!("/local/{user}/zookeeper/");
        ctx.progress.log(2, &format!("Purging \"{work_dir}\"..."));
        ctx.shell.run(&master, &format!("rm -rf \"{work_dir}\"")).await?;
        ctx.progress.log(2, "Creating directory structure...");
        ctx.shell.run(&master, &format!("mkdir -p \"{work_dir}\"")).await?;
        ctx.progress.log(2, "Clean environment set up.");

        ctx.progress.log(1, "Deploying ZooKeeper...");
        ctx.shell
            .run(&master, &format!("\"{}/bin/zkServer.sh\" start", zookeeper_home.display()))
            .await?;

        ctx.progress.log(
            1,
            &format!("ZooKeeper is now listening on \"{master}:{ZOOKEEPER_CLIENT_PORT}\"."),
        );
        info!(master = %master, "ZooKeeper deployed");
        Ok(master)
    }
}
