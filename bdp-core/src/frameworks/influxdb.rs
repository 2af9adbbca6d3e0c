//! InfluxDB deployment.
//!
//! Single-node deployment on machine 0. Unlike Spark, the two settings are
//! optional and fall back to InfluxDB's stock ports, and the template set
//! is a whole directory tree rendered into the install root (the
//! distribution's config lives under `etc/`, the launch script under
//! `sbin/`), not into a flat `conf/` directory.

use super::{current_user, DeployContext, Deployer};
use crate::error::{BdpError, Result};
use crate::registry::{ArchiveFormat, Framework, FrameworkVersion};
use crate::settings::SettingsSchema;
use crate::template::{render_template_tree, Substitutions};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

const SETTING_HTTP_PORT: &str = "http_port";
const SETTING_RPC_PORT: &str = "rpc_port";

const DEFAULT_HTTP_PORT: &str = "8086";
const DEFAULT_RPC_PORT: &str = "8088";

const INFLUXDB_SETTINGS: SettingsSchema = &[
    (SETTING_HTTP_PORT, "port to bind the InfluxDB HTTP interface to"),
    (SETTING_RPC_PORT, "port to bind the InfluxDB RPC interface to"),
];

/// The InfluxDB framework with its built-in version catalogue.
pub fn influxdb_framework() -> Result<Framework> {
    let mut framework = Framework::new("influxdb", "InfluxDB", Arc::new(InfluxDbDeployer));
    framework.add_version(FrameworkVersion::new(
        "1.7.3",
        "https://dl.influxdata.com/influxdb/releases/influxdb-1.7.3_linux_amd64.tar.gz",
        ArchiveFormat::TarGz,
        "influxdb-1.7.3-1",
        "1.7.x",
    ))?;
    Ok(framework)
}

/// Deploy capability for single-node InfluxDB.
pub struct InfluxDbDeployer;

#[async_trait]
impl Deployer for InfluxDbDeployer {
    fn settings_schema(&self) -> SettingsSchema {
        INFLUXDB_SETTINGS
    }

    async fn deploy(&self, ctx: DeployContext<'_>) -> Result<String> {
        if ctx.machines.is_empty() {
            return Err(BdpError::invalid_setup(
                "InfluxDB requires at least one machine to run on",
            ));
        }

        // Both settings are optional; anything beyond them is still an error.
        let mut settings = ctx.settings;
        let http_port = settings.take_or(SETTING_HTTP_PORT, DEFAULT_HTTP_PORT);
        let rpc_port = settings.take_or(SETTING_RPC_PORT, DEFAULT_RPC_PORT);
        settings.expect_empty("InfluxDB")?;

        let master = ctx.machines[0].clone();
        ctx.progress.log(0, &format!("Selected InfluxDB machine \"{master}\"."));

        let influxdb_home = std::fs::canonicalize(ctx.install_dir)
            .map_err(|e| BdpError::io(ctx.install_dir, e))?;

        let user = current_user()?;
        let data_dir = format!("/local/{user}/influxdb");
        let mut substitutions = Substitutions::new();
        substitutions.insert("__USER__", &user);
        substitutions.insert("__HOST__", &master);
        substitutions.insert("__HTTP_PORT__", &http_port);
        substitutions.insert("__RPC_PORT__", &rpc_port);
        substitutions.insert("__HOME_DIR__", influxdb_home.display().to_string());
        substitutions.insert("__DATA_DIR__", &data_dir);

        let template_dir = ctx.template_root.join(ctx.version.template_set());
        ctx.progress.log(1, "Generating configuration files...");
        render_template_tree(&template_dir, &influxdb_home, &substitutions, ctx.progress)?;
        ctx.progress.log(2, "Configuration files generated.");

        ctx.progress.log(1, "Creating a clean environment on the InfluxDB machine...");
        let work_dir = format!("{data_dir}/");
        ctx.progress.log(2, &format!("Purging \"{work_dir}\"..."));
        ctx.shell.run(&master, &format!("rm -rf \"{work_dir}\"")).await?;
        ctx.progress.log(2, "Creating directory structure...");
        ctx.shell.run(&master, &format!("mkdir -p \"{work_dir}\"")).await?;
        ctx.progress.log(2, "Clean environment set up.");

        ctx.progress.log(1, "Starting InfluxDB daemon...");
        ctx.shell
            .run(&master, &format!("\"{}/sbin/start-influxdb\"", influxdb_home.display()))
            .await?;

        ctx.progress.log(
            1,
            &format!(
                "InfluxDB is now listening on \"{master}:{http_port}\" (HTTP) and \"{master}:{rpc_port}\" (RPC)."
            ),
        );
        info!(master = %master, http_port = %http_port, rpc_port = %rpc_port, "InfluxDB deployed");
        Ok(master)
    }
}
