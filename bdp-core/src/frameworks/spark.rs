//! Spark deployment.
//!
//! Deploys a standalone Spark cluster: machine 0 runs the driver, the rest
//! run workers. Configuration comes from the version's template set,
//! rendered into `<root>/conf`; the cluster is started through Spark's own
//! `start-all.sh` on the master, which in turn reaches the workers.

use super::{current_user, DeployContext, Deployer};
use crate::error::{BdpError, Result};
use crate::registry::{ArchiveFormat, Framework, FrameworkVersion};
use crate::remote::reset_work_dirs;
use crate::settings::SettingsSchema;
use crate::template::{render_templates, write_topology_files, Substitutions};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::info;

const SETTING_WORKER_INSTANCES: &str = "worker_instances";
const SETTING_WORKER_CORES: &str = "worker_cores";
const SETTING_WORKER_MEMORY: &str = "worker_memory";

const SPARK_SETTINGS: SettingsSchema = &[
    (SETTING_WORKER_INSTANCES, "worker instances to launch per node"),
    (SETTING_WORKER_CORES, "cores available per worker instance to Spark"),
    (SETTING_WORKER_MEMORY, "memory available per worker instance to Spark"),
];

static SPARK_VERSIONS: Lazy<Vec<FrameworkVersion>> = Lazy::new(|| {
    vec![
        FrameworkVersion::new(
            "2.4.0",
            "https://archive.apache.org/dist/spark/spark-2.4.0/spark-2.4.0-bin-hadoop2.6.tgz",
            ArchiveFormat::TarGz,
            "spark-2.4.0-bin-hadoop2.6",
            "2.4.x",
        ),
        FrameworkVersion::new(
            "3.0.0",
            "https://archive.apache.org/dist/spark/spark-3.0.0/spark-3.0.0-bin-hadoop2.7.tgz",
            ArchiveFormat::TarGz,
            "spark-3.0.0-bin-hadoop2.7",
            "2.4.x",
        ),
        FrameworkVersion::new(
            "3.0.2",
            "https://archive.apache.org/dist/spark/spark-3.0.2/spark-3.0.2-bin-hadoop2.7.tgz",
            ArchiveFormat::TarGz,
            "spark-3.0.2-bin-hadoop2.7",
            "2.4.x",
        ),
        FrameworkVersion::new(
            "3.1.1",
            "https://apache.mirror.wearetriple.com/spark/spark-3.1.1/spark-3.1.1-bin-hadoop3.2.tgz",
            ArchiveFormat::TarGz,
            "spark-3.1.1-bin-hadoop3.2",
            "2.4.x",
        ),
        FrameworkVersion::new(
            "custom",
            "https://github.com/kazemaksOG/spark-custom-scheduler.git",
            ArchiveFormat::Git,
            "spark-custom",
            "custom",
        ),
        FrameworkVersion::new(
            "3.5.5-custom",
            "https://github.com/kazemaksOG/spark-3.5.5-custom",
            ArchiveFormat::Git,
            "spark-3.5.5-custom",
            "custom",
        ),
    ]
});

/// The Spark framework with its built-in version catalogue.
pub fn spark_framework() -> Result<Framework> {
    let mut framework = Framework::new("spark", "Spark", Arc::new(SparkDeployer));
    for version in SPARK_VERSIONS.iter() {
        framework.add_version(version.clone())?;
    }
    Ok(framework)
}

/// Deploy capability for standalone Spark clusters.
pub struct SparkDeployer;

#[async_trait]
impl Deployer for SparkDeployer {
    fn settings_schema(&self) -> SettingsSchema {
        SPARK_SETTINGS
    }

    async fn deploy(&self, ctx: DeployContext<'_>) -> Result<String> {
        if ctx.machines.len() < 2 {
            return Err(BdpError::invalid_setup(format!(
                "Spark requires at least two machines: a master and at least one worker, provided {}",
                ctx.machines.len()
            )));
        }

        // Settings are validated before any filesystem or remote side effect.
        let mut settings = ctx.settings;
        let worker_instances = settings.take(SETTING_WORKER_INSTANCES)?;
        let worker_cores = settings.take(SETTING_WORKER_CORES)?;
        let worker_memory = settings.take(SETTING_WORKER_MEMORY)?;
        settings.expect_empty("Spark")?;

        let master = ctx.machines[0].clone();
        let workers = &ctx.machines[1..];
        ctx.progress.log(
            0,
            &format!("Deploying Spark driver on \"{master}\", with {} workers.", workers.len()),
        );

        // SPARK_HOME must be an absolute path for the remote start script.
        let spark_home = std::fs::canonicalize(ctx.install_dir)
            .map_err(|e| BdpError::io(ctx.install_dir, e))?;

        let user = current_user()?;
        let mut substitutions = Substitutions::new();
        substitutions.insert("__USER__", &user);
        substitutions.insert("__MASTER__", &master);
        substitutions.insert("__WORKER_INSTANCES__", &worker_instances);
        substitutions.insert("__WORKER_CORES__", &worker_cores);
        substitutions.insert("__WORKER_MEMORY__", &worker_memory);

        let template_dir = ctx.template_root.join(ctx.version.template_set());
        let config_dir = spark_home.join("conf");
        ctx.progress.log(1, "Generating configuration files...");
        render_templates(&template_dir, &config_dir, &substitutions, ctx.progress)?;
        write_topology_files(&config_dir, &master, workers, ctx.progress)?;
        ctx.progress.log(2, "Configuration files generated.");

        ctx.progress.log(1, "Creating a clean environment on the master and workers...");
        let work_dir = format!("/local/{user}/spark/");
        reset_work_dirs(ctx.shell, &work_dir, &master, workers, ctx.progress).await?;

        ctx.progress.log(1, "Deploying Spark...");
        ctx.shell
            .run(&master, &format!("{}/sbin/start-all.sh", spark_home.display()))
            .await?;

        ctx.progress.log(1, "Spark cluster deployed.");
        info!(master = %master, workers = workers.len(), "Spark cluster deployed");
        Ok(master)
    }
}
