//! Integration tests for framework deployment.
//!
//! These tests cover the full deploy orchestration: settings validation,
//! topology selection, template rendering, remote reset and launch. Remote
//! execution uses a recording mock shell, so no SSH is needed.

use async_trait::async_trait;
use bdp_core::error::{BdpError, Result};
use bdp_core::remote::{reset_work_dirs, RemoteShell};
use bdp_core::{FrameworkManager, FrameworkRegistry, Progress, Settings};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Mock remote shell that records every command instead of running it.
#[derive(Default)]
struct RecordingShell {
    commands: Mutex<Vec<(String, String)>>,
    /// Fail the command at this index (0-based) with a non-zero exit.
    fail_at: Option<usize>,
}

impl RecordingShell {
    fn new() -> Self {
        Self::default()
    }

    fn failing_at(index: usize) -> Self {
        Self { commands: Mutex::new(Vec::new()), fail_at: Some(index) }
    }

    fn commands(&self) -> Vec<(String, String)> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteShell for RecordingShell {
    async fn run(&self, host: &str, command: &str) -> Result<()> {
        let mut commands = self.commands.lock().unwrap();
        if self.fail_at == Some(commands.len()) {
            return Err(BdpError::RemoteCommandFailed {
                host: host.to_string(),
                command: command.to_string(),
                status: 1,
            });
        }
        commands.push((host.to_string(), command.to_string()));
        Ok(())
    }
}

struct Fixture {
    _data: TempDir,
    manager: FrameworkManager,
    spark_home: PathBuf,
}

/// Lay out an installed Spark 3.0.0 with one template and build a manager
/// over it.
fn spark_fixture() -> Fixture {
    std::env::set_var("USER", "testuser");

    let data = TempDir::new().unwrap();
    let framework_dir = data.path().join("frameworks");
    let spark_home = framework_dir.join("spark-3.0.0");
    std::fs::create_dir_all(spark_home.join("conf")).unwrap();

    let template_dir = data.path().join("conf").join("spark").join("2.4.x");
    std::fs::create_dir_all(&template_dir).unwrap();
    std::fs::write(
        template_dir.join("spark-env.sh.template"),
        "export MASTER=__MASTER__\nexport SPARK_WORKER_CORES=__WORKER_CORES__\n",
    )
    .unwrap();

    let registry = FrameworkRegistry::builtin().unwrap();
    let manager = FrameworkManager::new(registry, &framework_dir)
        .with_conf_dir(data.path().join("conf"));
    Fixture { manager, spark_home, _data: data }
}

fn machines(hosts: &[&str]) -> Vec<String> {
    hosts.iter().map(|h| h.to_string()).collect()
}

fn valid_settings() -> Settings {
    let mut settings = Settings::new();
    settings.set("worker_instances", "2");
    settings.set("worker_cores", "4");
    settings.set("worker_memory", "8g");
    settings
}

fn config_dir_is_untouched(spark_home: &Path) {
    let entries: Vec<_> = std::fs::read_dir(spark_home.join("conf")).unwrap().collect();
    assert!(entries.is_empty(), "validation failure must precede any filesystem write");
}

#[tokio::test]
async fn deploy_rejects_fewer_than_two_machines() {
    let fixture = spark_fixture();
    let shell = RecordingShell::new();

    let err = fixture
        .manager
        .deploy("spark", "3.0.0", &machines(&["m0"]), valid_settings(), &shell, &Progress::quiet())
        .await
        .unwrap_err();

    match err {
        BdpError::InvalidSetup { reason } => assert!(reason.contains("at least two machines")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(shell.commands().is_empty());
    config_dir_is_untouched(&fixture.spark_home);
}

#[tokio::test]
async fn deploy_rejects_missing_setting_before_any_side_effect() {
    let fixture = spark_fixture();
    let shell = RecordingShell::new();
    let mut settings = valid_settings();
    settings.take("worker_memory").unwrap();

    let err = fixture
        .manager
        .deploy("spark", "3.0.0", &machines(&["m0", "w0"]), settings, &shell, &Progress::quiet())
        .await
        .unwrap_err();

    match err {
        BdpError::InvalidSetup { reason } => assert!(reason.contains("worker_memory")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(shell.commands().is_empty());
    config_dir_is_untouched(&fixture.spark_home);
}

#[tokio::test]
async fn deploy_rejects_unknown_settings_before_any_side_effect() {
    let fixture = spark_fixture();
    let shell = RecordingShell::new();
    let mut settings = valid_settings();
    settings.set("worker_color", "blue");

    let err = fixture
        .manager
        .deploy("spark", "3.0.0", &machines(&["m0", "w0"]), settings, &shell, &Progress::quiet())
        .await
        .unwrap_err();

    match err {
        BdpError::InvalidSetup { reason } => {
            assert!(reason.contains("unknown settings for Spark"));
            assert!(reason.contains("'worker_color'"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(shell.commands().is_empty());
    config_dir_is_untouched(&fixture.spark_home);
}

#[tokio::test]
async fn deploy_renders_configuration_and_launches_master() {
    let fixture = spark_fixture();
    let shell = RecordingShell::new();

    let master = fixture
        .manager
        .deploy(
            "spark",
            "3.0.0",
            &machines(&["m0", "w0", "w1"]),
            valid_settings(),
            &shell,
            &Progress::quiet(),
        )
        .await
        .unwrap();
    assert_eq!(master, "m0");

    let conf = fixture.spark_home.join("conf");
    let env = std::fs::read_to_string(conf.join("spark-env.sh")).unwrap();
    assert_eq!(env, "export MASTER=m0\nexport SPARK_WORKER_CORES=4\n");
    assert_eq!(std::fs::read_to_string(conf.join("master")).unwrap(), "m0\n");
    assert_eq!(std::fs::read_to_string(conf.join("slaves")).unwrap(), "w0\nw1\n");

    let commands = shell.commands();
    let work_dir = "/local/testuser/spark/";
    let expected_prefix = vec![
        ("m0", format!("rm -rf \"{work_dir}\"")),
        ("w0", format!("rm -rf \"{work_dir}\"")),
        ("w1", format!("rm -rf \"{work_dir}\"")),
        ("m0", format!("mkdir -p \"{work_dir}\"")),
        ("m0", format!("chmod 0770 \"{work_dir}\"")),
        ("w0", format!("mkdir -p \"{work_dir}\"")),
        ("w0", format!("chmod 0770 \"{work_dir}\"")),
        ("w1", format!("mkdir -p \"{work_dir}\"")),
        ("w1", format!("chmod 0770 \"{work_dir}\"")),
    ];
    assert_eq!(commands.len(), expected_prefix.len() + 1);
    for (actual, (host, command)) in commands.iter().zip(&expected_prefix) {
        assert_eq!(actual.0, *host);
        assert_eq!(actual.1, *command);
    }
    let (launch_host, launch_command) = commands.last().unwrap();
    assert_eq!(launch_host, "m0");
    assert!(launch_command.ends_with("/sbin/start-all.sh"));
}

#[tokio::test]
async fn deploy_aborts_on_first_failing_remote_command() {
    let fixture = spark_fixture();
    // Fail the third remote command (purge on w1).
    let shell = RecordingShell::failing_at(2);

    let err = fixture
        .manager
        .deploy(
            "spark",
            "3.0.0",
            &machines(&["m0", "w0", "w1"]),
            valid_settings(),
            &shell,
            &Progress::quiet(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BdpError::RemoteCommandFailed { .. }));
    // Nothing past the failing step ran.
    assert_eq!(shell.commands().len(), 2);
}

#[tokio::test]
async fn reset_work_dirs_is_repeatable() {
    let shell = RecordingShell::new();
    let workers = machines(&["w0", "w1"]);
    let progress = Progress::quiet();

    reset_work_dirs(&shell, "/local/testuser/spark/", "m0", &workers, &progress).await.unwrap();
    let first_run = shell.commands();
    reset_work_dirs(&shell, "/local/testuser/spark/", "m0", &workers, &progress).await.unwrap();
    let both_runs = shell.commands();

    assert_eq!(both_runs.len(), first_run.len() * 2);
    assert_eq!(&both_runs[first_run.len()..], first_run.as_slice());
}

#[tokio::test]
async fn zookeeper_deploys_on_a_single_machine() {
    std::env::set_var("USER", "testuser");
    let data = TempDir::new().unwrap();
    let framework_dir = data.path().join("frameworks");
    let home = framework_dir.join("zookeeper-3.4.8");
    std::fs::create_dir_all(home.join("conf")).unwrap();
    let template_dir = data.path().join("conf").join("zookeeper").join("3.4.x");
    std::fs::create_dir_all(&template_dir).unwrap();
    std::fs::write(template_dir.join("zoo.cfg.template"), "dataDir=/local/__USER__/zookeeper\n")
        .unwrap();

    let manager = FrameworkManager::new(FrameworkRegistry::builtin().unwrap(), &framework_dir)
        .with_conf_dir(data.path().join("conf"));
    let shell = RecordingShell::new();

    let master = manager
        .deploy("zookeeper", "3.4.8", &machines(&["m0"]), Settings::new(), &shell, &Progress::quiet())
        .await
        .unwrap();
    assert_eq!(master, "m0");

    let rendered = std::fs::read_to_string(home.join("conf").join("zoo.cfg")).unwrap();
    assert_eq!(rendered, "dataDir=/local/testuser/zookeeper\n");

    let commands = shell.commands();
    assert_eq!(commands.len(), 3);
    assert!(commands[0].1.starts_with("rm -rf"));
    assert!(commands[1].1.starts_with("mkdir -p"));
    assert!(commands[2].1.contains("zkServer.sh"));
    assert!(commands.iter().all(|(host, _)| host == "m0"));
}

struct InfluxDbFixture {
    _data: TempDir,
    manager: FrameworkManager,
    home: PathBuf,
}

/// Lay out an installed InfluxDB 1.7.3 with a nested template tree, the way
/// its distribution carries config under `etc/` and the launch script under
/// `sbin/`.
fn influxdb_fixture() -> InfluxDbFixture {
    std::env::set_var("USER", "testuser");

    let data = TempDir::new().unwrap();
    let framework_dir = data.path().join("frameworks");
    let home = framework_dir.join("influxdb-1.7.3");
    std::fs::create_dir_all(&home).unwrap();

    let template_dir = data.path().join("conf").join("influxdb").join("1.7.x");
    std::fs::create_dir_all(template_dir.join("etc").join("influxdb")).unwrap();
    std::fs::create_dir_all(template_dir.join("sbin")).unwrap();
    std::fs::write(
        template_dir.join("etc").join("influxdb").join("influxdb.conf.template"),
        "bind-address = \"__HOST__:__RPC_PORT__\"\nhttp = \"__HOST__:__HTTP_PORT__\"\ndir = \"__DATA_DIR__/data\"\n",
    )
    .unwrap();
    std::fs::write(
        template_dir.join("sbin").join("start-influxdb.template"),
        "#!/usr/bin/env bash\n\"__HOME_DIR__/usr/bin/influxd\" -config \"__HOME_DIR__/etc/influxdb/influxdb.conf\" &\n",
    )
    .unwrap();

    let manager = FrameworkManager::new(FrameworkRegistry::builtin().unwrap(), &framework_dir)
        .with_conf_dir(data.path().join("conf"));
    InfluxDbFixture { manager, home, _data: data }
}

#[tokio::test]
async fn influxdb_deploys_with_default_ports() {
    let fixture = influxdb_fixture();
    let shell = RecordingShell::new();

    let master = fixture
        .manager
        .deploy("influxdb", "1.7.3", &machines(&["m0"]), Settings::new(), &shell, &Progress::quiet())
        .await
        .unwrap();
    assert_eq!(master, "m0");

    // The template tree is rendered into the install root, not conf/.
    let conf = std::fs::read_to_string(
        fixture.home.join("etc").join("influxdb").join("influxdb.conf"),
    )
    .unwrap();
    assert!(conf.contains("bind-address = \"m0:8088\""));
    assert!(conf.contains("http = \"m0:8086\""));
    assert!(conf.contains("dir = \"/local/testuser/influxdb/data\""));

    let home = std::fs::canonicalize(&fixture.home).unwrap();
    let script =
        std::fs::read_to_string(fixture.home.join("sbin").join("start-influxdb")).unwrap();
    assert!(script.contains(&format!("\"{}/usr/bin/influxd\"", home.display())));

    let commands = shell.commands();
    let work_dir = "/local/testuser/influxdb/";
    assert_eq!(commands.len(), 3);
    assert_eq!(commands[0], ("m0".to_string(), format!("rm -rf \"{work_dir}\"")));
    assert_eq!(commands[1], ("m0".to_string(), format!("mkdir -p \"{work_dir}\"")));
    assert_eq!(
        commands[2],
        ("m0".to_string(), format!("\"{}/sbin/start-influxdb\"", home.display()))
    );
}

#[tokio::test]
async fn influxdb_port_settings_override_the_defaults() {
    let fixture = influxdb_fixture();
    let shell = RecordingShell::new();
    let mut settings = Settings::new();
    settings.set("http_port", "9086");

    fixture
        .manager
        .deploy("influxdb", "1.7.3", &machines(&["m0"]), settings, &shell, &Progress::quiet())
        .await
        .unwrap();

    let conf = std::fs::read_to_string(
        fixture.home.join("etc").join("influxdb").join("influxdb.conf"),
    )
    .unwrap();
    assert!(conf.contains("http = \"m0:9086\""));
    // The untouched setting keeps its default.
    assert!(conf.contains("bind-address = \"m0:8088\""));
}

#[tokio::test]
async fn influxdb_rejects_unknown_settings_and_empty_machine_list() {
    let fixture = influxdb_fixture();
    let shell = RecordingShell::new();
    let mut settings = Settings::new();
    settings.set("udp_port", "8089");

    let err = fixture
        .manager
        .deploy("influxdb", "1.7.3", &machines(&["m0"]), settings, &shell, &Progress::quiet())
        .await
        .unwrap_err();
    match err {
        BdpError::InvalidSetup { reason } => {
            assert!(reason.contains("unknown settings for InfluxDB"));
            assert!(reason.contains("'udp_port'"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = fixture
        .manager
        .deploy("influxdb", "1.7.3", &[], Settings::new(), &shell, &Progress::quiet())
        .await
        .unwrap_err();
    assert!(matches!(err, BdpError::InvalidSetup { .. }));
    assert!(shell.commands().is_empty());
}

#[tokio::test]
async fn unknown_framework_and_version_are_lookup_errors() {
    let fixture = spark_fixture();
    let shell = RecordingShell::new();

    let err = fixture
        .manager
        .deploy("flink", "1.0", &machines(&["m0", "w0"]), Settings::new(), &shell, &Progress::quiet())
        .await
        .unwrap_err();
    assert!(matches!(err, BdpError::FrameworkNotRegistered { .. }));

    let err = fixture
        .manager
        .deploy("spark", "9.9.9", &machines(&["m0", "w0"]), Settings::new(), &shell, &Progress::quiet())
        .await
        .unwrap_err();
    assert!(matches!(err, BdpError::VersionNotRegistered { .. }));
    assert!(shell.commands().is_empty());
}

#[test]
fn supported_settings_expose_the_spark_schema() {
    std::env::set_var("USER", "testuser");
    let registry = FrameworkRegistry::builtin().unwrap();
    let manager = FrameworkManager::new(registry, "/tmp/bdp-unused");

    let schema = manager.supported_settings("spark", "3.0.0").unwrap();
    let keys: Vec<&str> = schema.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys, vec!["worker_instances", "worker_cores", "worker_memory"]);

    assert!(manager.supported_settings("zookeeper", "3.4.8").unwrap().is_empty());

    let influxdb = manager.supported_settings("influxdb", "1.7.3").unwrap();
    let keys: Vec<&str> = influxdb.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys, vec!["http_port", "rpc_port"]);
}
