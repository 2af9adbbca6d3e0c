//! Framework distribution management: download, install, deploy.
//!
//! The manager owns the on-disk layout under the framework directory:
//!
//! ```text
//! <framework_dir>/archives/<key>-<version>.<ext>   downloaded archives
//! <framework_dir>/<key>-<version>/                 unpacked installations
//! ```

use crate::error::{BdpError, Result};
use crate::frameworks::DeployContext;
use crate::paths;
use crate::progress::Progress;
use crate::registry::{ArchiveFormat, Framework, FrameworkRegistry, FrameworkVersion};
use crate::remote::RemoteShell;
use crate::settings::{Settings, SettingsSchema};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Downloads, installs and deploys framework distributions resolved through
/// a [`FrameworkRegistry`].
pub struct FrameworkManager {
    registry: FrameworkRegistry,
    framework_dir: PathBuf,
    conf_dir: PathBuf,
}

impl FrameworkManager {
    /// Create a manager over a registry and a framework directory.
    pub fn new(registry: FrameworkRegistry, framework_dir: impl Into<PathBuf>) -> Self {
        Self { registry, framework_dir: framework_dir.into(), conf_dir: paths::conf_dir() }
    }

    /// Override the template-set base directory (default: `paths::conf_dir()`).
    #[must_use]
    pub fn with_conf_dir(mut self, conf_dir: impl Into<PathBuf>) -> Self {
        self.conf_dir = conf_dir.into();
        self
    }

    /// The registry this manager resolves frameworks through.
    pub fn registry(&self) -> &FrameworkRegistry {
        &self.registry
    }

    /// Base directory of the configuration template sets.
    pub fn conf_dir(&self) -> &Path {
        &self.conf_dir
    }

    /// Directory where downloaded archives are kept.
    pub fn archive_dir(&self) -> PathBuf {
        self.framework_dir.join("archives")
    }

    fn archive_file(&self, framework: &Framework, version: &FrameworkVersion) -> PathBuf {
        self.archive_dir().join(format!(
            "{}.{}",
            framework.version_identifier(version.version()),
            version.format().extension()
        ))
    }

    fn install_dir(&self, framework: &Framework, version: &FrameworkVersion) -> PathBuf {
        self.framework_dir.join(framework.version_identifier(version.version()))
    }

    /// Fetch a framework distribution archive.
    ///
    /// A previously downloaded archive is kept unless `force_redownload` is
    /// set.
    pub async fn download(
        &self,
        framework_key: &str,
        version: &str,
        force_redownload: bool,
        progress: &Progress,
    ) -> Result<()> {
        let framework = self.registry.framework(framework_key)?;
        let framework_version = framework.version(version)?;
        progress.log(
            0,
            &format!("Obtaining {} version {} distribution...", framework.name(), version),
        );

        let archive_file = self.archive_file(framework, framework_version);
        progress.log(
            1,
            &format!("Checking if archive for {} version {} is present...", framework.name(), version),
        );
        if archive_file.is_file() {
            if force_redownload {
                progress.log(2, "Found a previously downloaded archive. Removing for a forced redownload.");
                std::fs::remove_file(&archive_file).map_err(|e| BdpError::io(&archive_file, e))?;
            } else {
                progress.log(2, "Found a previously downloaded archive. Skipping download.");
                return Ok(());
            }
        } else {
            progress.log(2, "Archive not present.");
            let archive_dir = self.archive_dir();
            std::fs::create_dir_all(&archive_dir).map_err(|e| BdpError::DownloadFailed {
                reason: format!(
                    "cannot create directory \"{}\" to store the archive: {e}",
                    archive_dir.display()
                ),
            })?;
        }

        let url = framework_version.archive_url();
        progress.log(
            1,
            &format!("Downloading {} version {} from \"{url}\"...", framework.name(), version),
        );
        let mut response = reqwest::get(url)
            .await
            .map_err(|e| BdpError::DownloadFailed { reason: format!("request to \"{url}\" failed: {e}") })?;
        if !response.status().is_success() {
            return Err(BdpError::DownloadFailed {
                reason: format!("\"{url}\" answered with HTTP status {}", response.status()),
            });
        }
        let mut archive = tokio::fs::File::create(&archive_file)
            .await
            .map_err(|e| BdpError::io(&archive_file, e))?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| BdpError::DownloadFailed { reason: format!("transfer from \"{url}\" failed: {e}") })?
        {
            archive.write_all(&chunk).await.map_err(|e| BdpError::io(&archive_file, e))?;
        }
        archive.flush().await.map_err(|e| BdpError::io(&archive_file, e))?;
        progress.log(2, "Download complete.");
        Ok(())
    }

    /// Install a framework distribution into the framework directory.
    ///
    /// Tarball versions are extracted from the local archive (downloading
    /// it first when `download_if_missing` allows); git versions are cloned
    /// and left for manual compilation.
    pub async fn install(
        &self,
        framework_key: &str,
        version: &str,
        force_reinstall: bool,
        download_if_missing: bool,
        progress: &Progress,
    ) -> Result<()> {
        let framework = self.registry.framework(framework_key)?;
        let framework_version = framework.version(version)?;
        progress.log(0, &format!("Installing {} version {}...", framework.name(), version));

        let target_dir = self.install_dir(framework, framework_version);
        progress.log(
            1,
            &format!("Checking for a previous installation of {} version {}...", framework.name(), version),
        );
        if target_dir.exists() {
            if force_reinstall {
                progress.log(2, "Found a previous installation. Removing for a forced reinstall.");
                std::fs::remove_dir_all(&target_dir).map_err(|e| BdpError::io(&target_dir, e))?;
            } else {
                progress.log(2, "Found a previous installation.");
                return Ok(());
            }
        } else {
            progress.log(2, "Found no previous installation.");
        }

        std::fs::create_dir_all(&self.framework_dir)
            .map_err(|e| BdpError::io(&self.framework_dir, e))?;

        match framework_version.format() {
            ArchiveFormat::Git => {
                progress.log(
                    1,
                    &format!("Cloning {} from \"{}\"...", framework.name(), framework_version.archive_url()),
                );
                self.clone_repository(framework_version, &target_dir).await?;
                progress.log(
                    1,
                    &format!(
                        "Clone complete. Navigate to \"{}\" and compile it manually with ./build/sbt package.",
                        target_dir.display()
                    ),
                );
            }
            ArchiveFormat::TarGz => {
                let archive_file = self.archive_file(framework, framework_version);
                if archive_file.is_file() {
                    progress.log(1, &format!("Found {} version {} archive.", framework.name(), version));
                } else if download_if_missing {
                    self.download(framework_key, version, false, &progress.nested(1)).await?;
                } else {
                    return Err(BdpError::MissingArchive { path: archive_file });
                }

                progress.log(1, &format!("Extracting {} version {} archive...", framework.name(), version));
                self.extract_archive(&archive_file, framework_version, &target_dir)?;
                progress.log(2, "Extraction complete.");
            }
        }

        progress.log(
            1,
            &format!(
                "{} version {} is now available at \"{}\".",
                framework.name(),
                version,
                target_dir.display()
            ),
        );
        Ok(())
    }

    async fn clone_repository(
        &self,
        framework_version: &FrameworkVersion,
        target_dir: &Path,
    ) -> Result<()> {
        let status = tokio::process::Command::new("git")
            .arg("clone")
            .arg(framework_version.archive_url())
            .arg(target_dir)
            .arg("--depth=1")
            .status()
            .await
            .map_err(|e| BdpError::InstallFailed { reason: format!("failed to run git: {e}") })?;
        if !status.success() {
            return Err(BdpError::InstallFailed {
                reason: format!(
                    "git clone of \"{}\" exited with status {}",
                    framework_version.archive_url(),
                    status.code().unwrap_or(-1)
                ),
            });
        }
        Ok(())
    }

    /// Extract the archive into a temporary directory next to the target,
    /// then move the archive's root directory into place. Extraction into a
    /// sibling keeps the final move on one filesystem.
    fn extract_archive(
        &self,
        archive_file: &Path,
        framework_version: &FrameworkVersion,
        target_dir: &Path,
    ) -> Result<()> {
        let extract_dir = tempfile::TempDir::new_in(&self.framework_dir).map_err(|e| {
            BdpError::InstallFailed { reason: format!("failed to create temporary extraction directory: {e}") }
        })?;
        debug!(archive = %archive_file.display(), "Extracting archive");

        let archive = std::fs::File::open(archive_file).map_err(|e| BdpError::io(archive_file, e))?;
        let decoder = flate2::read::GzDecoder::new(archive);
        tar::Archive::new(decoder).unpack(extract_dir.path()).map_err(|e| {
            BdpError::InstallFailed {
                reason: format!("failed to extract \"{}\": {e}", archive_file.display()),
            }
        })?;

        let unpacked_root = extract_dir.path().join(framework_version.archive_root_dir());
        if !unpacked_root.is_dir() {
            warn!(root = %unpacked_root.display(), "Archive root directory not found after extraction");
            return Err(BdpError::InstallFailed {
                reason: format!(
                    "archive \"{}\" does not contain root directory \"{}\"",
                    archive_file.display(),
                    framework_version.archive_root_dir()
                ),
            });
        }
        std::fs::rename(&unpacked_root, target_dir).map_err(|e| BdpError::io(target_dir, e))?;
        Ok(())
    }

    /// Deploy an installed framework version to an ordered machine list.
    ///
    /// Returns the resolved master host.
    pub async fn deploy(
        &self,
        framework_key: &str,
        version: &str,
        machines: &[String],
        settings: Settings,
        shell: &dyn RemoteShell,
        progress: &Progress,
    ) -> Result<String> {
        let framework = self.registry.framework(framework_key)?;
        let framework_version = framework.version(version)?;
        progress.log(
            0,
            &format!(
                "Deploying {} version {} to cluster of {} machines...",
                framework.name(),
                version,
                machines.len()
            ),
        );

        let install_dir = self.install_dir(framework, framework_version);
        let template_root = self.conf_dir.join(framework.key());
        let nested = progress.nested(1);
        let ctx = DeployContext {
            install_dir: &install_dir,
            template_root: &template_root,
            version: framework_version,
            machines,
            settings,
            shell,
            progress: &nested,
        };
        framework.deployer().deploy(ctx).await
    }

    /// The deployment settings supported by a framework version.
    pub fn supported_settings(&self, framework_key: &str, version: &str) -> Result<SettingsSchema> {
        let framework = self.registry.framework(framework_key)?;
        framework.version(version)?;
        Ok(framework.deployer().settings_schema())
    }
}
