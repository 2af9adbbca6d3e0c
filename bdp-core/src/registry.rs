//! The framework version registry.
//!
//! An in-memory catalogue of every framework bdp knows how to install and
//! deploy, keyed by framework key and, within a framework, by exact version
//! string. The catalogue is built once at startup by
//! [`FrameworkRegistry::builtin`] and never mutated during a deployment run.

use crate::error::{BdpError, Result};
use crate::frameworks::Deployer;
use std::collections::HashMap;
use std::sync::Arc;

/// How a framework distribution is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// A gzip-compressed tarball downloaded over HTTP.
    TarGz,
    /// A git repository cloned at install time.
    Git,
}

impl ArchiveFormat {
    /// File extension used for locally stored archives.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TarGz => "tgz",
            Self::Git => "git",
        }
    }

    /// Parse a format from its tag.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tgz" | "tar.gz" => Some(Self::TarGz),
            "git" => Some(Self::Git),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// One installable release of a framework.
///
/// Immutable after registration; owned exclusively by its [`Framework`].
#[derive(Debug, Clone)]
pub struct FrameworkVersion {
    version: String,
    archive_url: String,
    format: ArchiveFormat,
    archive_root_dir: String,
    template_set: String,
}

impl FrameworkVersion {
    /// Create a version pinned to its download artifact and template set.
    pub fn new(
        version: impl Into<String>,
        archive_url: impl Into<String>,
        format: ArchiveFormat,
        archive_root_dir: impl Into<String>,
        template_set: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            archive_url: archive_url.into(),
            format,
            archive_root_dir: archive_root_dir.into(),
            template_set: template_set.into(),
        }
    }

    /// The version string, e.g. `3.0.0`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Where the distribution archive is downloaded or cloned from.
    pub fn archive_url(&self) -> &str {
        &self.archive_url
    }

    /// The archive format.
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Name of the top-level directory inside the archive.
    pub fn archive_root_dir(&self) -> &str {
        &self.archive_root_dir
    }

    /// Identifier of the configuration template set for this version.
    pub fn template_set(&self) -> &str {
        &self.template_set
    }
}

/// A deployable big-data framework: identity, versions and a deploy
/// capability.
///
/// Versions keep insertion order and are looked up by exact string match.
/// Polymorphism across framework kinds is composition, not inheritance:
/// each framework carries an `Arc<dyn Deployer>` implementing the deploy
/// contract.
#[derive(Clone)]
pub struct Framework {
    key: String,
    name: String,
    versions: Vec<FrameworkVersion>,
    deployer: Arc<dyn Deployer>,
}

impl Framework {
    /// Create a framework with no versions yet.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        deployer: Arc<dyn Deployer>,
    ) -> Self {
        Self { key: key.into(), name: name.into(), versions: Vec::new(), deployer }
    }

    /// Internal key, e.g. `spark`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display name, e.g. `Spark`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All registered versions, in registration order.
    pub fn versions(&self) -> &[FrameworkVersion] {
        &self.versions
    }

    /// The deploy capability for this framework.
    pub fn deployer(&self) -> &Arc<dyn Deployer> {
        &self.deployer
    }

    /// Append a version; version strings must be unique within a framework.
    pub fn add_version(&mut self, version: FrameworkVersion) -> Result<()> {
        if self.versions.iter().any(|v| v.version == version.version) {
            return Err(BdpError::VersionAlreadyRegistered {
                framework: self.name.clone(),
                version: version.version,
            });
        }
        self.versions.push(version);
        Ok(())
    }

    /// Look up a version by exact string match.
    pub fn version(&self, version: &str) -> Result<&FrameworkVersion> {
        self.versions.iter().find(|v| v.version == version).ok_or_else(|| {
            BdpError::VersionNotRegistered {
                framework: self.name.clone(),
                version: version.to_string(),
            }
        })
    }

    /// The combined identifier for one version, e.g. `spark-3.0.0`; used
    /// for archive file names and install directories.
    pub fn version_identifier(&self, version: &str) -> String {
        format!("{}-{}", self.key, version)
    }
}

impl std::fmt::Debug for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framework")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("versions", &self.versions)
            .finish()
    }
}

/// Process-wide catalogue of frameworks, keyed by framework key.
#[derive(Debug, Clone, Default)]
pub struct FrameworkRegistry {
    frameworks: HashMap<String, Framework>,
}

impl FrameworkRegistry {
    /// Create an empty registry (for testing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry with every built-in framework and version.
    ///
    /// This is the process's single configuration-as-code surface; callers
    /// invoke it deliberately at startup, once.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(crate::frameworks::influxdb_framework()?)?;
        registry.register(crate::frameworks::spark_framework()?)?;
        registry.register(crate::frameworks::zookeeper_framework()?)?;
        Ok(registry)
    }

    /// Add a framework under its key; duplicate keys are rejected.
    pub fn register(&mut self, framework: Framework) -> Result<()> {
        if self.frameworks.contains_key(framework.key()) {
            return Err(BdpError::FrameworkAlreadyRegistered {
                framework: framework.key().to_string(),
            });
        }
        self.frameworks.insert(framework.key().to_string(), framework);
        Ok(())
    }

    /// Look up a framework by key.
    pub fn framework(&self, key: &str) -> Result<&Framework> {
        self.frameworks
            .get(key)
            .ok_or_else(|| BdpError::FrameworkNotRegistered { framework: key.to_string() })
    }

    /// All registered frameworks, sorted by key for stable listings.
    pub fn frameworks(&self) -> Vec<&Framework> {
        let mut all: Vec<&Framework> = self.frameworks.values().collect();
        all.sort_by(|a, b| a.key().cmp(b.key()));
        all
    }
}
