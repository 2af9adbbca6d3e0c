//! Deployment settings and their validation.
//!
//! Settings arrive as an open-ended `key=value` mapping from settings files
//! and command-line pairs. Each framework declares a fixed schema of
//! `(key, description)` pairs; validation consumes the mapping, so a
//! settings value left over after all schema keys are taken is an error.

use crate::error::{BdpError, Result};
use std::collections::HashMap;
use std::path::Path;

/// A framework's required deployment settings: `(key, description)` pairs.
pub type SettingsSchema = &'static [(&'static str, &'static str)];

/// A mutable mapping from setting name to raw value.
///
/// Consumed by validation; callers must not reuse it afterwards.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Create an empty settings mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a setting, replacing any previous value for the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Insert a setting given as a `key=value` pair.
    pub fn set_pair(&mut self, pair: &str) -> Result<()> {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(BdpError::invalid_setup(format!(
                "Setting \"{pair}\" is not a \"key=value\" pair"
            )));
        };
        self.set(key.trim(), value.trim());
        Ok(())
    }

    /// Merge settings from a file of `key=value` lines.
    ///
    /// Blank lines and lines starting with `#` are skipped. Values from the
    /// file override earlier values for the same key.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content =
            std::fs::read_to_string(path).map_err(|e| BdpError::io(path, e))?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.set_pair(line).map_err(|_| {
                BdpError::invalid_setup(format!(
                    "Setting \"{}\" in file \"{}\" is not a \"key=value\" pair",
                    line,
                    path.display()
                ))
            })?;
        }
        Ok(())
    }

    /// Number of settings currently held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove and return a required setting.
    ///
    /// A missing key is a setup error naming that key.
    pub fn take(&mut self, key: &str) -> Result<String> {
        self.values.remove(key).ok_or_else(|| {
            BdpError::invalid_setup(format!("setting missing: {key}"))
        })
    }

    /// Remove and return an optional setting, falling back to a default.
    pub fn take_or(&mut self, key: &str, default: &str) -> String {
        self.values.remove(key).unwrap_or_else(|| default.to_string())
    }

    /// Fail if any settings remain after all schema keys were taken.
    ///
    /// The leftover keys are listed comma-joined as unknown settings for
    /// `subject` (a framework display name).
    pub fn expect_empty(&self, subject: &str) -> Result<()> {
        if self.values.is_empty() {
            return Ok(());
        }
        let mut leftover: Vec<&str> = self.values.keys().map(String::as_str).collect();
        leftover.sort_unstable();
        Err(BdpError::invalid_setup(format!(
            "Found unknown settings for {subject}: '{}'",
            leftover.join("','")
        )))
    }

    /// Validate this mapping against a schema, consuming it.
    ///
    /// Returns the values of the schema keys in schema order. Fails with
    /// `InvalidSetup` on the first missing key, or on any leftover keys.
    pub fn validate(mut self, schema: SettingsSchema, subject: &str) -> Result<Vec<String>> {
        let mut values = Vec::with_capacity(schema.len());
        for (key, _description) in schema {
            values.push(self.take(key)?);
        }
        self.expect_empty(subject)?;
        Ok(values)
    }
}
