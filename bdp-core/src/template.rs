//! Configuration template rendering.
//!
//! Templates are plain text files carrying literal placeholder tokens such
//! as `__MASTER__`. Rendering replaces every token in a single pass per
//! line: all tokens are escaped and compiled into one combined regex
//! alternation, so a replacement value that happens to contain another
//! token's literal text is never substituted again.

use crate::error::{BdpError, Result};
use crate::progress::Progress;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Suffix identifying template files inside a template set.
pub const TEMPLATE_SUFFIX: &str = ".template";

/// An insertion-ordered table of placeholder token to replacement value.
///
/// Built fresh per deployment from the invoking user, the topology and the
/// validated settings.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    entries: Vec<(String, String)>,
    pattern: OnceCell<Regex>,
}

impl Substitutions {
    /// Create an empty substitution table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a token to its replacement value.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        self.entries.push((token.into(), value.into()));
        let _ = self.pattern.take();
    }

    /// Look up the value bound to a token.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.iter().find(|(t, _)| t == token).map(|(_, v)| v.as_str())
    }

    /// The combined alternation of all escaped tokens, compiled once.
    fn pattern(&self) -> &Regex {
        self.pattern.get_or_init(|| {
            let alternation = self
                .entries
                .iter()
                .map(|(token, _)| regex::escape(token))
                .collect::<Vec<_>>()
                .join("|");
            // Escaped literals always form a valid pattern.
            Regex::new(&alternation).expect("escaped tokens form a valid pattern")
        })
    }

    /// Replace every bound token occurring in `line`, in one pass.
    pub fn apply(&self, line: &str) -> String {
        if self.entries.is_empty() {
            return line.to_string();
        }
        self.pattern()
            .replace_all(line, |captures: &regex::Captures<'_>| {
                self.get(&captures[0]).unwrap_or_default().to_string()
            })
            .into_owned()
    }
}

/// Render every `*.template` file from `template_dir` into `config_dir`.
///
/// The template suffix is stripped to obtain the output file name. Each
/// line is substituted once, right-trimmed and newline-terminated. Output
/// files are created or overwritten. Enumeration follows filesystem order.
pub fn render_templates(
    template_dir: &Path,
    config_dir: &Path,
    substitutions: &Substitutions,
    progress: &Progress,
) -> Result<()> {
    debug!(template_dir = %template_dir.display(), config_dir = %config_dir.display(), "Rendering templates");
    let entries =
        std::fs::read_dir(template_dir).map_err(|e| BdpError::io(template_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BdpError::io(template_dir, e))?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        let Some(output_name) = file_name.strip_suffix(TEMPLATE_SUFFIX) else {
            continue;
        };
        progress.log(2, &format!("Generating file \"{output_name}\"..."));
        let template_path = entry.path();
        let content = std::fs::read_to_string(&template_path)
            .map_err(|e| BdpError::io(&template_path, e))?;
        let mut output = String::with_capacity(content.len());
        for line in content.lines() {
            output.push_str(substitutions.apply(line.trim_end()).trim_end());
            output.push('\n');
        }
        let output_path = config_dir.join(output_name);
        std::fs::write(&output_path, output).map_err(|e| BdpError::io(&output_path, e))?;
    }
    Ok(())
}

/// Render a whole template tree from `template_dir` into `dest_dir`,
/// preserving relative paths.
///
/// Unlike [`render_templates`], this walks subdirectories, creates missing
/// parent directories under the destination, and copies each template's
/// permission bits onto its rendered file (templates may be executable
/// launch scripts).
pub fn render_template_tree(
    template_dir: &Path,
    dest_dir: &Path,
    substitutions: &Substitutions,
    progress: &Progress,
) -> Result<()> {
    render_tree_inner(template_dir, Path::new(""), dest_dir, substitutions, progress)
}

fn render_tree_inner(
    template_dir: &Path,
    rel_dir: &Path,
    dest_dir: &Path,
    substitutions: &Substitutions,
    progress: &Progress,
) -> Result<()> {
    let current = template_dir.join(rel_dir);
    let entries = std::fs::read_dir(&current).map_err(|e| BdpError::io(&current, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BdpError::io(&current, e))?;
        let file_type = entry.file_type().map_err(|e| BdpError::io(entry.path(), e))?;
        if file_type.is_dir() {
            render_tree_inner(
                template_dir,
                &rel_dir.join(entry.file_name()),
                dest_dir,
                substitutions,
                progress,
            )?;
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        let Some(output_name) = file_name.strip_suffix(TEMPLATE_SUFFIX) else {
            continue;
        };
        let rel_output = rel_dir.join(output_name);
        progress.log(2, &format!("Generating file \"{}\"...", rel_output.display()));

        let template_path = entry.path();
        let content = std::fs::read_to_string(&template_path)
            .map_err(|e| BdpError::io(&template_path, e))?;
        let mut output = String::with_capacity(content.len());
        for line in content.lines() {
            output.push_str(substitutions.apply(line.trim_end()).trim_end());
            output.push('\n');
        }

        let output_path = dest_dir.join(&rel_output);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BdpError::io(parent, e))?;
        }
        std::fs::write(&output_path, output).map_err(|e| BdpError::io(&output_path, e))?;

        let metadata =
            std::fs::metadata(&template_path).map_err(|e| BdpError::io(&template_path, e))?;
        std::fs::set_permissions(&output_path, metadata.permissions())
            .map_err(|e| BdpError::io(&output_path, e))?;
    }
    Ok(())
}

/// Write the derived topology files into `config_dir`: `master` holding the
/// master host alone, and `slaves` holding each worker on its own line in
/// topology order.
pub fn write_topology_files(
    config_dir: &Path,
    master: &str,
    workers: &[String],
    progress: &Progress,
) -> Result<()> {
    progress.log(2, "Generating file \"master\"...");
    let master_path = config_dir.join("master");
    std::fs::write(&master_path, format!("{master}\n"))
        .map_err(|e| BdpError::io(&master_path, e))?;

    progress.log(2, "Generating file \"slaves\"...");
    let mut slaves = String::new();
    for worker in workers {
        slaves.push_str(worker);
        slaves.push('\n');
    }
    let slaves_path = config_dir.join("slaves");
    std::fs::write(&slaves_path, slaves).map_err(|e| BdpError::io(&slaves_path, e))?;
    Ok(())
}
