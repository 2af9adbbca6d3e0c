//! `bdp frameworks` command - list the built-in framework catalogue.

use anyhow::{Context, Result};
use bdp_core::FrameworkRegistry;
use colored::Colorize;
use tabled::{Table, Tabled};

/// List supported frameworks, optionally with every registered version.
pub fn frameworks(versions: bool) -> Result<()> {
    let registry = FrameworkRegistry::builtin().context("Failed to build framework registry")?;
    let frameworks = registry.frameworks();

    if versions {
        #[derive(Tabled)]
        struct VersionRow {
            #[tabled(rename = "FRAMEWORK")]
            framework: String,
            #[tabled(rename = "VERSION")]
            version: String,
            #[tabled(rename = "FORMAT")]
            format: String,
            #[tabled(rename = "TEMPLATES")]
            templates: String,
        }

        let rows: Vec<VersionRow> = frameworks
            .iter()
            .flat_map(|fw| {
                fw.versions().iter().map(|v| VersionRow {
                    framework: fw.key().to_string(),
                    version: v.version().to_string(),
                    format: v.format().to_string(),
                    templates: v.template_set().to_string(),
                })
            })
            .collect();
        println!("{}", Table::new(rows));
    } else {
        #[derive(Tabled)]
        struct FrameworkRow {
            #[tabled(rename = "FRAMEWORK")]
            key: String,
            #[tabled(rename = "NAME")]
            name: String,
            #[tabled(rename = "VERSIONS")]
            versions: usize,
        }

        let rows: Vec<FrameworkRow> = frameworks
            .iter()
            .map(|fw| FrameworkRow {
                key: fw.key().to_string(),
                name: fw.name().to_string(),
                versions: fw.versions().len(),
            })
            .collect();
        println!("{}", Table::new(rows));
        println!();
        println!("List versions with: {}", "bdp frameworks --versions".cyan());
    }
    Ok(())
}
