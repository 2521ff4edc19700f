use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use taskman_core::models::ExportData;
use taskman_core::service::TaskmanService;

pub(crate) fn cmd_export(svc: &TaskmanService, output: Option<&PathBuf>) -> Result<()> {
    let data = svc.export()?;
    let body = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            eprintln!(
                "Exported {} tasks and {} weights to {}",
                data.tasks.len(),
                data.weights.len(),
                path.display()
            );
        }
        None => println!("{body}"),
    }

    Ok(())
}

pub(crate) fn cmd_import(svc: &mut TaskmanService, file: &Path, json: bool) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;
    let data: ExportData = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid export file: {}", file.display()))?;

    let summary = svc.import(&data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Imported {} tasks and {} weights",
            summary.tasks_imported, summary.weights_imported
        );
    }

    Ok(())
}
