use std::path::Path;

use anyhow::{Context, Result};

use heft_core::models::ExportData;

use super::Tracker;

/// Write a JSON snapshot of everything to `output`, or to stdout when absent.
pub(crate) fn cmd_export(svc: &Tracker, output: Option<&Path>, json: bool) -> Result<()> {
    let data = svc.export_all()?;
    let body = serde_json::to_string_pretty(&data)?;

    let Some(path) = output else {
        println!("{body}");
        return Ok(());
    };

    std::fs::write(path, body)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "path": path.display().to_string(),
                "weight_entries": data.weight_entries.len(),
                "meal_entries": data.meal_entries.len(),
                "goal": data.goal.is_some(),
            })
        );
    } else {
        println!(
            "Exported {} weight entries and {} meals to {}",
            data.weight_entries.len(),
            data.meal_entries.len(),
            path.display()
        );
    }

    Ok(())
}

pub(crate) fn cmd_import(svc: &Tracker, path: &Path, json: bool) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let data: ExportData = serde_json::from_str(&content)
        .with_context(|| format!("Invalid export file: {}", path.display()))?;

    let summary = svc.import_all(&data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Import complete.\n");
        println!("  Weight entries: {}", summary.weight_entries_imported);
        println!("  Meals:          {}", summary.meal_entries_imported);
        println!(
            "  Goal:           {}",
            if summary.goal_imported { "replaced" } else { "unchanged" }
        );
    }

    Ok(())
}
