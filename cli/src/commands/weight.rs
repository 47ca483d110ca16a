use std::path::Path;

use anyhow::{Context, Result};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use super::Tracker;
use super::helpers::{exit_not_found, format_time, parse_date, truncate};

pub(crate) fn cmd_weight_log(
    svc: &Tracker,
    value: f64,
    date: Option<&str>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, svc.now())?;
    let entry = svc.log_weight(value, date, notes)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!(
            "Logged {:.1} lbs at {} (entry {})",
            entry.weight_lbs,
            format_time(&entry.date),
            entry.id
        );
        if let Some(ref n) = entry.notes {
            println!("  Notes: {n}");
        }
    }

    Ok(())
}

pub(crate) fn cmd_weight_history(svc: &Tracker, limit: Option<usize>, json: bool) -> Result<()> {
    let entries = svc.weight_history(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No weight entries found. Use `heft weight log` to record your weight.");
    } else {
        #[derive(Tabled)]
        struct WeightRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Weight (lbs)")]
            lbs: String,
            #[tabled(rename = "Source")]
            source: &'static str,
            #[tabled(rename = "Notes")]
            notes: String,
        }

        let rows: Vec<WeightRow> = entries
            .iter()
            .map(|e| WeightRow {
                id: e.id,
                date: format_time(&e.date),
                lbs: format!("{:.1}", e.weight_lbs),
                source: e.source.as_str(),
                notes: e.notes.as_deref().map(|n| truncate(n, 40)).unwrap_or_default(),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::single(2)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) fn cmd_weight_show(svc: &Tracker, id: i64, json: bool) -> Result<()> {
    let Some(entry) = svc.weight_entry(id)? else {
        exit_not_found(&format!("Weight entry {id} not found"), json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("Weight entry {}", entry.id);
        println!("  Date:   {}", format_time(&entry.date));
        println!("  Weight: {:.1} lbs", entry.weight_lbs);
        println!("  Source: {}", entry.source.as_str());
        if let Some(ref n) = entry.notes {
            println!("  Notes:  {n}");
        }
    }

    Ok(())
}

pub(crate) fn cmd_weight_delete(svc: &Tracker, id: i64, json: bool) -> Result<()> {
    if !svc.delete_weight(id)? {
        exit_not_found(&format!("Weight entry {id} not found"), json);
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted weight entry {id}");
    }

    Ok(())
}

pub(crate) fn cmd_weight_import(svc: &Tracker, path: &Path, dry_run: bool, json: bool) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let summary = svc.import_weights_csv(file, dry_run)?;

    if summary.rows_parsed == 0 {
        if json {
            println!(
                "{}",
                serde_json::json!({ "error": "No rows found in CSV file" })
            );
        } else {
            eprintln!("No rows found in CSV file.");
        }
        return Ok(());
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "dry_run": dry_run,
                "rows_parsed": summary.rows_parsed,
                "imported": summary.imported,
                "skipped_duplicates": summary.skipped_duplicates,
            })
        );
    } else {
        if dry_run {
            println!("Dry run, no changes made.\n");
        } else {
            println!("Import complete.\n");
        }
        println!("  Rows parsed:        {}", summary.rows_parsed);
        println!("  Entries imported:   {}", summary.imported);
        println!("  Duplicates skipped: {}", summary.skipped_duplicates);
    }

    Ok(())
}

/// Write weight history as CSV to `output`, or to stdout when absent.
/// With `--json` and no output file, the history is printed as JSON instead.
pub(crate) fn cmd_weight_export(svc: &Tracker, output: Option<&Path>, json: bool) -> Result<()> {
    let Some(path) = output else {
        if json {
            println!("{}", serde_json::to_string_pretty(&svc.weight_history(None)?)?);
        } else {
            svc.export_weights_csv(std::io::stdout().lock())?;
        }
        return Ok(());
    };

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let rows = svc.export_weights_csv(file)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "exported": rows, "path": path.display().to_string() })
        );
    } else {
        println!("Exported {rows} weight entries to {}", path.display());
    }

    Ok(())
}
