use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use tracing::debug;

use crate::models::{NewWeightEntry, WeightEntry, WeightSource, validate_weight};
use crate::store::TrackerStore;

/// A single row parsed from a weight CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightCsvRow {
    pub date: DateTime<Utc>,
    pub weight_lbs: f64,
    pub notes: Option<String>,
    /// From the optional `Source` column; rows without one import as `Import`.
    pub source: Option<WeightSource>,
}

/// Summary of what a weight CSV import would do / did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeightImportSummary {
    pub rows_parsed: usize,
    pub imported: usize,
    pub skipped_duplicates: usize,
}

const WEIGHT_HEADERS: [&str; 2] = ["Weight", "Weight (lbs)"];

/// Parse a weight history CSV from any reader.
///
/// Expected header: `Date,Weight,Notes,Source`. `Weight (lbs)` is accepted for
/// the weight column; `Notes` and `Source` are optional. Blank rows are skipped;
/// a weight outside the accepted range fails the whole parse.
pub fn parse_weight_csv<R: Read>(reader: R) -> Result<Vec<WeightCsvRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    let col =
        |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };

    let idx_date = col("Date").context("Missing required column: Date")?;
    let idx_weight = WEIGHT_HEADERS
        .iter()
        .find_map(|name| col(name))
        .context("Missing required column: Weight")?;
    let idx_notes = col("Notes");
    let idx_source = col("Source");

    let mut rows = Vec::new();

    for (line_num, result) in rdr.records().enumerate() {
        let line = line_num + 2;
        let record = result.with_context(|| format!("Failed to parse CSV row {line}"))?;

        let date = record.get(idx_date).unwrap_or("");
        let weight = record.get(idx_weight).unwrap_or("");
        if date.is_empty() && weight.is_empty() {
            continue;
        }

        let date = parse_csv_date(date).with_context(|| format!("Row {line}"))?;
        let weight_lbs: f64 = weight
            .parse()
            .with_context(|| format!("Row {line}: invalid weight '{weight}'"))?;
        validate_weight(weight_lbs).with_context(|| format!("Row {line}"))?;

        let notes = idx_notes
            .and_then(|i| record.get(i))
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let source = idx_source
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(WeightSource::parse)
            .transpose()
            .with_context(|| format!("Row {line}"))?;

        rows.push(WeightCsvRow {
            date,
            weight_lbs,
            notes,
            source,
        });
    }

    Ok(rows)
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DD`, or `M/D/YYYY`. Bare dates map
/// to midnight UTC.
pub fn parse_csv_date(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"));
    match day {
        Ok(d) => Ok(d.and_time(chrono::NaiveTime::MIN).and_utc()),
        Err(_) => bail!("Cannot parse date: '{s}'"),
    }
}

fn is_duplicate(a_date: DateTime<Utc>, a_lbs: f64, b_date: DateTime<Utc>, b_lbs: f64) -> bool {
    a_date == b_date && (a_lbs - b_lbs).abs() < 1e-9
}

/// Import parsed rows as weight entries, keeping each row's source if it has one.
///
/// Rows matching an existing entry (same timestamp and weight) are skipped, as
/// are repeats within the file. When `dry_run` is true, nothing is written.
pub fn import_weight_rows<S: TrackerStore + ?Sized>(
    store: &S,
    rows: &[WeightCsvRow],
    dry_run: bool,
) -> Result<WeightImportSummary> {
    let mut seen: Vec<(DateTime<Utc>, f64)> = store
        .weight_history()?
        .iter()
        .map(|e| (e.date, e.weight_lbs))
        .collect();

    let mut summary = WeightImportSummary {
        rows_parsed: rows.len(),
        ..WeightImportSummary::default()
    };

    for row in rows {
        if seen
            .iter()
            .any(|&(date, lbs)| is_duplicate(date, lbs, row.date, row.weight_lbs))
        {
            debug!(date = %row.date, weight = row.weight_lbs, "skipping duplicate weight row");
            summary.skipped_duplicates += 1;
            continue;
        }
        seen.push((row.date, row.weight_lbs));

        if !dry_run {
            store.insert_weight(&NewWeightEntry {
                weight_lbs: row.weight_lbs,
                date: row.date,
                source: row.source.unwrap_or(WeightSource::Import),
                notes: row.notes.clone(),
            })?;
        }
        summary.imported += 1;
    }

    Ok(summary)
}

/// Write weight entries as `Date,Weight (lbs),Notes,Source`.
///
/// Timestamps keep their sub-second digits and weights their full precision,
/// so re-importing the file matches the entries it came from.
pub fn write_weight_csv<W: Write>(writer: W, entries: &[WeightEntry]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Date", "Weight (lbs)", "Notes", "Source"])?;
    for entry in entries {
        wtr.write_record([
            entry.date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            entry.weight_lbs.to_string(),
            entry.notes.clone().unwrap_or_default(),
            entry.source.as_str().to_string(),
        ])?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    const SAMPLE_CSV: &str = "\
Date,Weight,Notes
2024-01-10,165.2,Start
2024-01-12,164.0,
1/14/2024,163.4,After holiday
2024-01-15T07:30:00Z,163.0,
";

    #[test]
    fn test_parse_weight_csv_basic() {
        let rows = parse_weight_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].date, Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
        assert!((rows[0].weight_lbs - 165.2).abs() < f64::EPSILON);
        assert_eq!(rows[0].notes.as_deref(), Some("Start"));
        assert!(rows[1].notes.is_none());
        assert_eq!(rows[2].date, Utc.with_ymd_and_hms(2024, 1, 14, 0, 0, 0).unwrap());
        assert_eq!(rows[3].date, Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_weight_csv_missing_required_column() {
        let result = parse_weight_csv("Date,Notes\n2024-01-15,hi\n".as_bytes());
        assert!(result.unwrap_err().to_string().contains("Weight"));
    }

    #[test]
    fn test_parse_weight_csv_lbs_header_without_notes() {
        let rows = parse_weight_csv("date,weight (lbs)\n2024-01-15,150\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].notes.is_none());
    }

    #[test]
    fn test_parse_weight_csv_skips_blank_rows() {
        let csv = "Date,Weight\n2024-01-15,150\n,\n2024-01-16,149.5\n";
        assert_eq!(parse_weight_csv(csv.as_bytes()).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_weight_csv_rejects_out_of_range() {
        let err = parse_weight_csv("Date,Weight\n2024-01-15,1200\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("Row 2"));
        assert!(parse_weight_csv("Date,Weight\n2024-01-15,abc\n".as_bytes()).is_err());
    }

    #[test]
    fn test_parse_csv_date_invalid() {
        assert!(parse_csv_date("not-a-date").is_err());
        assert!(parse_csv_date("2024-13-40").is_err());
    }

    #[test]
    fn test_import_dry_run_writes_nothing() {
        let store = MemoryStore::new();
        let rows = parse_weight_csv(SAMPLE_CSV.as_bytes()).unwrap();

        let summary = import_weight_rows(&store, &rows, true).unwrap();
        assert_eq!(summary.rows_parsed, 4);
        assert_eq!(summary.imported, 4);
        assert!(store.weight_history().unwrap().is_empty());
    }

    #[test]
    fn test_import_marks_source_and_dedupes() {
        let store = MemoryStore::new();
        let rows = parse_weight_csv(SAMPLE_CSV.as_bytes()).unwrap();

        let first = import_weight_rows(&store, &rows, false).unwrap();
        assert_eq!(first.imported, 4);
        let history = store.weight_history().unwrap();
        assert!(history.iter().all(|e| e.source == WeightSource::Import));

        let second = import_weight_rows(&store, &rows, false).unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped_duplicates, 4);
        assert_eq!(store.weight_history().unwrap().len(), 4);
    }

    #[test]
    fn test_import_dedupes_within_file() {
        let store = MemoryStore::new();
        let csv = "Date,Weight\n2024-01-15,150\n2024-01-15,150\n2024-01-15,150.5\n";
        let rows = parse_weight_csv(csv.as_bytes()).unwrap();
        let summary = import_weight_rows(&store, &rows, false).unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped_duplicates, 1);
    }

    #[test]
    fn test_source_column_is_honored() {
        let store = MemoryStore::new();
        let csv = "Date,Weight,Source\n2024-01-15,150,manual\n2024-01-16,149.5,\n";
        let rows = parse_weight_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].source, Some(WeightSource::Manual));
        assert!(rows[1].source.is_none());

        import_weight_rows(&store, &rows, false).unwrap();
        let history = store.weight_history().unwrap();
        assert_eq!(history[0].source, WeightSource::Manual);
        assert_eq!(history[1].source, WeightSource::Import);

        let bad = "Date,Weight,Source\n2024-01-15,150,scale\n";
        let err = parse_weight_csv(bad.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("Row 2"));
    }

    #[test]
    fn test_write_keeps_millis_and_full_weight() {
        let date = Utc.with_ymd_and_hms(2024, 1, 14, 7, 15, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        let entries = vec![WeightEntry {
            id: 1,
            weight_lbs: 150.25,
            date,
            source: WeightSource::Import,
            notes: None,
        }];
        let mut out = Vec::new();
        write_weight_csv(&mut out, &entries).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("2024-01-14T07:15:00.250Z,150.25,,import"));

        let rows = parse_weight_csv(text.as_bytes()).unwrap();
        assert_eq!(rows[0].date, date);
        assert!((rows[0].weight_lbs - 150.25).abs() < f64::EPSILON);
        assert_eq!(rows[0].source, Some(WeightSource::Import));
    }

    #[test]
    fn test_write_then_read_back() {
        let entries = vec![WeightEntry {
            id: 1,
            weight_lbs: 162.4,
            date: Utc.with_ymd_and_hms(2024, 1, 14, 7, 15, 0).unwrap(),
            source: WeightSource::Manual,
            notes: Some("after run, hydrated".to_string()),
        }];
        let mut out = Vec::new();
        write_weight_csv(&mut out, &entries).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Date,Weight (lbs),Notes,Source\n"));
        assert!(text.contains("\"after run, hydrated\""));

        let rows = parse_weight_csv(text.as_bytes()).unwrap();
        assert_eq!(rows[0].date, entries[0].date);
        assert_eq!(rows[0].notes, entries[0].notes);
    }
}
