use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::clean::PageRecord;

/// A page record as written to CSV/JSON. Timestamps are rendered readable;
/// `raw_text` is empty unless the caller asked for the audit column.
#[derive(Serialize)]
struct ExportRow<'a> {
    timestamp: String,
    original_url: &'a str,
    archive_url: &'a str,
    title: &'a str,
    raw_text: &'a str,
    clean_text: &'a str,
}

/// Write the unified `_all` CSV/JSON pair and, when `chunk_size` is given,
/// numbered chunk files of that many records each. Returns the paths written.
pub fn export_records(
    records: &[PageRecord],
    prefix: &str,
    chunk_size: Option<usize>,
    include_raw: bool,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if let Some(size) = chunk_size.filter(|s| *s > 0) {
        for (i, chunk) in records.chunks(size).enumerate() {
            let base = format!("{}_chunk_{}", prefix, i + 1);
            written.extend(write_pair(chunk, &base, include_raw)?);
        }
    }

    written.extend(write_pair(records, &format!("{prefix}_all"), include_raw)?);
    info!("Exported {} records to {} files", records.len(), written.len());
    Ok(written)
}

fn write_pair(records: &[PageRecord], base: &str, include_raw: bool) -> Result<Vec<PathBuf>> {
    let rows: Vec<ExportRow> = records.iter().map(|r| to_row(r, include_raw)).collect();

    let csv_path = PathBuf::from(format!("{base}.csv"));
    write_csv(&csv_path, &rows)?;
    let json_path = PathBuf::from(format!("{base}.json"));
    write_json(&json_path, &rows)?;
    Ok(vec![csv_path, json_path])
}

fn to_row(record: &PageRecord, include_raw: bool) -> ExportRow<'_> {
    ExportRow {
        timestamp: ts_to_readable(&record.timestamp),
        original_url: &record.original_url,
        archive_url: &record.archive_url,
        title: &record.title,
        raw_text: if include_raw { &record.raw_text } else { "" },
        clean_text: &record.clean_text,
    }
}

fn write_csv(path: &Path, rows: &[ExportRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_json(path: &Path, rows: &[ExportRow]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), rows)?;
    Ok(())
}

/// Render a 14-digit capture timestamp as `DD/MM/YYYY`; malformed input is
/// passed through untouched.
pub fn ts_to_readable(ts: &str) -> String {
    let head = ts.get(..14).unwrap_or(ts);
    NaiveDateTime::parse_from_str(head, "%Y%m%d%H%M%S")
        .map(|dt| dt.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: &str) -> PageRecord {
        PageRecord {
            timestamp: ts.to_string(),
            original_url: format!("http://example.com/{ts}"),
            archive_url: format!("https://web.archive.org/web/{ts}/http://example.com/{ts}"),
            title: "A page".into(),
            raw_text: "raw line\nraw footer".into(),
            clean_text: "raw line".into(),
        }
    }

    #[test]
    fn readable_timestamps() {
        assert_eq!(ts_to_readable("20130512101500"), "12/05/2013");
        assert_eq!(ts_to_readable("19991231235959"), "31/12/1999");
    }

    #[test]
    fn malformed_timestamps_pass_through() {
        assert_eq!(ts_to_readable("not-a-ts"), "not-a-ts");
        assert_eq!(ts_to_readable("2013"), "2013");
        assert_eq!(ts_to_readable(""), "");
    }

    #[test]
    fn raw_column_is_opt_in() {
        let r = record("20130512101500");
        assert_eq!(to_row(&r, false).raw_text, "");
        assert_eq!(to_row(&r, true).raw_text, "raw line\nraw footer");
    }

    #[test]
    fn writes_unified_and_chunked_files() {
        let dir = std::env::temp_dir().join(format!("wayback_export_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let prefix = dir.join("export").to_string_lossy().to_string();

        let records: Vec<PageRecord> = (0..5)
            .map(|i| record(&format!("2013051210150{i}")))
            .collect();
        let written = export_records(&records, &prefix, Some(2), false).unwrap();
        // 3 chunks of <=2 records plus the unified pair, CSV+JSON each.
        assert_eq!(written.len(), 8);

        let all_csv = std::fs::read_to_string(format!("{prefix}_all.csv")).unwrap();
        assert!(all_csv.starts_with("timestamp,original_url,archive_url,title,raw_text,clean_text"));
        assert_eq!(all_csv.matches("12/05/2013").count(), 5);

        let all_json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(format!("{prefix}_all.json")).unwrap())
                .unwrap();
        assert_eq!(all_json.as_array().unwrap().len(), 5);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
