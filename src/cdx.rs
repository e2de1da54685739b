use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

const CDX_BASE: &str = "http://web.archive.org/cdx/search/cdx";
const QUERY_TIMEOUT_SECS: u64 = 20;

/// One archived capture listed by the CDX index.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub timestamp: String,
    pub original_url: String,
    pub archive_url: String,
}

/// Query the CDX index for a domain's snapshots, bounded by optional CDX
/// timestamps and an optional count cap.
pub async fn fetch_snapshots(
    domain_path: &str,
    from_ts: Option<&str>,
    to_ts: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<Snapshot>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(QUERY_TIMEOUT_SECS))
        .build()?;

    let url = build_query(domain_path, from_ts, to_ts);
    info!("Querying CDX index: {}", url);

    let rows: Vec<Vec<String>> = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .context("CDX response was not valid JSON")?;

    // First row is the field-name header.
    let mut snapshots: Vec<Snapshot> = rows
        .into_iter()
        .skip(1)
        .filter_map(|row| {
            let mut fields = row.into_iter();
            let timestamp = fields.next()?;
            let original_url = fields.next()?;
            Some(Snapshot {
                archive_url: archive_url(&timestamp, &original_url),
                timestamp,
                original_url,
            })
        })
        .collect();

    if let Some(n) = limit {
        snapshots.truncate(n);
    }
    info!("CDX returned {} snapshots", snapshots.len());
    Ok(snapshots)
}

/// Archive replay URL for a capture.
pub fn archive_url(timestamp: &str, original_url: &str) -> String {
    format!("https://web.archive.org/web/{timestamp}/{original_url}")
}

/// Normalize user input like `https://www.example.com/path/` into the bare
/// `domain/path` form the CDX `url=` parameter expects.
pub fn normalize_domain(raw: &str) -> String {
    let s = raw.trim();
    let s = s
        .strip_prefix("http://")
        .or_else(|| s.strip_prefix("https://"))
        .unwrap_or(s);
    s.trim_end_matches('/').to_string()
}

fn build_query(domain_path: &str, from_ts: Option<&str>, to_ts: Option<&str>) -> String {
    let mut query = format!(
        "{CDX_BASE}?url={domain_path}/*&output=json&fl=timestamp,original&filter=statuscode:200"
    );
    if let Some(from) = from_ts {
        query.push_str("&from=");
        query.push_str(from);
    }
    if let Some(to) = to_ts {
        query.push_str("&to=");
        query.push_str(to);
    }
    query
}

/// `DD/MM/YYYY` → CDX lower bound (midnight).
pub fn day_start(date: &str) -> Result<String> {
    let d = parse_day(date)?;
    Ok(format!("{}000000", d.format("%Y%m%d")))
}

/// `DD/MM/YYYY` → CDX upper bound (end of day).
pub fn day_end(date: &str) -> Result<String> {
    let d = parse_day(date)?;
    Ok(format!("{}235959", d.format("%Y%m%d")))
}

fn parse_day(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%d/%m/%Y")
        .with_context(|| format!("invalid date {date:?}, expected DD/MM/YYYY"))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_domain_input() {
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("https://example.com/"), "example.com");
        assert_eq!(normalize_domain("http://www.example.com/path/"), "www.example.com/path");
        assert_eq!(normalize_domain("  example.com  "), "example.com");
    }

    #[test]
    fn builds_base_query() {
        let q = build_query("example.com", None, None);
        assert!(q.starts_with("http://web.archive.org/cdx/search/cdx?url=example.com/*"));
        assert!(q.contains("output=json"));
        assert!(q.contains("fl=timestamp,original"));
        assert!(q.contains("filter=statuscode:200"));
        assert!(!q.contains("&from="));
        assert!(!q.contains("&to="));
    }

    #[test]
    fn builds_bounded_query() {
        let q = build_query("example.com", Some("19990101000000"), Some("20151231235959"));
        assert!(q.contains("&from=19990101000000"));
        assert!(q.contains("&to=20151231235959"));
    }

    #[test]
    fn day_bounds() {
        assert_eq!(day_start("01/01/1999").unwrap(), "19990101000000");
        assert_eq!(day_end("31/12/2015").unwrap(), "20151231235959");
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(day_start("1999-01-01").is_err());
        assert!(day_start("32/01/1999").is_err());
    }

    #[test]
    fn builds_archive_url() {
        assert_eq!(
            archive_url("20130512101500", "http://example.com/a"),
            "https://web.archive.org/web/20130512101500/http://example.com/a"
        );
    }
}
