use anyhow::Result;
use rusqlite::Connection;

use crate::cdx::Snapshot;
use crate::clean::PageRecord;

const DB_PATH: &str = "data/wayback.sqlite";

pub fn connect() -> Result<Connection> {
    std::fs::create_dir_all("data")?;
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS snapshots (
            id           INTEGER PRIMARY KEY,
            timestamp    TEXT NOT NULL,
            original_url TEXT NOT NULL,
            archive_url  TEXT UNIQUE NOT NULL,
            fetched      BOOLEAN NOT NULL DEFAULT 0,
            fetched_at   TEXT,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_snapshots_fetched ON snapshots(fetched);

        CREATE TABLE IF NOT EXISTS snapshot_html (
            id          INTEGER PRIMARY KEY,
            snapshot_id INTEGER NOT NULL REFERENCES snapshots(id),
            html        TEXT,
            status      INTEGER,
            error       TEXT,
            latency_ms  INTEGER,
            fetched_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_snapshot_html_snapshot ON snapshot_html(snapshot_id);

        -- Processed page records (the engine's output schema)
        CREATE TABLE IF NOT EXISTS records (
            id           INTEGER PRIMARY KEY,
            archive_url  TEXT UNIQUE NOT NULL,
            timestamp    TEXT NOT NULL,
            original_url TEXT NOT NULL,
            title        TEXT NOT NULL DEFAULT '',
            raw_text     TEXT NOT NULL,
            clean_text   TEXT NOT NULL,
            processed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_records_timestamp ON records(timestamp);
        ",
    )?;
    Ok(())
}

// ── Snapshot queue ──

pub fn insert_snapshots(conn: &Connection, snapshots: &[Snapshot]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO snapshots (timestamp, original_url, archive_url)
             VALUES (?1, ?2, ?3)",
        )?;
        for s in snapshots {
            count += stmt.execute(rusqlite::params![s.timestamp, s.original_url, s.archive_url])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub struct PendingSnapshot {
    pub id: i64,
    pub timestamp: String,
    pub original_url: String,
    pub archive_url: String,
}

pub fn fetch_unvisited(conn: &Connection, limit: Option<usize>) -> Result<Vec<PendingSnapshot>> {
    let sql = format!(
        "SELECT id, timestamp, original_url, archive_url
         FROM snapshots WHERE fetched = 0 ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PendingSnapshot {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                original_url: row.get(2)?,
                archive_url: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// One fetch outcome, streamed into the DB as it arrives.
pub struct FetchRow {
    pub snapshot_id: i64,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

// ── Processing ──

pub struct FetchedPage {
    pub timestamp: String,
    pub original_url: String,
    pub archive_url: String,
    pub html: String,
}

/// Every snapshot with stored HTML, latest fetch per snapshot. `process`
/// always runs over this full set; the corpus is whatever has been fetched.
pub fn fetch_extractable(conn: &Connection) -> Result<Vec<FetchedPage>> {
    let mut stmt = conn.prepare(
        "SELECT s.timestamp, s.original_url, s.archive_url, sh.html
         FROM snapshot_html sh
         JOIN snapshots s ON s.id = sh.snapshot_id
         WHERE sh.html IS NOT NULL
           AND sh.id = (SELECT MAX(id) FROM snapshot_html
                        WHERE snapshot_id = sh.snapshot_id AND html IS NOT NULL)
         ORDER BY sh.snapshot_id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(FetchedPage {
                timestamp: row.get(0)?,
                original_url: row.get(1)?,
                archive_url: row.get(2)?,
                html: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn save_records(conn: &Connection, records: &[PageRecord]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO records
             (archive_url, timestamp, original_url, title, raw_text, clean_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for r in records {
            stmt.execute(rusqlite::params![
                r.archive_url, r.timestamp, r.original_url, r.title, r.raw_text, r.clean_text,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn fetch_records(conn: &Connection) -> Result<Vec<PageRecord>> {
    let mut stmt = conn.prepare(
        "SELECT timestamp, original_url, archive_url, title, raw_text, clean_text
         FROM records ORDER BY timestamp, id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PageRecord {
                timestamp: row.get(0)?,
                original_url: row.get(1)?,
                archive_url: row.get(2)?,
                title: row.get(3)?,
                raw_text: row.get(4)?,
                clean_text: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub fetched: usize,
    pub unfetched: usize,
    pub stored: usize,
    pub errors: usize,
    pub processed: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM snapshots", [], |r| r.get(0))?;
    let fetched: usize =
        conn.query_row("SELECT COUNT(*) FROM snapshots WHERE fetched = 1", [], |r| r.get(0))?;
    let stored: usize = conn.query_row(
        "SELECT COUNT(*) FROM snapshot_html WHERE html IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM snapshot_html WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let processed: usize = conn.query_row("SELECT COUNT(*) FROM records", [], |r| r.get(0))?;
    Ok(Stats {
        total,
        fetched,
        unfetched: total - fetched,
        stored,
        errors,
        processed,
    })
}

// ── Tests ──
