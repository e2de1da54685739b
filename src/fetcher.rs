use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::db::{FetchRow, PendingSnapshot};

const CONCURRENCY: usize = 10;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Fetch stats returned after completion.
pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
    /// Ctrl-C arrived mid-run; everything received so far is already saved.
    pub interrupted: bool,
}

struct Clients {
    strict: reqwest::Client,
    /// Certificate verification disabled; only ever used after the strict
    /// client fails with a TLS error (old snapshots route through hosts with
    /// broken chains).
    insecure: reqwest::Client,
}

/// Fetch snapshots concurrently, saving each result to DB as it arrives.
/// An interrupt stops receiving but loses nothing already saved.
pub async fn fetch_pages_streaming(
    conn: &Connection,
    pending: Vec<PendingSnapshot>,
) -> Result<FetchStats> {
    let clients = Arc::new(Clients {
        strict: reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?,
        insecure: reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .danger_accept_invalid_certs(true)
            .build()?,
    });
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = pending.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop saves to DB
    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchRow>(CONCURRENCY * 2);

    for snap in pending {
        let clients = Arc::clone(&clients);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let row = fetch_with_retry(&clients, &snap).await;
            let _ = tx.send(row).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;
    let mut interrupted = false;

    // Prepare statements once, reuse for each row
    let mut insert_stmt = conn.prepare(
        "INSERT INTO snapshot_html (snapshot_id, html, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut update_stmt =
        conn.prepare("UPDATE snapshots SET fetched = 1, fetched_at = datetime('now') WHERE id = ?1")?;

    loop {
        tokio::select! {
            maybe_row = rx.recv() => {
                let Some(row) = maybe_row else { break };
                if row.error.is_some() {
                    errors += 1;
                } else {
                    ok += 1;
                }
                save_one(&mut insert_stmt, &mut update_stmt, &row)?;
                pb.inc(1);
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted; {} fetched pages are saved and will be processed", ok);
                interrupted = true;
                break;
            }
        }
    }

    pb.finish_and_clear();
    info!("Fetched {} pages ({} ok, {} errors)", ok + errors, ok, errors);

    Ok(FetchStats { total, ok, errors, interrupted })
}

/// Save a single fetch result to DB using pre-prepared statements.
fn save_one(
    insert: &mut rusqlite::Statement,
    update: &mut rusqlite::Statement,
    row: &FetchRow,
) -> Result<()> {
    insert.execute(rusqlite::params![
        row.snapshot_id, row.html, row.status, row.error, row.latency_ms,
    ])?;
    update.execute(rusqlite::params![row.snapshot_id])?;
    Ok(())
}

async fn fetch_with_retry(clients: &Clients, snap: &PendingSnapshot) -> FetchRow {
    for attempt in 0..=MAX_RETRIES {
        let row = fetch_one(clients, snap).await;

        let should_retry = match &row.error {
            Some(e) if e.contains("429") || e.contains("rate") => true,
            Some(e) if e.contains("500") || e.contains("502") || e.contains("503") => true,
            _ => false,
        };

        if !should_retry || attempt == MAX_RETRIES {
            return row;
        }

        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "Throttled on {} (attempt {}/{}), backing off {:.1}s",
            snap.archive_url,
            attempt + 1,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
    }

    fetch_one(clients, snap).await
}

async fn fetch_one(clients: &Clients, snap: &PendingSnapshot) -> FetchRow {
    let start = Instant::now();

    let result = match get_text(&clients.strict, &snap.archive_url).await {
        Err(e) if is_tls_error(&e) => {
            warn!("TLS failure on {}, retrying without verification", snap.archive_url);
            get_text(&clients.insecure, &snap.archive_url).await
        }
        other => other,
    };
    let elapsed = start.elapsed().as_millis() as i64;

    match result {
        Ok((status, html)) => FetchRow {
            snapshot_id: snap.id,
            html: Some(html),
            status: Some(status),
            error: None,
            latency_ms: Some(elapsed),
        },
        Err(e) => FetchRow {
            snapshot_id: snap.id,
            html: None,
            status: None,
            error: Some(e),
            latency_ms: Some(elapsed),
        },
    }
}

async fn get_text(client: &reqwest::Client, url: &str) -> Result<(i32, String), String> {
    let resp = client.get(url).send().await.map_err(|e| e.to_string())?;
    let status = resp.status().as_u16() as i32;
    let resp = resp.error_for_status().map_err(|e| e.to_string())?;
    let html = resp.text().await.map_err(|e| e.to_string())?;
    Ok((status, html))
}

fn is_tls_error(message: &str) -> bool {
    let m = message.to_lowercase();
    m.contains("certificate") || m.contains("tls") || m.contains("ssl") || m.contains("handshake")
}

// ── Tests ──
