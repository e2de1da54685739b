mod cdx;
mod clean;
mod db;
mod export;
mod extract;
mod fetcher;

use std::time::Instant;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};

use clean::CleanConfig;

#[derive(Parser)]
#[command(name = "wayback_harvester", about = "Wayback Machine domain harvester and text cleaner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CleanArgs {
    /// Pages a line must appear on to count as boilerplate
    #[arg(long, default_value_t = CleanConfig::default().min_pages)]
    min_pages: usize,
    /// Corpus share at which a line counts as boilerplate
    #[arg(long, default_value_t = CleanConfig::default().ratio)]
    ratio: f64,
    /// Minimum pages before the ratio clause applies (1 disables the guard)
    #[arg(long, default_value_t = CleanConfig::default().ratio_min_hits)]
    ratio_min_hits: usize,
    /// Lines shorter than this are junk
    #[arg(long, default_value_t = CleanConfig::default().min_line_chars)]
    min_line_chars: usize,
    /// Lines with fewer words than this are junk
    #[arg(long, default_value_t = CleanConfig::default().min_words)]
    min_words: usize,
    /// Below this many cleaned characters, fall back to junk-only filtering
    #[arg(long, default_value_t = CleanConfig::default().clean_floor)]
    clean_floor: usize,
}

impl CleanArgs {
    fn to_config(&self) -> CleanConfig {
        CleanConfig {
            min_pages: self.min_pages,
            ratio: self.ratio,
            ratio_min_hits: self.ratio_min_hits,
            min_line_chars: self.min_line_chars,
            min_words: self.min_words,
            clean_floor: self.clean_floor,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Query the CDX index and populate the snapshot queue
    Init {
        /// Domain or domain/path to harvest (e.g. example.com or example.com/news)
        domain: String,
        /// Only snapshots on or after this date (DD/MM/YYYY)
        #[arg(long)]
        from: Option<String>,
        /// Only snapshots on or before this date (DD/MM/YYYY)
        #[arg(long)]
        to: Option<String>,
        /// Cap the number of snapshots collected (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Download unfetched snapshots (streaming to DB, Ctrl-C safe)
    Fetch {
        /// Max snapshots to fetch (default: all unfetched)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Extract and clean all fetched pages
    Process {
        #[command(flatten)]
        clean: CleanArgs,
    },
    /// Fetch + process in one pipeline
    Run {
        /// Max snapshots to fetch
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[command(flatten)]
        clean: CleanArgs,
    },
    /// Export processed records to CSV and JSON files
    Export {
        /// Output file prefix
        #[arg(long, default_value = "wayback_export")]
        prefix: String,
        /// Also write chunk files of this many records
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Include the pre-cleaning raw text column (audit)
        #[arg(long)]
        raw: bool,
    },
    /// Show harvesting statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { domain, from, to, limit } => {
            let from_ts = from.as_deref().map(cdx::day_start).transpose()?;
            let to_ts = to.as_deref().map(cdx::day_end).transpose()?;
            if let (Some(f), Some(t)) = (&from_ts, &to_ts) {
                if f > t {
                    bail!("end date must not be before start date");
                }
            }

            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let domain_path = cdx::normalize_domain(&domain);
            if domain_path.is_empty() {
                bail!("no domain given");
            }
            let snapshots =
                cdx::fetch_snapshots(&domain_path, from_ts.as_deref(), to_ts.as_deref(), limit)
                    .await?;
            if snapshots.is_empty() {
                println!("The CDX index returned no snapshots for these criteria.");
                return Ok(());
            }
            let inserted = db::insert_snapshots(&conn, &snapshots)?;
            println!("Inserted {} new snapshots ({} total found)", inserted, snapshots.len());
            Ok(())
        }
        Commands::Fetch { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pending = db::fetch_unvisited(&conn, limit)?;
            if pending.is_empty() {
                println!("No unfetched snapshots. Run 'init' first or all snapshots are fetched.");
                return Ok(());
            }
            println!("Fetching {} snapshots (streaming to DB)...", pending.len());
            let stats = fetcher::fetch_pages_streaming(&conn, pending).await?;
            println!(
                "Done: {}/{} fetched ({} ok, {} errors).",
                stats.ok + stats.errors,
                stats.total,
                stats.ok,
                stats.errors
            );
            Ok(())
        }
        Commands::Process { clean } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let saved = process_pages(&conn, &clean.to_config())?;
            if saved > 0 {
                println!("Saved {} page records.", saved);
            }
            Ok(())
        }
        Commands::Run { limit, clean } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pending = db::fetch_unvisited(&conn, limit)?;
            if pending.is_empty() {
                println!("No unfetched snapshots. Run 'init' first.");
                return Ok(());
            }

            // Phase 1: fetch (streaming to DB)
            let t_fetch = Instant::now();
            println!("Pipeline: fetching {} snapshots (streaming to DB)...", pending.len());
            let stats = fetcher::fetch_pages_streaming(&conn, pending).await?;
            println!(
                "Fetched {} snapshots ({} ok, {} errors) in {:.1}s",
                stats.ok + stats.errors,
                stats.ok,
                stats.errors,
                t_fetch.elapsed().as_secs_f64()
            );
            if stats.interrupted {
                println!("Fetch interrupted; processing the pages collected so far.");
            }

            // Phase 2: extract + clean whatever was fetched
            let t_process = Instant::now();
            let saved = process_pages(&conn, &clean.to_config())?;
            if saved > 0 {
                println!(
                    "Saved {} page records in {:.1}s",
                    saved,
                    t_process.elapsed().as_secs_f64()
                );
            }
            Ok(())
        }
        Commands::Export { prefix, chunk_size, raw } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let records = db::fetch_records(&conn)?;
            if records.is_empty() {
                println!("No page records to export. Run 'process' first.");
                return Ok(());
            }
            let written = export::export_records(&records, &prefix, chunk_size, raw)?;
            println!("Exported {} records:", records.len());
            for path in written {
                println!("  {}", path.display());
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Snapshots: {}", s.total);
            println!("Fetched:   {}", s.fetched);
            println!("Unfetched: {}", s.unfetched);
            println!("Stored:    {}", s.stored);
            println!("Errors:    {}", s.errors);
            println!("Processed: {}", s.processed);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Extract every fetched page, then clean the whole batch as one corpus.
/// Extraction is per-page parallel; the cleaning engine builds its corpus
/// index only after all raw texts exist.
fn process_pages(conn: &rusqlite::Connection, cfg: &CleanConfig) -> anyhow::Result<usize> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let rows = db::fetch_extractable(conn)?;
    if rows.is_empty() {
        println!("No fetched pages to process. Run 'fetch' first.");
        return Ok(0);
    }

    println!("Extracting {} pages...", rows.len());
    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut pages: Vec<clean::PageRecord> = rows
        .par_iter()
        .filter_map(|row| {
            let extracted = extract::extract_page(&row.html);
            pb.inc(1);
            let ex = extracted?;
            Some(clean::PageRecord {
                timestamp: row.timestamp.clone(),
                original_url: row.original_url.clone(),
                archive_url: row.archive_url.clone(),
                title: ex.title,
                raw_text: ex.text,
                clean_text: String::new(),
            })
        })
        .collect();
    pb.finish_and_clear();

    let dropped = rows.len() - pages.len();
    if dropped > 0 {
        println!("Skipped {} pages with no recoverable text.", dropped);
    }
    if pages.is_empty() {
        println!("Nothing to clean.");
        return Ok(0);
    }

    println!("Cleaning {} pages...", pages.len());
    clean::clean_pages(&mut pages, cfg);

    for chunk in pages.chunks(500) {
        db::save_records(conn, chunk)?;
    }
    Ok(pages.len())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
