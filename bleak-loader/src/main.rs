//! bleak-loader entry point: one-shot jsonl-to-sqlite ingest.

use anyhow::Context;
use bleak_loader::catalog::Catalog;
use bleak_loader::{jlog, lookup};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(about = "Builds a sqlite catalog from the fleet's survey log")]
struct Args {
    /// Input log.jsonl as written by bleak-logger
    #[arg(short, long)]
    input: PathBuf,

    /// Output sqlite database path (replaced if it exists)
    #[arg(short, long)]
    output: PathBuf,

    /// Optional OUI csv for manufacturer-name enrichment
    #[arg(long)]
    oui: Option<PathBuf>,

    /// Optional characteristic-name csv
    #[arg(long)]
    gatt_names: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut catalog = Catalog::create(&args.output).context("failed to create catalog")?;

    if let Some(path) = &args.oui {
        let rows = lookup::load_oui(path)?;
        info!(rows = rows.len(), "loaded OUI table");
        catalog.insert_oui(&rows)?;
    }
    if let Some(path) = &args.gatt_names {
        let rows = lookup::load_char_names(path)?;
        info!(rows = rows.len(), "loaded characteristic names");
        catalog.insert_char_names(&rows)?;
    }

    let ingest = jlog::read_log(&args.input)?;
    if ingest.skipped_lines > 0 {
        warn!(skipped = ingest.skipped_lines, "some log lines were malformed");
    }
    info!(rows = ingest.rows.len(), "flattened survey log");
    catalog.insert_log_rows(&ingest.rows)?;
    catalog.generate_records()?;

    info!(
        records = catalog.record_count()?,
        path = %args.output.display(),
        "catalog written"
    );
    Ok(())
}
