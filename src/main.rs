//! whispernote — Binary Entrypoint
//! Reads a Kindle highlights export and republishes each highlight as a note
//! in the configured note store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use whispernote::config;
use whispernote::extract::extract_highlights;
use whispernote::note::BatchId;
use whispernote::publish::{notestore::HttpNoteStore, Publisher};
use whispernote::runner::run_batch;

#[derive(Parser, Debug)]
#[command(name = "whispernote", about = "Add Kindle highlights to your note store")]
struct Args {
    /// Kindle highlights HTML document
    highlights: PathBuf,
    /// Text file containing the note store auth token
    token_file: PathBuf,
    /// Notebook to file the highlights under (service default when omitted)
    #[arg(short, long)]
    notebook: Option<String>,
    /// Note store base URL (also $NOTESTORE_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,
    /// Print verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "whispernote=debug,info"
    } else {
        "whispernote=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let token = config::load_auth_token(&args.token_file)?;
    let html = std::fs::read_to_string(&args.highlights)
        .with_context(|| format!("reading highlights from {}", args.highlights.display()))?;

    // Any input-format problem surfaces here, before the first remote call.
    let records = extract_highlights(&html)?;
    tracing::info!(records = records.len(), "extracted highlights");

    let store = HttpNoteStore::new(config::endpoint(args.endpoint), token);
    let publisher = Publisher::connect(store, args.notebook.as_deref()).await?;

    let batch = BatchId::now();
    let stats = run_batch(&publisher, &records, &batch).await?;
    tracing::info!(
        created = stats.created,
        skipped = stats.skipped,
        exhausted = stats.exhausted,
        batch = batch.as_str(),
        "run complete"
    );
    Ok(())
}
