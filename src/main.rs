//! # Newswire Sitemaps
//!
//! Harvests the time-sharded sitemap archives that news-wire publishers
//! expose (one document per month or per day) and turns them into article
//! datasets: one JSON file per calendar year plus one cumulative file.
//!
//! ## Features
//!
//! - Built-in profiles for PR Newswire, Canada Newswire and Business Wire,
//!   extendable with a YAML profile file
//! - Gzipped or plain sitemap payloads, detected by content
//! - Malformed documents are salvaged by scanning for `<loc>` entries
//! - Bounded concurrent fetching with results kept in period order
//!
//! ## Usage
//!
//! ```sh
//! newswire_sitemaps prnewswire -o ./data
//! ```
//!
//! ## Architecture
//!
//! 1. **Enumeration**: Resolve the publisher profile and list every period
//! 2. **Fetching**: Download, gunzip and parse each sitemap into records
//! 3. **Aggregation**: Fold records into the open year, sealing on year change
//! 4. **Output**: Write each sealed year, then the cumulative dataset

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod aggregate;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod periods;
mod pipeline;
mod sitemap;
mod utils;

use cli::Cli;
use config::PublisherTable;
use outputs::json::JsonDatasetWriter;
use sitemap::fetch::{FetcherConfig, SitemapFetcher};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newswire_sitemaps starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.publisher, ?args.output_dir, ?args.config, "Parsed CLI arguments");

    // --- Resolve publisher ---
    let mut table = PublisherTable::builtin();
    if let Some(path) = &args.config {
        if let Err(e) = table.load_file(path).await {
            error!(error = %e, "Failed to load publisher profiles");
            return Err(e.into());
        }
    }
    let profile = match table.resolve(&args.publisher) {
        Ok(profile) => profile,
        Err(e) => {
            error!(error = %e, "Cannot harvest unknown publisher");
            return Err(e.into());
        }
    };
    let end = args.until.unwrap_or_else(|| Local::now().date_naive());
    info!(
        publisher = %profile.name,
        start = %profile.start_date,
        end = %end,
        granularity = ?profile.granularity,
        "Resolved publisher profile"
    );

    // --- Output directory ---
    let writer = JsonDatasetWriter::new(&args.output_dir, &profile.name);
    ensure_writable_dir(writer.dir()).await?;

    // --- Fetcher ---
    let defaults = FetcherConfig::default();
    let fetcher = SitemapFetcher::new(FetcherConfig {
        timeout: Duration::from_secs(args.timeout_secs),
        user_agent: args.user_agent.clone().unwrap_or(defaults.user_agent),
        archive_dir: args.keep_xml.then(|| writer.dir().to_path_buf()),
    })?;

    // --- Harvest ---
    let cumulative = pipeline::run(profile, end, &fetcher, &writer, args.concurrency).await;
    let full_path = writer.write_cumulative(&cumulative).await?;

    let elapsed = start_time.elapsed();
    info!(
        path = %full_path.display(),
        records = cumulative.len(),
        years = cumulative.periods().len(),
        elapsed_secs = elapsed.as_secs_f64(),
        "newswire_sitemaps completed successfully"
    );

    Ok(())
}
