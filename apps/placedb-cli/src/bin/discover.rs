use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use placedb_cli::{init_tracing, load_settings, open_stores};
use placedb_core::traits::MarkerSet;
use placedb_core::{PlaceCategory, Region};
use placedb_ingest::IngestPipeline;
use placedb_search::{HttpPlaceSearch, PartitionEngine, PartitionOptions, RetryPolicy, Retrying};

/// Discover every place of a category inside a region and store it for retrieval.
#[derive(Parser)]
#[command(name = "placedb-discover", version, about, allow_negative_numbers = true)]
struct Cli {
    /// parking, cafe, restaurant or activity
    category: PlaceCategory,

    /// Root region as west,south,east,north (default: configured region)
    #[arg(long)]
    region: Option<Region>,

    /// Override the category's search keyword
    #[arg(long)]
    keyword: Option<String>,

    /// Skip regions already stored by an earlier run
    #[arg(long)]
    resume: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = load_settings()?;
    let stores = open_stores(&settings).await?;

    let mut query = cli.category.default_query();
    if let Some(keyword) = cli.keyword { query.keyword = keyword; }
    let root = cli.region.unwrap_or(settings.region);
    let seeds = root.grid(settings.partition.seed_rows, settings.partition.seed_cols)?;

    let search = Retrying::new(HttpPlaceSearch::new(settings.search.clone())?, RetryPolicy::from(&settings.retry));
    let mut engine = PartitionEngine::new(Arc::new(search), PartitionOptions::from(&settings.partition));
    if cli.resume {
        let done = stores.markers.members(&cli.category.processed_regions_key()).await?;
        println!("Resuming: {} regions already stored", done.len());
        engine = engine.with_completed(done);
    }

    println!("placedb-discover\n================");
    println!("Category: {}  Keyword: {}  Region: {}", cli.category, query.keyword, root);
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    let bar = pb.clone();
    let engine = engine.with_progress(move |p| {
        bar.set_message(format!("{} probes, {} queued, {} leaves, {} places", p.probes, p.queued, p.leaves, p.places));
    });
    let report = engine.run_many(seeds, &query).await;
    pb.finish_with_message(format!("Partitioned into {} leaves with {} places", report.leaves.len(), report.place_count()));

    let pipeline = IngestPipeline::new(stores.vectors.clone(), stores.geo.clone(), &settings.ingest)
        .with_markers(stores.markers.clone());
    let pb = ProgressBar::new_spinner();
    pb.set_message("Storing places...");
    pb.enable_steady_tick(Duration::from_millis(120));
    let summary = pipeline.ingest_report(cli.category, &report).await?;
    pb.finish_and_clear();

    println!("\nDiscovery finished");
    println!("  leaves:      {}", report.leaves.len());
    println!("  probes:      {}", report.probes);
    println!("  skipped:     {}", report.skipped.len());
    println!("  abandoned:   {}", report.abandoned.len());
    println!("  overflowed:  {}", report.overflowed.len());
    println!("  places:      {} ({} unique)", summary.totals.places, report.unique_ids().len());
    println!("  written:     {}", summary.totals.upserted);
    println!("  over-length: {}", summary.totals.over_length.len());
    println!("  conflicted:  {}", summary.conflicted.len());
    for a in &report.abandoned {
        println!("  ! abandoned {} at depth {}: {}", a.region, a.depth, a.reason);
    }
    for o in &report.overflowed {
        println!("  ! overflowed {} at depth {} with {} results", o.region, o.depth, o.count);
    }
    Ok(())
}
