use anyhow::Result;
use clap::Parser;

use placedb_cli::{init_tracing, load_settings, open_stores};
use placedb_core::types::RetrievalRequest;
use placedb_core::{GeoPoint, PlaceCategory};
use placedb_funnel::RetrievalFunnel;

/// Find places near a location that match a mood.
#[derive(Parser)]
#[command(name = "placedb-retrieve", version, about, allow_negative_numbers = true)]
struct Cli {
    /// parking, cafe, restaurant or activity
    category: PlaceCategory,
    lat: f64,
    lon: f64,

    /// Free-text mood, e.g. "quiet place to read"
    #[arg(required = true, num_args = 1..)]
    mood: Vec<String>,

    /// Search radius in km (default: per category)
    #[arg(long)]
    radius: Option<f64>,

    /// Output the retrieval as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = load_settings()?;
    let stores = open_stores(&settings).await?;
    let funnel = RetrievalFunnel::new(stores.geo, stores.vectors.clone(), stores.vectors, settings.funnel);

    let request = RetrievalRequest {
        location: GeoPoint::new(cli.lat, cli.lon)?,
        radius_km: cli.radius,
        mood: cli.mood.join(" "),
        category: cli.category,
    };
    let retrieval = funnel.retrieve(&request).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&retrieval)?);
        return Ok(());
    }
    println!("Query: \"{}\" near {:.5},{:.5} ({})", request.mood, cli.lat, cli.lon, cli.category);
    if let Some(stage) = retrieval.degraded {
        println!("Note: {stage:?} stage unavailable, results are partial");
    }
    println!("{} candidates, {} ranked", retrieval.candidates.len(), retrieval.ranked.len());
    for (i, place) in retrieval.ranked.iter().enumerate() {
        println!("\n  {}. score={:.4}  {}  ({:.1}★, {} reviews)", i + 1, place.score, place.name, place.rating, place.review_count);
        println!("     {}", place.address);
    }
    Ok(())
}
