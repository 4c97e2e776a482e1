//! Shared startup for the placedb binaries.

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use placedb_core::config::{Config, Settings};
use placedb_core::traits::Embedder;
use placedb_embed::get_default_embedder;
use placedb_vector::Stores;

/// `RUST_LOG` wins when set; otherwise each `-v` raises the level from warn.
pub fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e:#}");
        e
    })?;
    config.settings()
}

pub async fn open_stores(settings: &Settings) -> anyhow::Result<Stores> {
    let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder()?);
    Stores::open(&settings.store, embedder).await
}
