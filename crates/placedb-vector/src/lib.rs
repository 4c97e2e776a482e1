pub mod columns;
pub mod geo_index;
pub mod markers;
pub mod schema;
pub mod store;
pub mod table;

pub use geo_index::{LanceGeoIndex, MemoryGeoIndex};
pub use markers::{LanceMarkerSet, MemoryMarkerSet};
pub use store::LanceVectorStore;

use anyhow::Result;
use std::sync::Arc;

use placedb_core::config::StoreSettings;
use placedb_core::traits::Embedder;

/// The three Lance-backed stores sharing one connection.
pub struct Stores {
    pub vectors: Arc<LanceVectorStore>,
    pub geo: Arc<LanceGeoIndex>,
    pub markers: Arc<LanceMarkerSet>,
}

impl Stores {
    pub async fn open(settings: &StoreSettings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let uri = settings.resolved_uri();
        if let Some(parent) = uri.parent() { std::fs::create_dir_all(parent)?; }
        let conn = table::open_db(&uri.to_string_lossy()).await?;
        tracing::info!(uri = %uri.display(), "opened place store");
        Ok(Self {
            vectors: Arc::new(LanceVectorStore::with_connection(conn.clone(), &settings.places_table, embedder)),
            geo: Arc::new(LanceGeoIndex::with_connection(conn.clone(), &settings.geo_table)),
            markers: Arc::new(LanceMarkerSet::new(conn, &settings.markers_table)),
        })
    }
}
