use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::Result;
use crate::geo::GeoPoint;
use crate::region::Region;
use crate::types::{CategoryQuery, IndexedPlace, Place, ScoredRecord, SimilarityRequest, VectorRecord};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Upstream place search. `count` is a cheap probe; `fetch` pages through every result
/// the upstream exposes for the region and is only meaningful below the result cap.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn count(&self, region: &Region, query: &CategoryQuery) -> Result<u32>;
    async fn fetch(&self, region: &Region, query: &CategoryQuery) -> Result<Vec<Place>>;
}

#[async_trait]
pub trait GeoIndex: Send + Sync {
    /// Re-adding an existing `(category_key, place_id)` moves the point.
    async fn add(&self, place: &IndexedPlace) -> Result<()>;
    async fn add_many(&self, places: &[IndexedPlace]) -> Result<()> {
        for place in places {
            self.add(place).await?;
        }
        Ok(())
    }
    /// Ids within `radius_km` of `center`, nearest first.
    async fn radius(&self, category_key: &str, center: GeoPoint, radius_km: f64) -> Result<Vec<String>>;
}

#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Ids among `ids` with `rating >= min_rating` and at least one review.
    async fn rated_among(&self, ids: &[String], min_rating: f64) -> Result<Vec<String>>;
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert-or-replace by record id; returns the number of rows written.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize>;
    async fn similarity_search(&self, request: &SimilarityRequest) -> Result<Vec<ScoredRecord>>;
}

/// Named string sets kept next to the stores (processed regions, over-length places).
#[async_trait]
pub trait MarkerSet: Send + Sync {
    async fn mark(&self, set: &str, members: &[String]) -> Result<()>;
    async fn members(&self, set: &str) -> Result<HashSet<String>>;
}

#[async_trait]
impl<T: PlaceSearch + ?Sized> PlaceSearch for std::sync::Arc<T> {
    async fn count(&self, region: &Region, query: &CategoryQuery) -> Result<u32> { (**self).count(region, query).await }
    async fn fetch(&self, region: &Region, query: &CategoryQuery) -> Result<Vec<Place>> { (**self).fetch(region, query).await }
}
