use std::sync::Arc;
use tracing::{debug, info, warn};

use placedb_core::config::IngestSettings;
use placedb_core::ids::stable_hash;
use placedb_core::traits::{GeoIndex, MarkerSet, VectorStore};
use placedb_core::types::{IndexedPlace, PlaceMetadata, VectorRecord};
use placedb_core::{Error, Place, PlaceCategory, Region, Result};
use placedb_search::PartitionReport;

use crate::describe::formatter_for;

/// Marker set holding external ids whose description exceeded the length limit.
pub const OVERLENGTH_SET: &str = "place:overlength";

pub fn build_record(category: PlaceCategory, place: &Place) -> VectorRecord {
    VectorRecord {
        id: stable_hash(&place.external_id),
        description: formatter_for(category).describe(place),
        metadata: PlaceMetadata {
            external_id: place.external_id.clone(),
            name: place.name.clone(),
            category,
            location: place.location,
            address: place.address.clone(),
            rating: place.rating_or_zero(),
            review_count: place.review_count_or_zero(),
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestBatch {
    pub places: usize,
    /// Rows the vector store actually wrote; unchanged rows are not counted.
    pub upserted: usize,
    pub indexed: usize,
    pub over_length: Vec<String>,
}

impl IngestBatch {
    fn absorb(&mut self, other: IngestBatch) {
        self.places += other.places;
        self.upserted += other.upserted;
        self.indexed += other.indexed;
        self.over_length.extend(other.over_length);
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub leaves: usize,
    pub totals: IngestBatch,
    /// Leaves dropped because the store reported a write conflict.
    pub conflicted: Vec<Region>,
}

pub struct IngestPipeline {
    vectors: Arc<dyn VectorStore>,
    geo: Arc<dyn GeoIndex>,
    markers: Option<Arc<dyn MarkerSet>>,
    max_description_chars: usize,
    batch_size: usize,
}

impl IngestPipeline {
    pub fn new(vectors: Arc<dyn VectorStore>, geo: Arc<dyn GeoIndex>, settings: &IngestSettings) -> Self {
        Self {
            vectors,
            geo,
            markers: None,
            max_description_chars: settings.max_description_chars,
            batch_size: settings.batch_size.max(1),
        }
    }

    pub fn with_markers(mut self, markers: Arc<dyn MarkerSet>) -> Self { self.markers = Some(markers); self }

    pub async fn ingest_places(&self, category: PlaceCategory, places: &[Place]) -> Result<IngestBatch> {
        let mut total = IngestBatch::default();
        for chunk in places.chunks(self.batch_size) {
            total.absorb(self.ingest_chunk(category, chunk).await?);
        }
        Ok(total)
    }

    async fn ingest_chunk(&self, category: PlaceCategory, places: &[Place]) -> Result<IngestBatch> {
        let records: Vec<VectorRecord> = places.iter().map(|p| build_record(category, p)).collect();
        let over_length: Vec<String> = records
            .iter()
            .filter(|r| r.description.chars().count() > self.max_description_chars)
            .map(|r| r.metadata.external_id.clone())
            .collect();
        for id in &over_length {
            warn!(external_id = %id, limit = self.max_description_chars, "description exceeds length limit");
        }

        let upserted = self.vectors.upsert(&records).await?;
        let key = category.geo_key();
        let points: Vec<IndexedPlace> = places
            .iter()
            .map(|p| IndexedPlace { category_key: key.clone(), place_id: p.external_id.clone(), location: p.location })
            .collect();
        self.geo.add_many(&points).await?;

        if let Some(markers) = self.markers.as_ref().filter(|_| !over_length.is_empty()) {
            markers.mark(OVERLENGTH_SET, &over_length).await?;
        }
        debug!(%category, places = places.len(), upserted, "ingested batch");
        Ok(IngestBatch { places: places.len(), upserted, indexed: points.len(), over_length })
    }

    /// Stores every leaf of a partition run. A write conflict drops only the leaf it hit.
    pub async fn ingest_report(&self, category: PlaceCategory, report: &PartitionReport) -> Result<IngestSummary> {
        let mut summary = IngestSummary::default();
        let processed_key = category.processed_regions_key();
        for leaf in &report.leaves {
            match self.ingest_places(category, &leaf.places).await {
                Ok(batch) => {
                    summary.leaves += 1;
                    summary.totals.absorb(batch);
                    if let Some(markers) = &self.markers {
                        markers.mark(&processed_key, &[leaf.region.to_string()]).await?;
                    }
                }
                Err(Error::UpstreamConflict(msg)) => {
                    warn!(region = %leaf.region, error = %msg, "write conflict, leaf abandoned");
                    summary.conflicted.push(leaf.region);
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            %category,
            leaves = summary.leaves,
            places = summary.totals.places,
            upserted = summary.totals.upserted,
            over_length = summary.totals.over_length.len(),
            conflicted = summary.conflicted.len(),
            "ingestion finished"
        );
        Ok(summary)
    }
}
