use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use placedb_core::config::IngestSettings;
use placedb_core::ids::stable_hash;
use placedb_core::traits::{GeoIndex, MarkerSet, VectorStore};
use placedb_core::types::{ScoredRecord, SimilarityRequest, VectorRecord};
use placedb_core::{Error, GeoPoint, Place, PlaceCategory, Region};
use placedb_ingest::{build_record, IngestPipeline, OVERLENGTH_SET};
use placedb_search::{Leaf, PartitionReport};
use placedb_vector::{MemoryGeoIndex, MemoryMarkerSet};

/// Keeps records by id; any batch containing `conflict_on` fails like a concurrent commit.
#[derive(Default)]
struct RecordingStore {
    rows: Mutex<HashMap<String, VectorRecord>>,
    conflict_on: Option<String>,
    calls: Mutex<usize>,
}

#[async_trait]
impl VectorStore for RecordingStore {
    async fn upsert(&self, records: &[VectorRecord]) -> placedb_core::Result<usize> {
        *self.calls.lock().unwrap() += 1;
        if let Some(bad) = &self.conflict_on {
            if records.iter().any(|r| &r.metadata.external_id == bad) {
                return Err(Error::UpstreamConflict("commit conflict".into()));
            }
        }
        let mut rows = self.rows.lock().unwrap();
        for r in records { rows.insert(r.id.clone(), r.clone()); }
        Ok(records.len())
    }

    async fn similarity_search(&self, _request: &SimilarityRequest) -> placedb_core::Result<Vec<ScoredRecord>> {
        Ok(Vec::new())
    }
}

fn place(id: &str, lat: f64, lon: f64) -> Place {
    let mut p = Place::new(id, format!("Cafe {id}"), GeoPoint { lat, lon });
    p.address = "Seoul".into();
    p.rating = Some(4.2);
    p.review_count = Some(10);
    p
}

fn leaf(region: Region, places: Vec<Place>) -> Leaf {
    Leaf { region, depth: 1, expected: u32::try_from(places.len()).unwrap(), places, truncated: false }
}

fn settings() -> IngestSettings {
    IngestSettings { max_description_chars: 7400, batch_size: 2 }
}

#[test]
fn record_ids_are_content_addressed() {
    let p = place("ChIJN1t_tDeuEmsRUsoyG83frY4", 37.5, 127.0);
    let r = build_record(PlaceCategory::Cafe, &p);
    assert_eq!(r.id, "db8ec763-bf05-3034-8791-74b5da189fc8");
    assert_eq!(r.metadata.category, PlaceCategory::Cafe);
    assert_eq!(r.metadata.rating, 4.2);

    let mut bare = Place::new("x", "No data", GeoPoint { lat: 37.5, lon: 127.0 });
    bare.rating = None;
    let r = build_record(PlaceCategory::Parking, &bare);
    assert_eq!((r.metadata.rating, r.metadata.review_count), (0.0, 0));
}

#[tokio::test]
async fn ingest_places_writes_store_and_geo_index() -> anyhow::Result<()> {
    let store = Arc::new(RecordingStore::default());
    let geo = Arc::new(MemoryGeoIndex::new());
    let pipeline = IngestPipeline::new(store.clone(), geo.clone(), &settings());

    let places: Vec<Place> = (0..5).map(|i| place(&format!("c{i}"), 37.5 + f64::from(i) * 0.001, 127.0)).collect();
    let batch = pipeline.ingest_places(PlaceCategory::Cafe, &places).await?;
    assert_eq!((batch.places, batch.upserted, batch.indexed), (5, 5, 5));
    assert!(batch.over_length.is_empty());
    assert_eq!(*store.calls.lock().unwrap(), 3);
    assert_eq!(geo.len("places:cafe").await, 5);

    // same input again: same ids, no growth
    pipeline.ingest_places(PlaceCategory::Cafe, &places).await?;
    assert_eq!(store.rows.lock().unwrap().len(), 5);
    assert_eq!(geo.len("places:cafe").await, 5);
    assert!(store.rows.lock().unwrap().contains_key(&stable_hash("c3")));

    let near = geo.radius("places:cafe", GeoPoint { lat: 37.5, lon: 127.0 }, 0.2).await?;
    assert_eq!(near.first().map(String::as_str), Some("c0"));
    Ok(())
}

#[tokio::test]
async fn long_descriptions_are_marked_but_still_stored() -> anyhow::Result<()> {
    let store = Arc::new(RecordingStore::default());
    let markers = Arc::new(MemoryMarkerSet::new());
    let pipeline = IngestPipeline::new(store.clone(), Arc::new(MemoryGeoIndex::new()), &settings())
        .with_markers(markers.clone());

    let mut long = place("long", 37.5, 127.0);
    long.reviews = vec!["x".repeat(8000)];
    let short = place("short", 37.5, 127.0);
    let batch = pipeline.ingest_places(PlaceCategory::Restaurant, &[long, short]).await?;

    assert_eq!(batch.over_length, vec!["long".to_string()]);
    assert_eq!(batch.upserted, 2);
    let marked = markers.members(OVERLENGTH_SET).await?;
    assert!(marked.contains("long") && !marked.contains("short"));
    Ok(())
}

#[tokio::test]
async fn conflicts_abandon_only_their_leaf() -> anyhow::Result<()> {
    let store = Arc::new(RecordingStore { conflict_on: Some("bad".into()), ..RecordingStore::default() });
    let geo = Arc::new(MemoryGeoIndex::new());
    let markers = Arc::new(MemoryMarkerSet::new());
    let pipeline = IngestPipeline::new(store.clone(), geo.clone(), &settings()).with_markers(markers.clone());

    let a = Region::new(127.0, 37.5, 127.1, 37.6)?;
    let b = Region::new(127.1, 37.5, 127.2, 37.6)?;
    let c = Region::new(127.2, 37.5, 127.3, 37.6)?;
    let report = PartitionReport {
        leaves: vec![
            leaf(a, vec![place("a1", 37.55, 127.05), place("a2", 37.56, 127.05)]),
            leaf(b, vec![place("bad", 37.55, 127.15)]),
            leaf(c, vec![place("c1", 37.55, 127.25)]),
        ],
        ..PartitionReport::default()
    };

    let summary = pipeline.ingest_report(PlaceCategory::Cafe, &report).await?;
    assert_eq!(summary.leaves, 2);
    assert_eq!(summary.totals.places, 3);
    assert_eq!(summary.conflicted, vec![b]);
    assert_eq!(geo.len("places:cafe").await, 3);

    let processed = markers.members("regions:cafe:processed").await?;
    assert!(processed.contains(&a.to_string()));
    assert!(!processed.contains(&b.to_string()));
    assert!(processed.contains(&c.to_string()));
    Ok(())
}

#[tokio::test]
async fn other_store_errors_propagate() {
    struct Broken;
    #[async_trait]
    impl VectorStore for Broken {
        async fn upsert(&self, _records: &[VectorRecord]) -> placedb_core::Result<usize> {
            Err(Error::Store("disk full".into()))
        }
        async fn similarity_search(&self, _request: &SimilarityRequest) -> placedb_core::Result<Vec<ScoredRecord>> {
            Ok(Vec::new())
        }
    }
    let pipeline = IngestPipeline::new(Arc::new(Broken), Arc::new(MemoryGeoIndex::new()), &settings());
    let report = PartitionReport {
        leaves: vec![leaf(Region::seoul(), vec![place("a", 37.5, 127.0)])],
        ..PartitionReport::default()
    };
    let err = pipeline.ingest_report(PlaceCategory::Cafe, &report).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
}
