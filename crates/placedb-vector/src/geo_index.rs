//! Category-keyed point indexes with radius queries.
//!
//! `LanceGeoIndex` narrows the scan with the circle's bounding box and then applies the exact
//! haversine distance. `MemoryGeoIndex` keeps everything in process and is what tests and
//! one-shot CLI runs use when no store is configured.

use anyhow::Result;
use arrow_array::{Float64Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::Connection;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use placedb_core::filter::quote;
use placedb_core::traits::GeoIndex;
use placedb_core::types::IndexedPlace;
use placedb_core::{Error, GeoPoint};

use crate::columns;
use crate::schema::build_geo_schema;
use crate::table::{ensure_table, open_db, open_if_exists, store_error};

fn check_radius(radius_km: f64) -> placedb_core::Result<()> {
    if radius_km.is_finite() && radius_km >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("radius must be a non-negative distance, got {radius_km}")))
    }
}

fn nearest_first(mut hits: Vec<(String, f64)>) -> Vec<String> {
    hits.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    hits.into_iter().map(|(id, _)| id).collect()
}

pub struct LanceGeoIndex { conn: Connection, table_name: String }

impl LanceGeoIndex {
    pub async fn open(uri: &str, table_name: &str) -> Result<Self> {
        Ok(Self::with_connection(open_db(uri).await?, table_name))
    }

    pub fn with_connection(conn: Connection, table_name: &str) -> Self {
        Self { conn, table_name: table_name.to_string() }
    }

    async fn write(&self, places: &[IndexedPlace]) -> Result<()> {
        if places.is_empty() { return Ok(()); }
        // one row per key; the last position wins like repeated GEOADDs
        let mut latest: HashMap<(&str, &str), GeoPoint> = HashMap::new();
        for p in places { latest.insert((p.category_key.as_str(), p.place_id.as_str()), p.location); }
        let mut cats = Vec::new(); let mut ids = Vec::new(); let mut lats = Vec::new(); let mut lons = Vec::new();
        for ((cat, id), loc) in latest {
            cats.push(cat.to_string()); ids.push(id.to_string()); lats.push(loc.lat); lons.push(loc.lon);
        }
        let t = ensure_table(&self.conn, &self.table_name, build_geo_schema()).await?;
        let rb = RecordBatch::try_new(
            build_geo_schema(),
            vec![
                Arc::new(StringArray::from(cats)),
                Arc::new(StringArray::from(ids)),
                Arc::new(Float64Array::from(lats)),
                Arc::new(Float64Array::from(lons)),
            ],
        )?;
        let n = rb.num_rows();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), build_geo_schema()));
        let mut mi = t.merge_insert(&["category", "place_id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = mi.execute(reader).await?;
        debug!(table = %self.table_name, n, "indexed points");
        Ok(())
    }

    async fn scan(&self, category_key: &str, center: GeoPoint, radius_km: f64) -> Result<Vec<String>> {
        let Some(t) = open_if_exists(&self.conn, &self.table_name).await? else { return Ok(Vec::new()) };
        let env = center.envelope(radius_km);
        let lon = env
            .lon_ranges()
            .iter()
            .map(|(lo, hi)| format!("(lon >= {lo} AND lon <= {hi})"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let predicate = format!(
            "category = {} AND lat >= {} AND lat <= {} AND ({lon})",
            quote(category_key), env.min_lat, env.max_lat
        );
        let mut stream = t
            .query()
            .only_if(predicate)
            .select(Select::columns(&["place_id", "lat", "lon"]))
            .execute()
            .await?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let id = columns::strings(&batch, "place_id")?;
            let lat = columns::f64s(&batch, "lat")?;
            let lon = columns::f64s(&batch, "lon")?;
            for i in 0..batch.num_rows() {
                let d = center.distance_km(&GeoPoint { lat: lat.value(i), lon: lon.value(i) });
                if d <= radius_km { hits.push((id.value(i).to_string(), d)); }
            }
        }
        Ok(nearest_first(hits))
    }
}

#[async_trait]
impl GeoIndex for LanceGeoIndex {
    async fn add(&self, place: &IndexedPlace) -> placedb_core::Result<()> {
        self.write(std::slice::from_ref(place)).await.map_err(store_error)
    }

    async fn add_many(&self, places: &[IndexedPlace]) -> placedb_core::Result<()> {
        self.write(places).await.map_err(store_error)
    }

    async fn radius(&self, category_key: &str, center: GeoPoint, radius_km: f64) -> placedb_core::Result<Vec<String>> {
        check_radius(radius_km)?;
        self.scan(category_key, center, radius_km).await.map_err(store_error)
    }
}

#[derive(Default)]
pub struct MemoryGeoIndex { points: RwLock<HashMap<String, HashMap<String, GeoPoint>>> }

impl MemoryGeoIndex {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self, category_key: &str) -> usize {
        self.points.read().await.get(category_key).map_or(0, HashMap::len)
    }
}

#[async_trait]
impl GeoIndex for MemoryGeoIndex {
    async fn add(&self, place: &IndexedPlace) -> placedb_core::Result<()> {
        let mut points = self.points.write().await;
        points.entry(place.category_key.clone()).or_default().insert(place.place_id.clone(), place.location);
        Ok(())
    }

    async fn radius(&self, category_key: &str, center: GeoPoint, radius_km: f64) -> placedb_core::Result<Vec<String>> {
        check_radius(radius_km)?;
        let points = self.points.read().await;
        let Some(members) = points.get(category_key) else { return Ok(Vec::new()) };
        let hits = members
            .iter()
            .filter_map(|(id, p)| {
                let d = center.distance_km(p);
                (d <= radius_km).then(|| (id.clone(), d))
            })
            .collect();
        Ok(nearest_first(hits))
    }
}
