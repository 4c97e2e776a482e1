use anyhow::{anyhow, Result};
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Float64Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType, Table};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use placedb_core::filter::quote;
use placedb_core::traits::{AttributeStore, Embedder, VectorStore};
use placedb_core::types::{PlaceMetadata, ScoredRecord, SimilarityRequest, VectorRecord};
use placedb_core::GeoPoint;

use crate::columns;
use crate::schema::build_places_schema;
use crate::table::{ensure_table, open_db, open_if_exists, store_error};

const IN_CHUNK: usize = 500;

/// Place descriptions with their embeddings and the metadata the funnel filters on.
pub struct LanceVectorStore {
    conn: Connection,
    table_name: String,
    embedder: Arc<dyn Embedder>,
}

impl LanceVectorStore {
    pub async fn open(uri: &str, table_name: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let conn = open_db(uri).await?;
        Ok(Self::with_connection(conn, table_name, embedder))
    }

    pub fn with_connection(conn: Connection, table_name: &str, embedder: Arc<dyn Embedder>) -> Self {
        Self { conn, table_name: table_name.to_string(), embedder }
    }

    pub fn connection(&self) -> &Connection { &self.conn }

    pub async fn count(&self) -> placedb_core::Result<usize> {
        self.count_inner().await.map_err(store_error)
    }

    async fn count_inner(&self) -> Result<usize> {
        match open_if_exists(&self.conn, &self.table_name).await? {
            Some(t) => Ok(t.count_rows(None).await?),
            None => Ok(0),
        }
    }

    async fn table(&self) -> Result<Table> {
        let dim = i32::try_from(self.embedder.dim())?;
        ensure_table(&self.conn, &self.table_name, build_places_schema(dim)).await
    }

    async fn stored_hashes(&self, t: &Table, ids: &[&str]) -> Result<HashMap<String, String>> {
        let mut out = HashMap::new();
        for chunk in ids.chunks(IN_CHUNK) {
            let list = chunk.iter().map(|id| quote(id)).collect::<Vec<_>>().join(", ");
            let mut stream = t
                .query()
                .only_if(format!("id IN ({list})"))
                .select(Select::columns(&["id", "content_hash"]))
                .execute()
                .await?;
            while let Some(batch) = stream.try_next().await? {
                let id = columns::strings(&batch, "id")?;
                let hash = columns::strings(&batch, "content_hash")?;
                for i in 0..batch.num_rows() {
                    out.insert(id.value(i).to_string(), hash.value(i).to_string());
                }
            }
        }
        Ok(out)
    }

    async fn upsert_inner(&self, records: &[VectorRecord]) -> Result<usize> {
        // last record wins for a repeated id
        let mut by_id: HashMap<&str, &VectorRecord> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for r in records {
            if by_id.insert(r.id.as_str(), r).is_none() { order.push(r.id.as_str()); }
        }
        if order.is_empty() { return Ok(0); }

        let t = self.table().await?;
        let stored = self.stored_hashes(&t, &order).await?;
        let mut pending: Vec<(&VectorRecord, String)> = Vec::new();
        for id in &order {
            let r = by_id[id];
            let hash = content_hash(r);
            if stored.get(*id).is_some_and(|h| *h == hash) { continue; }
            pending.push((r, hash));
        }
        let skipped = order.len() - pending.len();
        if pending.is_empty() {
            debug!(skipped, "all records unchanged");
            return Ok(0);
        }

        let texts: Vec<String> = pending.iter().map(|(r, _)| r.description.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).map_err(|e| placedb_core::Error::Embedding(format!("{e:#}")))?;
        if vectors.len() != pending.len() {
            return Err(anyhow!("embedder returned {} vectors for {} texts", vectors.len(), pending.len()));
        }
        let dim = i32::try_from(self.embedder.dim())?;
        let rb = to_record_batch(&pending, &vectors, dim)?;
        let schema = rb.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), schema));
        let mut mi = t.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = mi.execute(reader).await?;
        info!(table = %self.table_name, written = pending.len(), skipped, "upserted place records");
        Ok(pending.len())
    }

    async fn search_inner(&self, request: &SimilarityRequest) -> Result<Vec<ScoredRecord>> {
        if request.query.trim().is_empty() || request.top_k == 0 { return Ok(Vec::new()); }
        let Some(t) = open_if_exists(&self.conn, &self.table_name).await? else { return Ok(Vec::new()) };
        let q = self
            .embedder
            .embed_batch(&[request.query.clone()])
            .map_err(|e| placedb_core::Error::Embedding(format!("{e:#}")))?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("embedder returned no vector"))?;
        let mut query = t.vector_search(q)?.distance_type(DistanceType::Cosine).limit(request.top_k);
        if let Some(filter) = &request.filter {
            query = query.only_if(filter.to_sql());
        }
        let mut stream = query.execute().await?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let distance = columns::f32s(&batch, "_distance")?;
            let records = records_from_batch(&batch)?;
            for (i, record) in records.into_iter().enumerate() {
                let score = 1.0 - distance.value(i);
                if score >= request.min_similarity { hits.push(ScoredRecord { record, score }); }
            }
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(request.top_k);
        Ok(hits)
    }

    async fn rated_inner(&self, ids: &[String], min_rating: f64) -> Result<Vec<String>> {
        if ids.is_empty() { return Ok(Vec::new()); }
        let Some(t) = open_if_exists(&self.conn, &self.table_name).await? else { return Ok(Vec::new()) };
        let mut matched = HashSet::new();
        for chunk in ids.chunks(IN_CHUNK) {
            let list = chunk.iter().map(|id| quote(id)).collect::<Vec<_>>().join(", ");
            let mut stream = t
                .query()
                .only_if(format!("external_id IN ({list}) AND rating >= {min_rating} AND review_count > 0"))
                .select(Select::columns(&["external_id"]))
                .execute()
                .await?;
            while let Some(batch) = stream.try_next().await? {
                let ext = columns::strings(&batch, "external_id")?;
                for i in 0..batch.num_rows() { matched.insert(ext.value(i).to_string()); }
            }
        }
        Ok(ids.iter().filter(|id| matched.contains(*id)).cloned().collect())
    }
}

fn content_hash(r: &VectorRecord) -> String {
    let m = &r.metadata;
    let mut h = blake3::Hasher::new();
    for part in [r.description.as_str(), m.external_id.as_str(), m.name.as_str(), m.category.as_str(), m.address.as_str()] {
        h.update(part.as_bytes());
        h.update(&[0]);
    }
    h.update(&m.location.lat.to_le_bytes());
    h.update(&m.location.lon.to_le_bytes());
    h.update(&m.rating.to_le_bytes());
    h.update(&m.review_count.to_le_bytes());
    h.finalize().to_hex().to_string()
}

fn to_record_batch(rows: &[(&VectorRecord, String)], vectors: &[Vec<f32>], dim: i32) -> Result<RecordBatch> {
    let expected = usize::try_from(dim)?;
    if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
        return Err(anyhow!("embedding has dim {} but table expects {}", bad.len(), dim));
    }
    let mut ids = Vec::new(); let mut ext = Vec::new(); let mut cats = Vec::new(); let mut names = Vec::new();
    let mut addrs = Vec::new(); let mut lats = Vec::new(); let mut lons = Vec::new(); let mut ratings = Vec::new();
    let mut counts = Vec::new(); let mut descs = Vec::new(); let mut hashes = Vec::new();
    for (r, hash) in rows {
        let m = &r.metadata;
        ids.push(r.id.clone()); ext.push(m.external_id.clone()); cats.push(m.category.as_str().to_string());
        names.push(m.name.clone()); addrs.push(m.address.clone()); lats.push(m.location.lat); lons.push(m.location.lon);
        ratings.push(m.rating); counts.push(i32::try_from(m.review_count).unwrap_or(i32::MAX));
        descs.push(r.description.clone()); hashes.push(hash.clone());
    }
    let vecs = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
        vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>())),
        dim,
    );
    Ok(RecordBatch::try_new(
        build_places_schema(dim),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(ext)),
            Arc::new(StringArray::from(cats)),
            Arc::new(StringArray::from(names)),
            Arc::new(StringArray::from(addrs)),
            Arc::new(Float64Array::from(lats)),
            Arc::new(Float64Array::from(lons)),
            Arc::new(Float64Array::from(ratings)),
            Arc::new(Int32Array::from(counts)),
            Arc::new(StringArray::from(descs)),
            Arc::new(StringArray::from(hashes)),
            Arc::new(vecs),
        ],
    )?)
}

fn records_from_batch(batch: &RecordBatch) -> Result<Vec<VectorRecord>> {
    let id = columns::strings(batch, "id")?;
    let ext = columns::strings(batch, "external_id")?;
    let cat = columns::strings(batch, "category")?;
    let name = columns::strings(batch, "name")?;
    let addr = columns::strings(batch, "address")?;
    let lat = columns::f64s(batch, "lat")?;
    let lon = columns::f64s(batch, "lon")?;
    let rating = columns::f64s(batch, "rating")?;
    let reviews = columns::i32s(batch, "review_count")?;
    let desc = columns::strings(batch, "description")?;
    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        out.push(VectorRecord {
            id: id.value(i).to_string(),
            description: desc.value(i).to_string(),
            metadata: PlaceMetadata {
                external_id: ext.value(i).to_string(),
                name: name.value(i).to_string(),
                category: cat.value(i).parse()?,
                location: GeoPoint { lat: lat.value(i), lon: lon.value(i) },
                address: addr.value(i).to_string(),
                rating: rating.value(i),
                review_count: u32::try_from(reviews.value(i).max(0)).unwrap_or(0),
            },
        });
    }
    Ok(out)
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn upsert(&self, records: &[VectorRecord]) -> placedb_core::Result<usize> {
        self.upsert_inner(records).await.map_err(lift)
    }

    async fn similarity_search(&self, request: &SimilarityRequest) -> placedb_core::Result<Vec<ScoredRecord>> {
        self.search_inner(request).await.map_err(lift)
    }
}

#[async_trait]
impl AttributeStore for LanceVectorStore {
    async fn rated_among(&self, ids: &[String], min_rating: f64) -> placedb_core::Result<Vec<String>> {
        self.rated_inner(ids, min_rating).await.map_err(lift)
    }
}

/// Keeps core errors raised inside the anyhow glue (embedding failures) intact.
fn lift(err: anyhow::Error) -> placedb_core::Error {
    match err.downcast::<placedb_core::Error>() {
        Ok(e) => e,
        Err(other) => store_error(other),
    }
}
