use anyhow::Result;
use arrow_array::{RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use async_trait::async_trait;
use chrono::Utc;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::Connection;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use placedb_core::filter::quote;
use placedb_core::traits::MarkerSet;

use crate::columns;
use crate::schema::build_marker_schema;
use crate::table::{ensure_table, open_if_exists, store_error};

/// Marker sets persisted as `(set_name, member)` rows.
pub struct LanceMarkerSet { conn: Connection, table: String }

impl LanceMarkerSet {
    pub fn new(conn: Connection, table: &str) -> Self { Self { conn, table: table.to_string() } }

    async fn mark_inner(&self, set: &str, members: &[String]) -> Result<()> {
        if members.is_empty() { return Ok(()); }
        let t = ensure_table(&self.conn, &self.table, build_marker_schema()).await?;
        let unique: Vec<String> = members.iter().cloned().collect::<HashSet<_>>().into_iter().collect();
        let now = Utc::now().timestamp_millis();
        let rb = RecordBatch::try_new(
            build_marker_schema(),
            vec![
                Arc::new(StringArray::from(vec![set.to_string(); unique.len()])),
                Arc::new(StringArray::from(unique.clone())),
                Arc::new(TimestampMillisecondArray::from(vec![now; unique.len()])),
            ],
        )?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), build_marker_schema()));
        // Upsert behavior via merge_insert: (set_name, member) is unique
        let mut mi = t.merge_insert(&["set_name", "member"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = mi.execute(reader).await?;
        debug!(set, n = unique.len(), "marked members");
        Ok(())
    }

    async fn members_inner(&self, set: &str) -> Result<HashSet<String>> {
        let Some(t) = open_if_exists(&self.conn, &self.table).await? else { return Ok(HashSet::new()) };
        let mut stream = t
            .query()
            .only_if(format!("set_name = {}", quote(set)))
            .select(Select::columns(&["member"]))
            .execute()
            .await?;
        let mut out = HashSet::new();
        while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
            let member = columns::strings(&batch, "member")?;
            for i in 0..batch.num_rows() { out.insert(member.value(i).to_string()); }
        }
        Ok(out)
    }
}

#[async_trait]
impl MarkerSet for LanceMarkerSet {
    async fn mark(&self, set: &str, members: &[String]) -> placedb_core::Result<()> {
        self.mark_inner(set, members).await.map_err(store_error)
    }

    async fn members(&self, set: &str) -> placedb_core::Result<HashSet<String>> {
        self.members_inner(set).await.map_err(store_error)
    }
}

#[derive(Default)]
pub struct MemoryMarkerSet { sets: RwLock<HashMap<String, HashSet<String>>> }

impl MemoryMarkerSet {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl MarkerSet for MemoryMarkerSet {
    async fn mark(&self, set: &str, members: &[String]) -> placedb_core::Result<()> {
        if members.is_empty() { return Ok(()); }
        let mut sets = self.sets.write().await;
        sets.entry(set.to_string()).or_default().extend(members.iter().cloned());
        Ok(())
    }

    async fn members(&self, set: &str) -> placedb_core::Result<HashSet<String>> {
        Ok(self.sets.read().await.get(set).cloned().unwrap_or_default())
    }
}
