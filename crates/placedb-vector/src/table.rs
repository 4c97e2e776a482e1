//! LanceDB connection and housekeeping helpers.
//!
//! Provides database open functions, an ensure helper for tables and conversion of storage
//! errors into the core taxonomy.

use anyhow::Result;
use lancedb::{connect, Connection, Table};

use arrow_array::RecordBatchIterator;
use std::sync::Arc;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<Table> {
    let names = conn.table_names().execute().await?;
    if names.contains(&name.to_string()) {
        return Ok(conn.open_table(name).execute().await?);
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    Ok(conn.create_table(name, Box::new(iter)).execute().await?)
}

pub async fn open_if_exists(conn: &Connection, name: &str) -> Result<Option<Table>> {
    let names = conn.table_names().execute().await?;
    if !names.contains(&name.to_string()) { return Ok(None); }
    Ok(Some(conn.open_table(name).execute().await?))
}

/// Maps a storage failure onto the core taxonomy. Lance commit conflicts from concurrent
/// writers surface as `UpstreamConflict` so ingestion can abandon just the affected batch.
pub fn store_error(err: anyhow::Error) -> placedb_core::Error {
    let msg = format!("{err:#}");
    if is_commit_conflict(&err) {
        placedb_core::Error::UpstreamConflict(msg)
    } else {
        placedb_core::Error::Store(msg)
    }
}

/// Lance reports both `CommitConflict` and `RetryableCommitConflict` as "... commit conflict for version N".
fn is_commit_conflict(err: &anyhow::Error) -> bool {
    err.downcast_ref::<lancedb::Error>().is_some()
        && err.chain().any(|cause| cause.to_string().to_ascii_lowercase().contains("commit conflict"))
}
