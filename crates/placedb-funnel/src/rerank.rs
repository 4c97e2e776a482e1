use std::sync::Arc;
use tracing::debug;

use placedb_core::filter::FilterExpr;
use placedb_core::traits::VectorStore;
use placedb_core::types::{RankedPlace, SimilarityRequest};
use placedb_core::Result;

/// Orders a candidate set by how close each description is to the user's mood text.
pub struct SimilarityReranker {
    store: Arc<dyn VectorStore>,
}

impl SimilarityReranker {
    pub fn new(store: Arc<dyn VectorStore>) -> Self { Self { store } }

    /// Blank mood text or an empty candidate set yields no ranking without touching the store.
    pub async fn rerank(&self, mood: &str, candidates: &[String], top_k: usize, min_similarity: f32) -> Result<Vec<RankedPlace>> {
        if mood.trim().is_empty() || top_k == 0 { return Ok(Vec::new()); }
        let Some(filter) = FilterExpr::any_of("external_id", candidates.iter().cloned()) else { return Ok(Vec::new()) };
        let request = SimilarityRequest { query: mood.to_string(), top_k, min_similarity, filter: Some(filter) };
        let mut hits = self.store.similarity_search(&request).await?;
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        debug!(candidates = candidates.len(), ranked = hits.len(), "reranked candidates");
        Ok(hits.into_iter().map(RankedPlace::from).collect())
    }
}
