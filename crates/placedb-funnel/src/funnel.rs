//! Read path from a location and a mood to a short ranked list:
//! geo radius, then the adaptive rating filter, then similarity reranking.
//!
//! Every stage runs under its own timeout. Only the geo stage is essential; a failing filter
//! leaves the candidates unfiltered and a failing reranker leaves the ranking empty, with
//! the failed stage reported in [`Retrieval::degraded`].

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use placedb_core::config::FunnelSettings;
use placedb_core::traits::{AttributeStore, GeoIndex, VectorStore};
use placedb_core::types::{RankedPlace, RetrievalRequest};
use placedb_core::{Error, Result};

use crate::filter::{AdaptiveFilter, ThresholdPolicy};
use crate::rerank::SimilarityReranker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Geo,
    Attributes,
    Similarity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Retrieval {
    pub ranked: Vec<RankedPlace>,
    pub candidates: Vec<String>,
    pub degraded: Option<FunnelStage>,
}

pub struct RetrievalFunnel {
    geo: Arc<dyn GeoIndex>,
    filter: AdaptiveFilter,
    reranker: SimilarityReranker,
    settings: FunnelSettings,
}

async fn staged<T>(stage: FunnelStage, limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(Error::Operation(format!("{stage:?} stage timed out after {}ms", limit.as_millis()))),
    }
}

impl RetrievalFunnel {
    pub fn new(
        geo: Arc<dyn GeoIndex>,
        attributes: Arc<dyn AttributeStore>,
        vectors: Arc<dyn VectorStore>,
        settings: FunnelSettings,
    ) -> Self {
        Self {
            geo,
            filter: AdaptiveFilter::new(attributes, ThresholdPolicy::from(&settings)),
            reranker: SimilarityReranker::new(vectors),
            settings,
        }
    }

    pub async fn retrieve(&self, request: &RetrievalRequest) -> Result<Retrieval> {
        let profile = self.settings.profile(request.category);
        let radius_km = request.radius_km.unwrap_or(profile.radius_km);
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(Error::InvalidArgument(format!("radius must be positive, got {radius_km}")));
        }
        let limit = Duration::from_millis(self.settings.stage_timeout_ms);
        let key = request.category.geo_key();

        let nearby = staged(FunnelStage::Geo, limit, self.geo.radius(&key, request.location, radius_km))
            .await
            .map_err(|e| Error::RetrievalUnavailable(e.to_string()))?;
        if nearby.is_empty() {
            info!(category = %request.category, radius_km, "no places in range");
            return Ok(Retrieval::default());
        }

        let mut degraded = None;
        let candidates = match profile.min_rating {
            None => nearby,
            Some(baseline) => match staged(FunnelStage::Attributes, limit, self.filter.apply(&nearby, baseline)).await {
                Ok(outcome) => outcome.ids,
                Err(e) => {
                    warn!(error = %e, "attribute filter failed, continuing unfiltered");
                    degraded = Some(FunnelStage::Attributes);
                    nearby
                }
            },
        };

        let rerank = self.reranker.rerank(&request.mood, &candidates, profile.top_k, profile.min_similarity);
        let ranked = match staged(FunnelStage::Similarity, limit, rerank).await {
            Ok(ranked) => ranked,
            Err(e) => {
                warn!(error = %e, "similarity reranking failed, returning candidates only");
                degraded = Some(FunnelStage::Similarity);
                Vec::new()
            }
        };
        info!(
            category = %request.category,
            candidates = candidates.len(),
            ranked = ranked.len(),
            degraded = ?degraded,
            "retrieval finished"
        );
        Ok(Retrieval { ranked, candidates, degraded })
    }
}
