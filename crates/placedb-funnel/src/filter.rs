//! Rating filter that tightens until the candidate set fits under the cap.
//!
//! Starting from a category baseline `t0`, the threshold is raised in fixed steps
//! (`t0 + k * step`, never accumulated) while more than `cap` ids pass. Raising stops at the
//! ceiling, or as soon as a raise would leave nothing, in which case the previous set stands.
//! If nothing passes the baseline at all, the candidates come back unfiltered.

use std::sync::Arc;
use tracing::debug;

use placedb_core::config::FunnelSettings;
use placedb_core::traits::AttributeStore;
use placedb_core::Result;

// absorbs `t0 + k * step` landing a hair under the ceiling
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub cap: usize,
    pub step: f64,
    pub ceiling: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self { Self { cap: 50, step: 0.2, ceiling: 4.2 } }
}

impl From<&FunnelSettings> for ThresholdPolicy {
    fn from(s: &FunnelSettings) -> Self {
        Self { cap: s.filter_cap, step: s.threshold_step, ceiling: s.threshold_ceiling }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub ids: Vec<String>,
    /// Threshold the returned ids satisfy; `None` when nothing passed the baseline.
    pub threshold: Option<f64>,
}

pub struct AdaptiveFilter {
    store: Arc<dyn AttributeStore>,
    policy: ThresholdPolicy,
}

impl AdaptiveFilter {
    pub fn new(store: Arc<dyn AttributeStore>, policy: ThresholdPolicy) -> Self { Self { store, policy } }

    pub fn policy(&self) -> &ThresholdPolicy { &self.policy }

    pub async fn apply(&self, candidates: &[String], baseline: f64) -> Result<FilterOutcome> {
        let mut current = self.store.rated_among(candidates, baseline).await?;
        if current.is_empty() {
            debug!(baseline, n = candidates.len(), "nothing passes the baseline, keeping candidates");
            return Ok(FilterOutcome { ids: candidates.to_vec(), threshold: None });
        }
        let mut threshold = baseline;
        let mut k = 1u32;
        while current.len() > self.policy.cap {
            let next = baseline + f64::from(k) * self.policy.step;
            if next >= self.policy.ceiling - EPSILON { break; }
            let narrowed = self.store.rated_among(&current, next).await?;
            if narrowed.is_empty() { break; }
            debug!(threshold = next, before = current.len(), after = narrowed.len(), "raised rating threshold");
            current = narrowed;
            threshold = next;
            k += 1;
        }
        Ok(FilterOutcome { ids: current, threshold: Some(threshold) })
    }
}
