//! Breadth-first adaptive partitioning.
//!
//! The upstream exposes at most `result_cap` results per query, so any region whose count
//! probe exceeds the cap is split into quadrants until every leaf fits. Leaves are then
//! fetched in full. Places sitting exactly on a shared leaf edge can come back from both
//! neighbours; nothing here de-duplicates across leaves, and the content-addressed record
//! id turns the second store write into an overwrite.

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

use placedb_core::config::{OverflowPolicy, PartitionSettings};
use placedb_core::traits::PlaceSearch;
use placedb_core::{CategoryQuery, Error, Place, Region};

#[derive(Debug, Clone)]
pub struct PartitionOptions {
    pub result_cap: u32,
    pub max_depth: u32,
    pub concurrency: usize,
    pub overflow: OverflowPolicy,
}

impl Default for PartitionOptions {
    fn default() -> Self { Self::from(&PartitionSettings::default()) }
}

impl From<&PartitionSettings> for PartitionOptions {
    fn from(s: &PartitionSettings) -> Self {
        Self { result_cap: s.result_cap, max_depth: s.max_depth, concurrency: s.concurrency.max(1), overflow: s.overflow }
    }
}

/// Queue item: a region to probe for `query`, `depth` splits below its seed.
#[derive(Debug, Clone)]
pub struct PartitionTask<'q> {
    pub region: Region,
    pub query: &'q CategoryQuery,
    pub depth: u32,
}

/// A region at or below the cap together with everything fetched for it.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub region: Region,
    pub depth: u32,
    pub expected: u32,
    pub places: Vec<Place>,
    /// Fetched while still above the cap; `places` is incomplete.
    pub truncated: bool,
}

#[derive(Debug, Clone)]
pub struct AbandonedRegion {
    pub region: Region,
    pub depth: u32,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct OverflowedRegion {
    pub region: Region,
    pub depth: u32,
    pub count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PartitionReport {
    pub leaves: Vec<Leaf>,
    pub abandoned: Vec<AbandonedRegion>,
    pub overflowed: Vec<OverflowedRegion>,
    /// Leaves already marked processed by an earlier run.
    pub skipped: Vec<Region>,
    pub probes: usize,
}

impl PartitionReport {
    pub fn place_count(&self) -> usize { self.leaves.iter().map(|l| l.places.len()).sum() }

    pub fn unique_ids(&self) -> HashSet<&str> {
        self.leaves.iter().flat_map(|l| l.places.iter().map(|p| p.external_id.as_str())).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionProgress {
    pub probes: usize,
    pub queued: usize,
    pub leaves: usize,
    pub places: usize,
}

type ProgressFn = Box<dyn Fn(&PartitionProgress) + Send + Sync>;

enum Visit<'q> {
    Empty,
    Split(Vec<PartitionTask<'q>>),
    Leaf(Leaf),
    Skipped(Region),
    Overflow(OverflowedRegion, Option<Leaf>),
    Abandoned(AbandonedRegion),
}

pub struct PartitionEngine {
    search: Arc<dyn PlaceSearch>,
    options: PartitionOptions,
    completed: HashSet<String>,
    progress: Option<ProgressFn>,
}

impl PartitionEngine {
    pub fn new(search: Arc<dyn PlaceSearch>, options: PartitionOptions) -> Self {
        Self { search, options, completed: HashSet::new(), progress: None }
    }

    /// Region keys (`Region::to_string`) whose leaves are already stored and must not be refetched.
    pub fn with_completed(mut self, completed: HashSet<String>) -> Self { self.completed = completed; self }

    pub fn with_progress(mut self, f: impl Fn(&PartitionProgress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn options(&self) -> &PartitionOptions { &self.options }

    pub async fn run(&self, root: Region, query: &CategoryQuery) -> PartitionReport {
        self.run_many(vec![root], query).await
    }

    /// Partitions every seed region; failures abandon single regions, never the run.
    pub async fn run_many(&self, seeds: Vec<Region>, query: &CategoryQuery) -> PartitionReport {
        let mut report = PartitionReport::default();
        let mut progress = PartitionProgress::default();
        let mut queue: VecDeque<PartitionTask<'_>> =
            seeds.into_iter().map(|region| PartitionTask { region, query, depth: 0 }).collect();
        let mut in_flight = FuturesUnordered::new();
        info!(seeds = queue.len(), keyword = %query.keyword, cap = self.options.result_cap, "partition started");

        loop {
            while in_flight.len() < self.options.concurrency {
                let Some(task) = queue.pop_front() else { break };
                in_flight.push(self.visit(task));
            }
            let Some(visit) = in_flight.next().await else { break };
            report.probes += 1;
            match visit {
                Visit::Empty => {}
                Visit::Split(children) => queue.extend(children),
                Visit::Leaf(leaf) => {
                    progress.places += leaf.places.len();
                    report.leaves.push(leaf);
                }
                Visit::Skipped(region) => report.skipped.push(region),
                Visit::Overflow(overflow, leaf) => {
                    report.overflowed.push(overflow);
                    if let Some(leaf) = leaf {
                        progress.places += leaf.places.len();
                        report.leaves.push(leaf);
                    }
                }
                Visit::Abandoned(a) => report.abandoned.push(a),
            }
            if let Some(f) = &self.progress {
                progress.probes = report.probes;
                progress.queued = queue.len() + in_flight.len();
                progress.leaves = report.leaves.len();
                f(&progress);
            }
        }

        info!(
            probes = report.probes,
            leaves = report.leaves.len(),
            places = report.place_count(),
            abandoned = report.abandoned.len(),
            overflowed = report.overflowed.len(),
            skipped = report.skipped.len(),
            "partition finished"
        );
        report
    }

    async fn visit<'q>(&self, task: PartitionTask<'q>) -> Visit<'q> {
        let PartitionTask { region, query, depth } = task;
        if self.completed.contains(&region.to_string()) {
            debug!(%region, "already processed; skipping");
            return Visit::Skipped(region);
        }
        let count = match self.search.count(&region, query).await {
            Ok(count) => count,
            Err(err) => {
                warn!(%region, depth, error = %err, "count failed; abandoning region");
                return Visit::Abandoned(AbandonedRegion { region, depth, reason: err.to_string() });
            }
        };
        if count == 0 {
            return Visit::Empty;
        }
        if count > self.options.result_cap {
            if depth < self.options.max_depth && region.is_splittable() {
                debug!(%region, depth, count, "over cap; splitting");
                let children = region.quad_split().into_iter().map(|r| PartitionTask { region: r, query, depth: depth + 1 });
                return Visit::Split(children.collect());
            }
            let err = Error::PartitionDepthExceeded { depth, count };
            warn!(%region, error = %err, policy = ?self.options.overflow, "region cannot be split further");
            let overflow = OverflowedRegion { region, depth, count };
            return match self.options.overflow {
                OverflowPolicy::Skip => Visit::Overflow(overflow, None),
                OverflowPolicy::FetchCapped => match self.fetch_leaf(region, query, depth, count, true).await {
                    Ok(leaf) => Visit::Overflow(overflow, Some(leaf)),
                    Err(abandoned) => Visit::Abandoned(abandoned),
                },
            };
        }
        match self.fetch_leaf(region, query, depth, count, false).await {
            Ok(leaf) => Visit::Leaf(leaf),
            Err(abandoned) => Visit::Abandoned(abandoned),
        }
    }

    async fn fetch_leaf(&self, region: Region, query: &CategoryQuery, depth: u32, expected: u32, truncated: bool) -> Result<Leaf, AbandonedRegion> {
        let fetched = self.search.fetch(&region, query).await.map_err(|err| {
            warn!(%region, depth, error = %err, "fetch failed; abandoning region");
            AbandonedRegion { region, depth, reason: err.to_string() }
        })?;
        let mut seen = HashSet::new();
        let places: Vec<Place> = fetched.into_iter().filter(|p| seen.insert(p.external_id.clone())).collect();
        if places.len() as u32 != expected {
            debug!(%region, expected, got = places.len(), "fetched count differs from probe");
        }
        debug!(%region, depth, n = places.len(), "leaf fetched");
        Ok(Leaf { region, depth, expected, places, truncated })
    }
}
