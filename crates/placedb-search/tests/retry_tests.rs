use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use placedb_core::traits::PlaceSearch;
use placedb_core::{CategoryQuery, Error, Place, Region, Result};
use placedb_search::{RetryPolicy, Retrying};

/// Replays scripted count outcomes, then succeeds with `fallback`.
struct Scripted {
    outcomes: Mutex<VecDeque<Result<u32>>>,
    fallback: Option<u32>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(outcomes: Vec<Result<u32>>, fallback: Option<u32>) -> Self {
        Self { outcomes: Mutex::new(outcomes.into()), fallback, calls: AtomicUsize::new(0) }
    }
    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl PlaceSearch for Scripted {
    async fn count(&self, _region: &Region, _query: &CategoryQuery) -> Result<u32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => self.fallback.ok_or(Error::UpstreamRateLimited { attempts: 1 }),
        }
    }
    async fn fetch(&self, _region: &Region, _query: &CategoryQuery) -> Result<Vec<Place>> { Ok(Vec::new()) }
}

fn limited() -> Result<u32> { Err(Error::UpstreamRateLimited { attempts: 1 }) }

#[tokio::test(start_paused = true)]
async fn four_rate_limits_then_success_waits_linearly() {
    let api = Arc::new(Scripted::new(vec![limited(), limited(), limited(), limited()], Some(42)));
    let search = Retrying::new(api.clone(), RetryPolicy::default());
    let started = tokio::time::Instant::now();

    let count = search.count(&Region::seoul(), &CategoryQuery::keyword("cafe")).await.expect("eventually succeeds");

    assert_eq!(count, 42);
    assert_eq!(api.calls(), 5);
    assert_eq!(started.elapsed(), Duration::from_secs(10 + 20 + 30 + 40), "10s × attempt between tries");
}

#[tokio::test(start_paused = true)]
async fn persistent_rate_limit_gives_up_after_five_attempts() {
    let api = Arc::new(Scripted::new(Vec::new(), None));
    let search = Retrying::new(api.clone(), RetryPolicy::default());

    let err = search.count(&Region::seoul(), &CategoryQuery::keyword("cafe")).await.expect_err("never succeeds");

    assert!(matches!(err, Error::UpstreamRateLimited { attempts: 5 }), "got {err:?}");
    assert_eq!(api.calls(), 5);
}

#[tokio::test]
async fn conflicts_are_not_retried() {
    let api = Arc::new(Scripted::new(vec![Err(Error::UpstreamConflict("duplicate".into()))], Some(1)));
    let search = Retrying::new(api.clone(), RetryPolicy::default());

    let err = search.count(&Region::seoul(), &CategoryQuery::keyword("cafe")).await.expect_err("conflict surfaces");

    assert!(matches!(err, Error::UpstreamConflict(_)));
    assert_eq!(api.calls(), 1);
}

#[test]
fn delays_grow_linearly() {
    let p = RetryPolicy { max_attempts: 5, backoff_step: Duration::from_millis(250) };
    assert_eq!(p.delay_for(1), Duration::from_millis(250));
    assert_eq!(p.delay_for(4), Duration::from_secs(1));
}
