// src/batch.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Bounded-concurrency batch runner.
//!
//! Every unit is spawned as its own tokio task and waits on a shared
//! semaphore before doing any work, so at most `concurrency` units run at
//! once. Results are gathered through `FuturesUnordered` in completion order;
//! each unit yields exactly one [`BatchItem`], and a failing (or panicking)
//! unit only ever affects its own outcome.

use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::constants::DEFAULT_CONCURRENCY;
use crate::error::{Result, S3ToolsError};
use crate::progress::{ProgressCounter, ProgressSink};

/// Result of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    /// Description of whatever the unit raised.
    Failure(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Outcome::Failure(msg) => Some(msg),
            Outcome::Success(_) => None,
        }
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(v) => Some(v),
            Outcome::Failure(_) => None,
        }
    }
}

/// A unit's identity paired with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem<I, T> {
    pub identity: I,
    pub outcome: Outcome<T>,
}

impl<I, T> BatchItem<I, T> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Number of failed units in `items`.
pub fn count_failures<I, T>(items: &[BatchItem<I, T>]) -> usize {
    items.iter().filter(|i| !i.is_success()).count()
}

/// Knobs for one batch call.
#[derive(Clone)]
pub struct BatchOptions {
    /// Upper bound on units running at once; 0 is treated as 1.
    pub concurrency: usize,
    pub progress: Option<Arc<dyn ProgressSink>>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            progress: None,
        }
    }
}

impl fmt::Debug for BatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOptions")
            .field("concurrency", &self.concurrency)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl BatchOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Workers actually used for `units` units.
    pub fn effective_concurrency(&self, units: usize) -> usize {
        self.concurrency.max(1).min(units.max(1))
    }
}

/// Zip source and destination lists, rejecting unequal or empty input.
pub fn pair_keys<A, B>(sources: Vec<A>, destinations: Vec<B>) -> Result<Vec<(A, B)>> {
    if sources.len() != destinations.len() {
        return Err(S3ToolsError::LengthMismatch {
            sources: sources.len(),
            destinations: destinations.len(),
        });
    }
    if sources.is_empty() {
        return Err(S3ToolsError::EmptyBatch);
    }
    Ok(sources.into_iter().zip(destinations).collect())
}

/// Full `Display` chain of an error, outermost first.
pub(crate) fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        // Most variants already print their source inline.
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = inner.source();
    }
    out
}

/// Run `op` once per unit with bounded concurrency.
///
/// Returns one [`BatchItem`] per unit in completion order. Fails only when
/// `units` is empty, before anything runs.
pub async fn run_batch<I, T, F, Fut>(
    label: &str,
    units: Vec<I>,
    options: &BatchOptions,
    op: F,
) -> Result<Vec<BatchItem<I, T>>>
where
    I: Clone + fmt::Debug + Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    if units.is_empty() {
        return Err(S3ToolsError::EmptyBatch);
    }

    let total = units.len();
    let jobs = options.effective_concurrency(total);
    info!("Starting {} of {} unit(s) (jobs={})", label, total, jobs);

    let sem = Arc::new(Semaphore::new(jobs));
    let progress = Arc::new(ProgressCounter::new(total as u64, options.progress.clone()));

    let mut futs = FuturesUnordered::new();
    for unit in units {
        let sem = sem.clone();
        let progress = progress.clone();
        let work = op(unit.clone());
        let id = unit.clone();
        let handle = tokio::spawn(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|e| S3ToolsError::Join(e.to_string()))?;
            debug!("{:?}: started", id);
            let result = work.await;
            progress.advance();
            result
        });
        futs.push(async move { (unit, handle.await) });
    }

    let mut items = Vec::with_capacity(total);
    while let Some((identity, joined)) = futs.next().await {
        let outcome = match joined {
            Ok(Ok(value)) => {
                debug!("{:?}: done", identity);
                Outcome::Success(value)
            }
            Ok(Err(e)) => {
                let msg = describe(&e);
                warn!("{} failed for {:?}: {}", label, identity, msg);
                Outcome::Failure(msg)
            }
            Err(join_err) => {
                // The task never reached its own progress update.
                progress.advance();
                let msg = format!("worker task failed: {join_err}");
                warn!("{} failed for {:?}: {}", label, identity, msg);
                Outcome::Failure(msg)
            }
        };
        items.push(BatchItem { identity, outcome });
    }
    progress.finish();

    info!(
        "Finished {}: {} unit(s), {} failed",
        label,
        items.len(),
        count_failures(&items)
    );
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::FnProgress;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn pairing_checks_length_before_emptiness() {
        let err = pair_keys(vec!["a"], Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err, S3ToolsError::LengthMismatch { sources: 1, destinations: 0 }));

        let err = pair_keys(Vec::<&str>::new(), Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err, S3ToolsError::EmptyBatch));

        assert_eq!(pair_keys(vec![1, 2], vec!["a", "b"]).unwrap(), vec![(1, "a"), (2, "b")]);
    }

    #[test]
    fn effective_concurrency_is_clamped() {
        let opts = BatchOptions::default().with_concurrency(0);
        assert_eq!(opts.effective_concurrency(10), 1);
        let opts = BatchOptions::default().with_concurrency(50);
        assert_eq!(opts.effective_concurrency(3), 3);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let res = run_batch("noop", Vec::<u32>::new(), &BatchOptions::default(), |_| async { Ok(()) }).await;
        assert!(matches!(res, Err(S3ToolsError::EmptyBatch)));
    }

    #[tokio::test]
    async fn one_outcome_per_unit_and_failures_stay_local() {
        let units: Vec<u32> = (0..20).collect();
        let items = run_batch("square", units.clone(), &BatchOptions::default(), |n| async move {
            if n == 7 {
                Err(S3ToolsError::InvalidArgument("seven".into()))
            } else {
                Ok(n * n)
            }
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 20);
        let ids: HashSet<u32> = items.iter().map(|i| i.identity).collect();
        assert_eq!(ids, units.into_iter().collect());
        assert_eq!(count_failures(&items), 1);

        let failed = items.iter().find(|i| i.identity == 7).unwrap();
        assert!(failed.outcome.failure().unwrap().contains("seven"));
        let ok = items.iter().find(|i| i.identity == 4).unwrap();
        assert_eq!(ok.outcome, Outcome::Success(16));
    }

    #[tokio::test]
    async fn panicking_unit_keeps_its_identity() {
        let items = run_batch("panic", vec![1u32, 2, 3], &BatchOptions::default(), |n| async move {
            if n == 2 {
                panic!("boom");
            }
            Ok(n)
        })
        .await
        .unwrap();
        assert_eq!(items.len(), 3);
        let failed = items.iter().find(|i| i.identity == 2).unwrap();
        assert!(!failed.is_success());
    }

    #[tokio::test]
    async fn concurrency_cap_is_respected() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let opts = BatchOptions::default().with_concurrency(3);

        let items = run_batch("sleep", (0..12).collect::<Vec<u32>>(), &opts, |_| {
            let running = running.clone();
            let peak = peak.clone();
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn progress_is_monotonic_and_reaches_total() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            Arc::new(FnProgress::new(move |done, total| seen.lock().unwrap().push((done, total))))
        };
        let opts = BatchOptions::default().with_concurrency(4).with_progress(sink);

        run_batch("count", (0..9).collect::<Vec<u32>>(), &opts, |n| async move {
            if n % 3 == 0 {
                Err(S3ToolsError::EmptyBatch)
            } else {
                Ok(())
            }
        })
        .await
        .unwrap();

        let seen = seen.lock().unwrap();
        let done: Vec<u64> = seen.iter().map(|(d, _)| *d).collect();
        assert!(done.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(done, (1..=9).collect::<Vec<u64>>());
        assert!(seen.iter().all(|(_, total)| *total == 9));
    }
}
