//! Parallel evaluation of one search round.
//!
//! Every probe of a round runs as its own tokio task against a shared,
//! read-only snapshot of the change set. Each task materializes its own
//! subset or complement, so no two tasks ever alias a buffer. The round ends
//! only when every task has joined; the winner is then the lowest probe
//! index whose slot reads `true`, regardless of completion order.
//!
//! With eager cancellation, a hit publishes its index through an atomic
//! minimum and tasks with a higher index skip the oracle. The lowest
//! interesting probe can never be skipped, so the outcome is the same as an
//! exhaustive round.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::trace;

use crate::error::{MinimizerError, Result};
use crate::granularity::RoundOutcome;
use crate::oracle::Oracle;
use crate::partition::{complement_at, subset_at, Partition};

/// One candidate evaluated in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Block `i` alone.
    Subset(usize),
    /// Everything except block `i`.
    Complement(usize),
}

impl Probe {
    /// Build the candidate this probe stands for.
    pub fn materialize<T: Clone>(&self, changes: &[T], granularity: usize) -> Result<Vec<T>> {
        match *self {
            Probe::Subset(i) => subset_at(changes, i, granularity),
            Probe::Complement(i) => complement_at(changes, i, granularity),
        }
    }

    fn outcome(self) -> RoundOutcome {
        match self {
            Probe::Subset(i) => RoundOutcome::SubsetHit(i),
            Probe::Complement(i) => RoundOutcome::ComplementHit(i),
        }
    }
}

/// Fans a round's probes out to the oracle and joins them.
pub struct ParallelEvaluator<T, O: ?Sized> {
    oracle: Arc<O>,
    permits: Arc<Semaphore>,
    eager_cancellation: bool,
    oracle_calls: Arc<AtomicUsize>,
    skipped: Arc<AtomicUsize>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T, O> ParallelEvaluator<T, O>
where
    T: Clone + Send + Sync + 'static,
    O: Oracle<T> + ?Sized + 'static,
{
    /// Create an evaluator running at most `max_concurrency` oracle calls at once.
    pub fn new(oracle: Arc<O>, max_concurrency: usize, eager_cancellation: bool) -> Self {
        Self {
            oracle,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            eager_cancellation,
            oracle_calls: Arc::new(AtomicUsize::new(0)),
            skipped: Arc::new(AtomicUsize::new(0)),
            _phantom: PhantomData,
        }
    }

    /// Evaluate all `granularity` subsets.
    pub async fn evaluate_subsets(
        &self,
        changes: &Arc<[T]>,
        granularity: usize,
    ) -> Result<RoundOutcome> {
        let probes = (0..granularity).map(Probe::Subset).collect();
        self.evaluate(changes, granularity, probes).await
    }

    /// Evaluate all `granularity` complements.
    pub async fn evaluate_complements(
        &self,
        changes: &Arc<[T]>,
        granularity: usize,
    ) -> Result<RoundOutcome> {
        let probes = (0..granularity).map(Probe::Complement).collect();
        self.evaluate(changes, granularity, probes).await
    }

    /// Evaluate subsets and complements in a single pass.
    ///
    /// Logical index `i < n` is subset `i`, index `i >= n` is complement
    /// `i - n`, so a subset hit always wins over a complement hit.
    pub async fn evaluate_combined(
        &self,
        changes: &Arc<[T]>,
        granularity: usize,
    ) -> Result<RoundOutcome> {
        let probes = (0..2 * granularity)
            .map(|i| {
                if i < granularity {
                    Probe::Subset(i)
                } else {
                    Probe::Complement(i - granularity)
                }
            })
            .collect();
        self.evaluate(changes, granularity, probes).await
    }

    /// Run the oracle once on a full candidate, outside any round.
    pub async fn check(&self, candidate: &[T]) -> bool {
        self.oracle_calls.fetch_add(1, Ordering::Relaxed);
        self.oracle.interesting(candidate).await
    }

    /// Oracle calls made so far.
    pub fn oracle_calls(&self) -> usize {
        self.oracle_calls.load(Ordering::Relaxed)
    }

    /// Evaluations skipped by eager cancellation so far.
    pub fn skipped_evaluations(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    async fn evaluate(
        &self,
        changes: &Arc<[T]>,
        granularity: usize,
        probes: Vec<Probe>,
    ) -> Result<RoundOutcome> {
        let outcome = self
            .first_interesting(changes, granularity, &probes)
            .await?
            .map_or(RoundOutcome::NoHit, Probe::outcome);

        trace!(
            granularity,
            probes = probes.len(),
            ?outcome,
            "Round evaluated"
        );
        Ok(outcome)
    }

    async fn first_interesting(
        &self,
        changes: &Arc<[T]>,
        granularity: usize,
        probes: &[Probe],
    ) -> Result<Option<Probe>> {
        // Reject a bad granularity before any task is spawned
        Partition::new(changes.len(), granularity)?;

        let best = Arc::new(AtomicUsize::new(usize::MAX));
        let mut tasks = JoinSet::new();

        for (slot, probe) in probes.iter().copied().enumerate() {
            let oracle = Arc::clone(&self.oracle);
            let changes = Arc::clone(changes);
            let permits = Arc::clone(&self.permits);
            let best = Arc::clone(&best);
            let calls = Arc::clone(&self.oracle_calls);
            let skipped = Arc::clone(&self.skipped);
            let eager = self.eager_cancellation;

            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| MinimizerError::TaskFailed(e.to_string()))?;

                if eager && best.load(Ordering::Acquire) < slot {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    return Ok((slot, None));
                }

                let candidate = probe.materialize(&changes, granularity)?;
                calls.fetch_add(1, Ordering::Relaxed);
                let hit = oracle.interesting(&candidate).await;
                if hit {
                    best.fetch_min(slot, Ordering::AcqRel);
                }
                Ok::<_, MinimizerError>((slot, Some(hit)))
            });
        }

        let mut slots: Vec<Option<bool>> = vec![None; probes.len()];
        while let Some(joined) = tasks.join_next().await {
            let (slot, hit) = joined.map_err(|e| MinimizerError::TaskFailed(e.to_string()))??;
            slots[slot] = hit;
        }

        Ok(slots
            .iter()
            .position(|hit| *hit == Some(true))
            .map(|slot| probes[slot]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{FnOracle, SupersetOracle};
    use async_trait::async_trait;
    use std::time::{Duration, Instant};

    fn snapshot(len: u32) -> Arc<[u32]> {
        (0..len).collect::<Vec<_>>().into()
    }

    /// Interesting when any marker is present; lower markers answer slower.
    struct SlowMarkers {
        markers: Vec<u32>,
    }

    #[async_trait]
    impl Oracle<u32> for SlowMarkers {
        async fn interesting(&self, candidate: &[u32]) -> bool {
            let first = candidate.first().copied().unwrap_or(0);
            let delay = 40u64.saturating_sub(first as u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.markers.iter().any(|m| candidate.contains(m))
        }
    }

    #[test]
    fn test_probe_materialize() {
        let changes = vec![10, 11, 12, 13, 14];
        assert_eq!(Probe::Subset(1).materialize(&changes, 2).unwrap(), vec![12, 13, 14]);
        assert_eq!(Probe::Complement(0).materialize(&changes, 2).unwrap(), vec![12, 13, 14]);
        assert!(Probe::Subset(2).materialize(&changes, 2).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_subset_hit() {
        let evaluator = ParallelEvaluator::new(Arc::new(SupersetOracle::new([6u32, 7])), 4, false);
        let outcome = evaluator.evaluate_subsets(&snapshot(8), 4).await.unwrap();
        assert_eq!(outcome, RoundOutcome::SubsetHit(3));
        assert_eq!(evaluator.oracle_calls(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_complement_hit_and_no_hit() {
        let evaluator = ParallelEvaluator::new(Arc::new(SupersetOracle::new([1u32, 6])), 4, false);
        let changes = snapshot(8);

        assert_eq!(
            evaluator.evaluate_subsets(&changes, 4).await.unwrap(),
            RoundOutcome::NoHit
        );
        // Removing block 1 ([2, 3]) keeps both 1 and 6
        assert_eq!(
            evaluator.evaluate_complements(&changes, 4).await.unwrap(),
            RoundOutcome::ComplementHit(1)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_lowest_index_wins_despite_completion_order() {
        // Blocks 1 and 3 both hit; block 3 finishes first
        let oracle = Arc::new(SlowMarkers {
            markers: vec![10, 30],
        });
        let changes = snapshot(40);

        for _ in 0..5 {
            let evaluator = ParallelEvaluator::new(Arc::clone(&oracle), 8, false);
            let outcome = evaluator.evaluate_subsets(&changes, 4).await.unwrap();
            assert_eq!(outcome, RoundOutcome::SubsetHit(1));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_combined_prefers_subsets() {
        // Subset 2 and every complement but 2 hit; subset must win
        let evaluator = ParallelEvaluator::new(Arc::new(SupersetOracle::new([5u32])), 4, false);
        let outcome = evaluator.evaluate_combined(&snapshot(8), 4).await.unwrap();
        assert_eq!(outcome, RoundOutcome::SubsetHit(2));
        assert_eq!(evaluator.oracle_calls(), 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_combined_complement_hit() {
        let evaluator =
            ParallelEvaluator::new(Arc::new(SupersetOracle::new([0u32, 7])), 4, false);
        let outcome = evaluator.evaluate_combined(&snapshot(8), 4).await.unwrap();
        assert_eq!(outcome, RoundOutcome::ComplementHit(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_eager_cancellation_keeps_outcome() {
        let oracle = Arc::new(SlowMarkers {
            markers: vec![10, 30],
        });
        let changes = snapshot(40);

        let exhaustive = ParallelEvaluator::new(Arc::clone(&oracle), 1, false);
        let eager = ParallelEvaluator::new(Arc::clone(&oracle), 1, true);

        let a = exhaustive.evaluate_subsets(&changes, 8).await.unwrap();
        let b = eager.evaluate_subsets(&changes, 8).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a, RoundOutcome::SubsetHit(2));
        assert_eq!(
            eager.oracle_calls() + eager.skipped_evaluations(),
            exhaustive.oracle_calls()
        );
    }

    #[tokio::test]
    async fn test_eager_cancellation_skips_higher_probes() {
        // One permit on a single-threaded runtime: probes run in spawn order
        let oracle = Arc::new(SupersetOracle::new([2u32]));
        let changes = snapshot(8);

        let exhaustive = ParallelEvaluator::new(Arc::clone(&oracle), 1, false);
        let eager = ParallelEvaluator::new(Arc::clone(&oracle), 1, true);

        let a = exhaustive.evaluate_subsets(&changes, 8).await.unwrap();
        let b = eager.evaluate_subsets(&changes, 8).await.unwrap();

        assert_eq!(a, RoundOutcome::SubsetHit(2));
        assert_eq!(a, b);
        assert_eq!(exhaustive.oracle_calls(), 8);
        assert_eq!(exhaustive.skipped_evaluations(), 0);
        assert_eq!(eager.oracle_calls(), 3);
        assert_eq!(eager.skipped_evaluations(), 5);
    }

    #[tokio::test]
    async fn test_blocking_oracle_calls_overlap() {
        let oracle = Arc::new(FnOracle::new(|c: &[u32]| {
            std::thread::sleep(Duration::from_millis(100));
            c.contains(&5)
        }));
        let evaluator = ParallelEvaluator::new(oracle, 8, false);

        let start = Instant::now();
        let outcome = evaluator.evaluate_subsets(&snapshot(8), 8).await.unwrap();

        assert_eq!(outcome, RoundOutcome::SubsetHit(5));
        assert_eq!(evaluator.oracle_calls(), 8);
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_invalid_granularity_rejected() {
        let evaluator = ParallelEvaluator::new(Arc::new(FnOracle::new(|_: &[u32]| true)), 2, false);
        let err = evaluator.evaluate_subsets(&snapshot(3), 5).await.unwrap_err();
        assert_eq!(
            err,
            MinimizerError::InvalidGranularity {
                granularity: 5,
                len: 3
            }
        );
        assert_eq!(evaluator.oracle_calls(), 0);
    }

    #[tokio::test]
    async fn test_oracle_panic_is_reported() {
        let evaluator = ParallelEvaluator::new(
            Arc::new(FnOracle::new(|c: &[u32]| {
                if c.contains(&0) {
                    panic!("oracle crashed");
                }
                false
            })),
            2,
            false,
        );
        let err = evaluator.evaluate_subsets(&snapshot(4), 2).await.unwrap_err();
        assert!(matches!(err, MinimizerError::TaskFailed(_)));
    }
}
