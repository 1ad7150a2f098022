//! Delta debugging search driver.
//!
//! Implements DDMIN from "Simplifying and Isolating Failure-Inducing Input"
//! by Zeller & Hildebrandt (2002) as a round-based state machine. Each round
//! evaluates every probe in parallel, then applies the granularity table:
//! reduce to a subset, reduce to a complement, split finer, or stop.
//!
//! The staged strategy evaluates complements only after a subset round
//! found nothing. The combined strategy evaluates both in one pass and moves
//! straight from searching to growing the granularity.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::config::{SearchConfig, Strategy};
use crate::error::{MinimizerError, Result};
use crate::evaluator::ParallelEvaluator;
use crate::granularity::{next_step, RoundOutcome, Transition};
use crate::oracle::Oracle;
use crate::partition::{complement_at, subset_at};
use crate::result::{Minimized, SearchStats};

/// Driver states.
///
/// The combined strategy only uses `SearchSubset` (its single pass),
/// `GrowGranularity` and `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Evaluate subsets (or, combined, subsets and complements).
    SearchSubset,
    /// Evaluate complements after a subset round without a hit.
    SearchComplement,
    /// No reduction at this granularity: split finer or finish.
    GrowGranularity,
    /// The current change set is the result.
    Done,
}

/// Delta debugging minimizer.
///
/// Shrinks an interesting change set to a smaller one that is still
/// interesting and cannot be reduced further at any granularity the search
/// explored. Partition ties within a round always go to the lowest index,
/// so results are reproducible for a deterministic oracle.
#[derive(Debug, Clone, Default)]
pub struct DeltaDebugMinimizer {
    config: SearchConfig,
}

impl DeltaDebugMinimizer {
    /// Create a minimizer with the given configuration.
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Create a minimizer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SearchConfig::default())
    }

    /// The active configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Name of the configured strategy for logging.
    pub fn name(&self) -> &str {
        self.config.strategy.as_str()
    }

    /// Minimize `changes` against `oracle`.
    ///
    /// # Errors
    ///
    /// * `EmptyInput` - `changes` is empty.
    /// * `InvalidGranularity` - the initial granularity is below 2 or exceeds `changes.len()`.
    /// * `InvalidConfig` - any other setting is unusable.
    /// * `NotInteresting` - initial verification is on and `changes` fails the oracle.
    /// * `MaxRoundsReached` - the configured round limit was hit.
    /// * `FinalVerificationFailed` - the result no longer satisfies the oracle.
    pub async fn minimize<T, O>(&self, changes: Vec<T>, oracle: Arc<O>) -> Result<Minimized<T>>
    where
        T: Clone + Send + Sync + 'static,
        O: Oracle<T> + ?Sized + 'static,
    {
        let start = Instant::now();
        let original_size = changes.len();
        if changes.is_empty() {
            return Err(MinimizerError::EmptyInput);
        }

        let mut stats = SearchStats::new();

        // A single change is already minimal; no granularity applies to it
        if original_size == 1 {
            debug!("Single change - nothing to partition");
            stats.duration = Some(start.elapsed());
            return Ok(Minimized::new(changes, original_size, stats));
        }

        let granularity = self.config.initial_granularity;
        if granularity < 2 || granularity > original_size {
            return Err(MinimizerError::InvalidGranularity {
                granularity,
                len: original_size,
            });
        }
        self.config.validate()?;

        let evaluator = ParallelEvaluator::new(
            oracle,
            self.config.max_concurrency,
            self.config.eager_cancellation,
        );

        info!(
            original_size,
            granularity,
            strategy = self.name(),
            max_concurrency = self.config.max_concurrency,
            "Starting delta debugging minimization"
        );

        if self.config.verify_initial && !evaluator.check(&changes).await {
            return Err(MinimizerError::NotInteresting);
        }

        let minimized = self
            .run(changes, granularity, &evaluator, &mut stats)
            .await?;

        if self.config.verify_final && !evaluator.check(&minimized).await {
            warn!("Final verification failed - minimized change set is no longer interesting");
            return Err(MinimizerError::FinalVerificationFailed);
        }

        let duration = start.elapsed();
        stats.oracle_calls = evaluator.oracle_calls();
        stats.skipped_evaluations = evaluator.skipped_evaluations();
        stats.duration = Some(duration);

        let result = Minimized::new(minimized, original_size, stats);
        info!(
            original_size,
            minimized_size = result.minimized_size(),
            reduction_percent = format!("{:.1}%", result.reduction_percentage()),
            rounds = result.stats.rounds,
            oracle_calls = result.stats.oracle_calls,
            duration = ?duration,
            "Minimization complete"
        );

        Ok(result)
    }

    /// Round loop. `current` is replaced wholesale on every reduction.
    async fn run<T, O>(
        &self,
        changes: Vec<T>,
        mut granularity: usize,
        evaluator: &ParallelEvaluator<T, O>,
        stats: &mut SearchStats,
    ) -> Result<Vec<T>>
    where
        T: Clone + Send + Sync + 'static,
        O: Oracle<T> + ?Sized + 'static,
    {
        let mut current: Arc<[T]> = changes.into();
        let mut state = SearchState::SearchSubset;
        stats.max_granularity = granularity;

        loop {
            state = match state {
                SearchState::SearchSubset | SearchState::SearchComplement
                    if current.len() < 2 =>
                {
                    SearchState::Done
                }
                SearchState::SearchSubset => {
                    self.begin_round(current.len(), granularity, stats)?;
                    let outcome = match self.config.strategy {
                        Strategy::Staged => {
                            evaluator.evaluate_subsets(&current, granularity).await?
                        }
                        Strategy::Combined => {
                            evaluator.evaluate_combined(&current, granularity).await?
                        }
                    };

                    match outcome {
                        RoundOutcome::NoHit if self.config.strategy == Strategy::Staged => {
                            SearchState::SearchComplement
                        }
                        RoundOutcome::NoHit => SearchState::GrowGranularity,
                        hit => {
                            Self::reduce(&mut current, &mut granularity, hit, stats)?;
                            SearchState::SearchSubset
                        }
                    }
                }
                SearchState::SearchComplement => {
                    // Second phase of the same staged round
                    trace!(
                        round = stats.rounds,
                        size = current.len(),
                        granularity,
                        "Searching complements"
                    );
                    match evaluator.evaluate_complements(&current, granularity).await? {
                        RoundOutcome::NoHit => SearchState::GrowGranularity,
                        hit => {
                            Self::reduce(&mut current, &mut granularity, hit, stats)?;
                            SearchState::SearchSubset
                        }
                    }
                }
                SearchState::GrowGranularity => {
                    match next_step(granularity, current.len(), RoundOutcome::NoHit) {
                        Transition::Refine {
                            granularity: refined,
                        } => {
                            debug!(
                                from = granularity,
                                to = refined,
                                size = current.len(),
                                "Increased granularity"
                            );
                            granularity = refined;
                            stats.record_granularity_increase(refined);
                            SearchState::SearchSubset
                        }
                        _ => SearchState::Done,
                    }
                }
                SearchState::Done => {
                    debug!(
                        final_size = current.len(),
                        granularity,
                        reason = termination_reason(current.len()),
                        "Minimization complete"
                    );
                    return Ok(current.to_vec());
                }
            };
        }
    }

    fn begin_round(
        &self,
        size: usize,
        granularity: usize,
        stats: &mut SearchStats,
    ) -> Result<()> {
        if let Some(max) = self.config.max_rounds {
            if stats.rounds >= max {
                return Err(MinimizerError::MaxRoundsReached(max));
            }
        }
        stats.record_round(granularity);
        trace!(
            round = stats.rounds,
            size,
            granularity,
            strategy = self.name(),
            "DDMIN round"
        );
        Ok(())
    }

    /// Apply a hit to the search state.
    fn reduce<T: Clone>(
        current: &mut Arc<[T]>,
        granularity: &mut usize,
        outcome: RoundOutcome,
        stats: &mut SearchStats,
    ) -> Result<()> {
        let old_size = current.len();
        let reduced = match next_step(*granularity, old_size, outcome) {
            Transition::ReduceToSubset {
                index,
                granularity: next,
            } => {
                let subset = subset_at(&current[..], index, *granularity)?;
                stats.record_subset_reduction();
                debug!(index, old_size, new_size = subset.len(), "Reduced to subset");
                *granularity = next;
                subset
            }
            Transition::ReduceToComplement {
                index,
                granularity: next,
            } => {
                let complement = complement_at(&current[..], index, *granularity)?;
                stats.record_complement_reduction();
                debug!(
                    index,
                    old_size,
                    new_size = complement.len(),
                    "Reduced to complement"
                );
                *granularity = next;
                complement
            }
            Transition::Refine { .. } | Transition::Terminal => return Ok(()),
        };

        *current = reduced.into();
        Ok(())
    }
}

/// Why the search stopped at `size` changes.
fn termination_reason(size: usize) -> &'static str {
    if size < 2 {
        "single change left"
    } else {
        "maximum granularity reached"
    }
}

/// Minimize `changes` with the default configuration and the given
/// strategy and initial granularity.
pub async fn ddmin<T, O>(
    changes: Vec<T>,
    granularity: usize,
    strategy: Strategy,
    oracle: Arc<O>,
) -> Result<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
    O: Oracle<T> + ?Sized + 'static,
{
    let config = SearchConfig::new()
        .with_strategy(strategy)
        .with_initial_granularity(granularity);
    let result = DeltaDebugMinimizer::new(config)
        .minimize(changes, oracle)
        .await?;
    Ok(result.changes)
}
