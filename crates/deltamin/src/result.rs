//! Result types for a completed search.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The output of a successful minimization.
#[derive(Debug, Clone)]
pub struct Minimized<T> {
    /// The minimized change set, a subsequence of the input.
    pub changes: Vec<T>,

    /// Minimized size divided by original size (0.0 to 1.0).
    pub reduction_ratio: f64,

    /// Statistics about the search.
    pub stats: SearchStats,
}

impl<T> Minimized<T> {
    /// Wrap a minimized change set.
    pub fn new(changes: Vec<T>, original_size: usize, mut stats: SearchStats) -> Self {
        let minimized_size = changes.len();
        let reduction_ratio = if original_size > 0 {
            minimized_size as f64 / original_size as f64
        } else {
            1.0
        };

        stats.original_size = original_size;
        stats.minimized_size = minimized_size;

        Self {
            changes,
            reduction_ratio,
            stats,
        }
    }

    /// Size of the input.
    pub fn original_size(&self) -> usize {
        self.stats.original_size
    }

    /// Size of the minimized change set.
    pub fn minimized_size(&self) -> usize {
        self.stats.minimized_size
    }

    /// Percentage of changes removed.
    pub fn reduction_percentage(&self) -> f64 {
        (1.0 - self.reduction_ratio) * 100.0
    }
}

impl<T> fmt::Display for Minimized<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Minimized {{ {} -> {} changes ({:.1}% reduction), {} rounds",
            self.stats.original_size,
            self.stats.minimized_size,
            self.reduction_percentage(),
            self.stats.rounds
        )?;
        if let Some(duration) = self.stats.duration {
            write!(f, ", {:?}", duration)?;
        }
        write!(f, " }}")
    }
}

/// Counters collected while searching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Size of the input.
    pub original_size: usize,

    /// Size of the result.
    pub minimized_size: usize,

    /// Evaluation rounds run.
    pub rounds: usize,

    /// Oracle invocations, including initial and final verification.
    pub oracle_calls: usize,

    /// Evaluations skipped by eager cancellation.
    pub skipped_evaluations: usize,

    /// Rounds that reduced to a single block.
    pub subset_reductions: usize,

    /// Rounds that removed a single block.
    pub complement_reductions: usize,

    /// Rounds that only increased granularity.
    pub granularity_increases: usize,

    /// Highest granularity used.
    pub max_granularity: usize,

    /// Wall-clock time of the search.
    #[serde(skip)]
    pub duration: Option<Duration>,
}

impl SearchStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a round evaluated at `granularity`.
    pub fn record_round(&mut self, granularity: usize) {
        self.rounds += 1;
        self.max_granularity = self.max_granularity.max(granularity);
    }

    /// Record a reduction to a subset.
    pub fn record_subset_reduction(&mut self) {
        self.subset_reductions += 1;
    }

    /// Record a reduction to a complement.
    pub fn record_complement_reduction(&mut self) {
        self.complement_reductions += 1;
    }

    /// Record a granularity increase.
    pub fn record_granularity_increase(&mut self, new_granularity: usize) {
        self.granularity_increases += 1;
        self.max_granularity = self.max_granularity.max(new_granularity);
    }

    /// Total rounds that shrank the change set.
    pub fn reductions(&self) -> usize {
        self.subset_reductions + self.complement_reductions
    }
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ {} -> {} changes, {} rounds, {} reductions, {} oracle calls",
            self.original_size,
            self.minimized_size,
            self.rounds,
            self.reductions(),
            self.oracle_calls
        )?;
        if self.skipped_evaluations > 0 {
            write!(f, ", {} skipped", self.skipped_evaluations)?;
        }
        write!(f, " }}")
    }
}
