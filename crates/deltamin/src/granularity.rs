//! Granularity control: maps a round outcome to the next search step.

use serde::{Deserialize, Serialize};

/// What a round of evaluation found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    /// Block `i` alone is interesting.
    SubsetHit(usize),
    /// The collection without block `i` is interesting.
    ComplementHit(usize),
    /// No subset or complement was interesting.
    NoHit,
}

/// The step the driver applies after a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Replace the collection with block `index`, continue at `granularity`.
    ReduceToSubset { index: usize, granularity: usize },
    /// Replace the collection with complement `index`, continue at `granularity`.
    ReduceToComplement { index: usize, granularity: usize },
    /// Keep the collection, split it finer.
    Refine { granularity: usize },
    /// Maximum granularity reached without a reduction.
    Terminal,
}

/// Next step for a collection of `len` changes searched at `granularity`.
///
/// The same table drives both the staged and the combined search.
pub fn next_step(granularity: usize, len: usize, outcome: RoundOutcome) -> Transition {
    match outcome {
        RoundOutcome::SubsetHit(index) => Transition::ReduceToSubset {
            index,
            granularity: 2,
        },
        RoundOutcome::ComplementHit(index) => Transition::ReduceToComplement {
            index,
            granularity: granularity.saturating_sub(1).max(2),
        },
        RoundOutcome::NoHit if granularity < len => Transition::Refine {
            granularity: (2 * granularity).min(len),
        },
        RoundOutcome::NoHit => Transition::Terminal,
    }
}
