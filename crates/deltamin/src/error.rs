//! Error types for the minimizer.

use thiserror::Error;

/// Errors that can occur during delta debugging.
///
/// Granularity and index errors are caller bugs: the search never recovers
/// from them and never computes a partial partition when they occur.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MinimizerError {
    /// The change set is empty and cannot be minimized.
    #[error("Cannot minimize an empty change set")]
    EmptyInput,

    /// The requested granularity does not fit the collection.
    #[error("Invalid granularity {granularity} for a collection of {len} changes")]
    InvalidGranularity {
        /// Requested number of blocks.
        granularity: usize,
        /// Size of the collection being partitioned.
        len: usize,
    },

    /// A block index outside `[0, granularity)` was requested.
    #[error("Partition index {index} out of range for granularity {granularity}")]
    PartitionOutOfRange {
        /// Requested block index.
        index: usize,
        /// Number of blocks.
        granularity: usize,
    },

    /// The initial change set is not interesting (nothing to minimize).
    #[error("Change set is not interesting - nothing to minimize")]
    NotInteresting,

    /// The minimized change set no longer satisfies the oracle.
    #[error("Minimized change set is no longer interesting")]
    FinalVerificationFailed,

    /// Round limit reached without convergence.
    #[error("Maximum rounds ({0}) reached without convergence")]
    MaxRoundsReached(usize),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An evaluation task panicked or was aborted.
    #[error("Evaluation task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for minimizer operations.
pub type Result<T> = std::result::Result<T, MinimizerError>;
