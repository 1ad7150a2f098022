//! # deltamin
//!
//! Parallel delta debugging (ddmin) for shrinking a failure-inducing change
//! set to a small one that still reproduces the failure.
//!
//! The search splits the current change set into `n` contiguous blocks and
//! asks an [`Oracle`] about every block and every complement concurrently.
//! A hit shrinks the change set; a round without hits doubles `n` until each
//! block holds a single change.
//!
//! ## Strategies
//!
//! - **Staged**: all subsets in parallel, then all complements if no subset
//!   was interesting.
//! - **Combined**: subsets and complements in one parallel pass.
//!
//! Both apply the same granularity table and break ties within a round by
//! taking the lowest partition index, so a deterministic oracle always yields
//! the same result.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use deltamin::{DeltaDebugMinimizer, SearchConfig, Strategy, SupersetOracle};
//!
//! # async fn run() -> deltamin::Result<()> {
//! let changes: Vec<u32> = (0..1000).collect();
//! let oracle = Arc::new(SupersetOracle::new([19u32, 21, 26, 30]));
//!
//! let minimizer = DeltaDebugMinimizer::new(
//!     SearchConfig::new()
//!         .with_strategy(Strategy::Combined)
//!         .with_eager_cancellation(true),
//! );
//! let result = minimizer.minimize(changes, oracle).await?;
//!
//! assert_eq!(result.changes, vec![19, 21, 26, 30]);
//! println!("{}", result);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod granularity;
pub mod oracle;
pub mod partition;
pub mod result;
pub mod search;

// Re-export main types for convenient access
pub use config::{SearchConfig, Strategy};
pub use error::{MinimizerError, Result};
pub use evaluator::{ParallelEvaluator, Probe};
pub use granularity::{next_step, RoundOutcome, Transition};
pub use oracle::{FnOracle, Oracle, SupersetOracle};
pub use partition::{complement_at, subset_at, Partition};
pub use result::{Minimized, SearchStats};
pub use search::{ddmin, DeltaDebugMinimizer, SearchState};
