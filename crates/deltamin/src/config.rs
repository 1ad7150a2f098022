//! Search configuration.

use serde::{Deserialize, Serialize};

use crate::error::{MinimizerError, Result};

/// How subsets and complements are scheduled within a round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// All subsets in parallel; complements only when no subset hits.
    #[default]
    Staged,
    /// Subsets and complements together in one parallel pass.
    Combined,
}

impl Strategy {
    /// Short name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Staged => "staged",
            Strategy::Combined => "combined",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = MinimizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "staged" => Ok(Strategy::Staged),
            "combined" => Ok(Strategy::Combined),
            other => Err(MinimizerError::InvalidConfig(format!(
                "unknown strategy: {other}"
            ))),
        }
    }
}

/// Configuration for a delta debugging search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Evaluation strategy.
    pub strategy: Strategy,

    /// Number of blocks for the first round.
    pub initial_granularity: usize,

    /// Maximum number of oracle evaluations in flight.
    pub max_concurrency: usize,

    /// Skip evaluations once a lower-indexed probe in the same round has hit.
    pub eager_cancellation: bool,

    /// Fail with `MaxRoundsReached` after this many rounds.
    pub max_rounds: Option<usize>,

    /// Check that the input is interesting before searching.
    pub verify_initial: bool,

    /// Check that the result is still interesting.
    pub verify_final: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Staged,
            initial_granularity: 2,
            max_concurrency: default_concurrency(),
            eager_cancellation: false,
            max_rounds: None,
            verify_initial: true,
            verify_final: true,
        }
    }
}

impl SearchConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the evaluation strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the initial granularity.
    pub fn with_initial_granularity(mut self, granularity: usize) -> Self {
        self.initial_granularity = granularity;
        self
    }

    /// Set the concurrency limit.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Enable or disable eager cancellation.
    pub fn with_eager_cancellation(mut self, enabled: bool) -> Self {
        self.eager_cancellation = enabled;
        self
    }

    /// Set the round limit.
    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = Some(max);
        self
    }

    /// Enable or disable initial verification.
    pub fn with_verify_initial(mut self, verify: bool) -> Self {
        self.verify_initial = verify;
        self
    }

    /// Enable or disable final verification.
    pub fn with_verify_final(mut self, verify: bool) -> Self {
        self.verify_final = verify;
        self
    }

    /// Reject settings the search cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.initial_granularity < 2 {
            return Err(MinimizerError::InvalidConfig(format!(
                "initial_granularity must be at least 2, got {}",
                self.initial_granularity
            )));
        }
        if self.max_concurrency == 0 {
            return Err(MinimizerError::InvalidConfig(
                "max_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
        .max(2)
}
