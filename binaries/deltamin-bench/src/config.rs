//! Harness configuration.
//!
//! Loaded from a TOML file when one is given, then overridden by CLI flags.

use std::path::Path;

use deltamin::SearchConfig;
use serde::{Deserialize, Serialize};

use crate::fixture::FixtureConfig;

/// Harness configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Minimizer settings.
    pub search: SearchConfig,

    /// Input and hidden set.
    pub fixture: FixtureConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log format (pretty, json, compact).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl BenchConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merges CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &super::CliArgs) {
        if let Some(strategy) = args.strategy {
            self.search.strategy = strategy;
        }
        if let Some(granularity) = args.granularity {
            self.search.initial_granularity = granularity;
        }
        if let Some(max) = args.max_concurrency {
            self.search.max_concurrency = max;
        }
        if args.eager_cancellation {
            self.search.eager_cancellation = true;
        }
        if let Some(kind) = args.fixture {
            self.fixture.kind = kind;
        }
        if let Some(size) = args.size {
            self.fixture.size = size;
        }
        if let Some(hidden_size) = args.hidden_size {
            self.fixture.hidden_size = hidden_size;
        }
        if let Some(density) = args.density {
            self.fixture.density = density;
        }
        if let Some(seed) = args.seed {
            self.fixture.seed = Some(seed);
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        if self.fixture.size == 0 {
            anyhow::bail!("Fixture size must be positive");
        }

        self.search.validate()?;
        Ok(())
    }
}
