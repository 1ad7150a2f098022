//! Hidden failure sets for the harness.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::generate::Generator;

/// A fixed 1-minimal failing set over `0..1000`.
pub const REFERENCE_SET: [u32; 95] = [
    19, 21, 26, 30, 65, 71, 76, 91, 107, 123, 146, 153, 159, 162, 181, 197, 198, 224, 238, 262,
    270, 277, 283, 302, 309, 326, 347, 354, 357, 363, 364, 369, 386, 392, 399, 405, 406, 421,
    424, 440, 441, 487, 489, 497, 501, 507, 516, 536, 537, 548, 573, 575, 580, 585, 592, 593,
    597, 603, 606, 631, 633, 634, 637, 683, 689, 709, 713, 727, 734, 736, 749, 750, 756, 771,
    773, 775, 776, 792, 796, 810, 857, 865, 874, 880, 889, 898, 918, 919, 923, 924, 926, 940,
    964, 976, 981,
];

/// Where the hidden failing set comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixtureKind {
    /// The built-in reference set.
    #[default]
    Reference,
    /// `hidden_size` distinct changes drawn uniformly.
    RandomSize,
    /// Every change kept independently with probability `density`.
    RandomDensity,
}

impl std::str::FromStr for FixtureKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reference" => Ok(FixtureKind::Reference),
            "random-size" => Ok(FixtureKind::RandomSize),
            "random-density" => Ok(FixtureKind::RandomDensity),
            other => bail!("unknown fixture: {other}"),
        }
    }
}

/// Fixture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Fixture kind.
    pub kind: FixtureKind,

    /// Number of changes in the input (`0..size`).
    pub size: u32,

    /// Hidden set size for `random-size`.
    pub hidden_size: usize,

    /// Keep probability for `random-density`.
    pub density: f64,

    /// RNG seed; unset draws from entropy.
    pub seed: Option<u64>,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            kind: FixtureKind::Reference,
            size: 1000,
            hidden_size: 97,
            density: 0.1,
            seed: None,
        }
    }
}

impl FixtureConfig {
    /// The input change set `0..size`.
    pub fn changes(&self) -> Vec<u32> {
        (0..self.size).collect()
    }

    /// Build the hidden failing set.
    pub fn hidden_set(&self) -> Result<Vec<u32>> {
        let mut generator = Generator::new(self.seed);
        let hidden = match self.kind {
            FixtureKind::Reference => {
                if let Some(max) = REFERENCE_SET.iter().max() {
                    if *max >= self.size {
                        bail!("reference fixture needs size > {max}, got {}", self.size);
                    }
                }
                REFERENCE_SET.to_vec()
            }
            FixtureKind::RandomSize => generator.by_size(0, self.size, self.hidden_size)?,
            FixtureKind::RandomDensity => generator.by_density(self.size, self.density)?,
        };
        if hidden.is_empty() {
            bail!("hidden set is empty - every candidate would be interesting");
        }
        Ok(hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_set_is_sorted_and_in_range() {
        assert!(REFERENCE_SET.windows(2).all(|w| w[0] < w[1]));
        assert!(REFERENCE_SET.iter().all(|v| *v < 1000));
    }

    #[test]
    fn test_hidden_set_kinds() {
        let config = FixtureConfig::default();
        assert_eq!(config.hidden_set().unwrap(), REFERENCE_SET.to_vec());

        let config = FixtureConfig {
            kind: FixtureKind::RandomSize,
            seed: Some(5),
            ..Default::default()
        };
        assert_eq!(config.hidden_set().unwrap().len(), 97);

        let config = FixtureConfig {
            kind: FixtureKind::Reference,
            size: 100,
            ..Default::default()
        };
        assert!(config.hidden_set().is_err());

        let config = FixtureConfig {
            kind: FixtureKind::RandomDensity,
            density: 0.0,
            ..Default::default()
        };
        assert!(config.hidden_set().is_err());
    }

    #[test]
    fn test_fixture_kind_parsing() {
        assert_eq!("random-size".parse::<FixtureKind>().unwrap(), FixtureKind::RandomSize);
        assert!("other".parse::<FixtureKind>().is_err());
    }
}
