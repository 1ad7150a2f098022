//! Synthetic change-set generators.

use std::collections::BTreeSet;

use anyhow::{bail, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Generates synthetic hidden sets from a seeded RNG.
pub struct Generator {
    rng: ChaCha8Rng,
}

impl Generator {
    /// Create a generator; `None` seeds from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { rng }
    }

    /// `count` distinct integers from `[lo, hi)`, sorted ascending.
    pub fn by_size(&mut self, lo: u32, hi: u32, count: usize) -> Result<Vec<u32>> {
        if lo >= hi {
            bail!("empty range [{lo}, {hi})");
        }
        let span = (hi - lo) as usize;
        if count > span {
            bail!("cannot draw {count} distinct values from [{lo}, {hi})");
        }

        let picked: BTreeSet<u32> = if count * 2 > span {
            // Dense draws: sampling without replacement avoids long rejection runs
            rand::seq::index::sample(&mut self.rng, span, count)
                .into_iter()
                .map(|i| lo + i as u32)
                .collect()
        } else {
            let mut picked = BTreeSet::new();
            while picked.len() < count {
                picked.insert(self.rng.gen_range(lo..hi));
            }
            picked
        };
        Ok(picked.into_iter().collect())
    }

    /// Each integer in `[0, n)` independently with probability `p`.
    pub fn by_density(&mut self, n: u32, p: f64) -> Result<Vec<u32>> {
        if !(0.0..=1.0).contains(&p) {
            bail!("density must be within [0, 1], got {p}");
        }
        Ok((0..n).filter(|_| self.rng.gen_bool(p)).collect())
    }
}
