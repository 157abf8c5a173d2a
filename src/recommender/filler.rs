//! Padding of short rankings with random candidates

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;

/// Seeded per-query generator, stable across runs and thread schedules
pub(crate) fn query_rng(seed: u64, query: u32) -> StdRng {
    StdRng::seed_from_u64(seed ^ (query as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Appends missing candidates to a ranking in random order
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomFiller {
    seed: u64,
}

impl RandomFiller {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Pads `ranking` up to `size` entries drawn from `pool`
    ///
    /// Candidates already ranked are skipped; padded candidates are scored with `score`.
    pub fn fill(
        &self,
        query: u32,
        mut ranking: Vec<(u32, f64)>,
        pool: impl IntoIterator<Item = u32>,
        size: usize,
        score: &dyn Fn(u32) -> f64,
    ) -> Vec<(u32, f64)> {
        if ranking.len() >= size {
            return ranking;
        }

        let ranked: HashSet<u32> = ranking.iter().map(|&(v, _)| v).collect();
        let mut missing: Vec<u32> = pool.into_iter().filter(|v| !ranked.contains(v)).collect();
        missing.sort_unstable();
        missing.shuffle(&mut query_rng(self.seed, query));

        let room = size - ranking.len();
        ranking.extend(missing.into_iter().take(room).map(|v| (v, score(v))));
        ranking
    }
}
