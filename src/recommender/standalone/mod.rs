//! Recommenders that score candidates directly from the graph

pub mod baselines;
pub mod mf;
pub mod randomwalk;

pub use baselines::{Popularity, RandomScores};
pub use mf::ImplicitMf;
pub use randomwalk::{Money, MoneyMode, PersonalizedPageRank};

use crate::similarity::ScoreFn;

/// Dense score vector as a lookup, zero outside the vector
pub(crate) fn vector_lookup<'a>(scores: Vec<f64>) -> ScoreFn<'a> {
    Box::new(move |v| scores.get(v as usize).copied().unwrap_or(0.0))
}

/// Non-zero entries of a dense score vector, skipping `query`
pub(crate) fn nonzero_except(scores: &[f64], query: u32) -> Vec<(u32, f64)> {
    scores
        .iter()
        .enumerate()
        .filter(|&(v, &s)| v as u32 != query && s != 0.0)
        .map(|(v, &s)| (v as u32, s))
        .collect()
}
