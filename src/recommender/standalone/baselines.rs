//! Non-personalized baselines

use super::{nonzero_except, vector_lookup};
use crate::graph::{EdgeOrientation, IndexedGraph};
use crate::recommender::filler::query_rng;
use crate::recommender::{QueryScores, Recommender};
use crate::similarity::ScoreFn;
use rand::Rng;

/// Candidates ranked by their in-degree
pub struct Popularity {
    popularity: Vec<f64>,
}

impl Popularity {
    pub fn new(graph: &IndexedGraph) -> Self {
        let popularity = graph
            .vertices()
            .map(|v| graph.degree(v, EdgeOrientation::In) as f64)
            .collect();
        Self { popularity }
    }
}

impl Recommender for Popularity {
    fn scores(&self, query: u32) -> Vec<(u32, f64)> {
        nonzero_except(&self.popularity, query)
    }

    fn score_fn(&self, _query: u32) -> ScoreFn<'_> {
        Box::new(move |v| self.popularity.get(v as usize).copied().unwrap_or(0.0))
    }
}

/// Uniform random scores, reproducible for a given seed and query
pub struct RandomScores {
    node_count: usize,
    seed: u64,
}

impl RandomScores {
    pub fn new(graph: &IndexedGraph, seed: u64) -> Self {
        Self {
            node_count: graph.node_count,
            seed,
        }
    }

    fn draw(&self, query: u32) -> Vec<f64> {
        let mut rng = query_rng(self.seed, query);
        (0..self.node_count).map(|_| rng.gen::<f64>()).collect()
    }
}

/// Every entry of `vector` but `query`
fn all_except(vector: &[f64], query: u32) -> Vec<(u32, f64)> {
    vector
        .iter()
        .enumerate()
        .filter(|&(v, _)| v as u32 != query)
        .map(|(v, &s)| (v as u32, s))
        .collect()
}

impl Recommender for RandomScores {
    fn scores(&self, query: u32) -> Vec<(u32, f64)> {
        all_except(&self.draw(query), query)
    }

    fn score_fn(&self, query: u32) -> ScoreFn<'_> {
        vector_lookup(self.draw(query))
    }

    fn query_scores(&self, query: u32) -> QueryScores<'_> {
        let draw = self.draw(query);
        QueryScores::new(all_except(&draw, query), Some(vector_lookup(draw)))
    }
}
