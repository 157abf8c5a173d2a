//! Random-walk recommenders: personalized PageRank and Money (personalized SALSA)

use super::{nonzero_except, vector_lookup};
use crate::graph::{EdgeOrientation, IndexedGraph};
use crate::recommender::{QueryScores, Recommender};
use crate::similarity::ScoreFn;
use serde::{Deserialize, Serialize};
use std::fmt;

const PAGERANK_TOLERANCE: f64 = 1e-6;
const PAGERANK_MAX_ITERATIONS: usize = 100;
const MONEY_THRESHOLD: f64 = 0.01;
const MONEY_MAX_ROUNDS: usize = 1000;

/// Random walk along out-links that teleports back to the query vertex
pub struct PersonalizedPageRank<'g> {
    graph: &'g IndexedGraph,
    teleport: f64,
    /// Outgoing weight of each vertex
    out_strength: Vec<f64>,
}

impl<'g> PersonalizedPageRank<'g> {
    pub fn new(graph: &'g IndexedGraph, teleport: f64) -> Self {
        let out_strength = graph
            .vertices()
            .map(|v| graph.strength(v, EdgeOrientation::Out))
            .collect();
        Self {
            graph,
            teleport,
            out_strength,
        }
    }

    /// Stationary distribution of the walk restarted at `query`
    pub fn propagate(&self, query: u32) -> Vec<f64> {
        let n = self.graph.node_count;
        let mut scores = vec![0.0; n];
        let mut next = vec![0.0; n];
        scores[query as usize] = 1.0;

        for iteration in 0..PAGERANK_MAX_ITERATIONS {
            next.fill(0.0);
            let mut dangling = 0.0;
            for a in self.graph.vertices() {
                let mass = scores[a as usize];
                if mass == 0.0 {
                    continue;
                }
                let strength = self.out_strength[a as usize];
                if strength > 0.0 {
                    let share = (1.0 - self.teleport) * mass / strength;
                    for (b, weight) in self.graph.neighbors(a, EdgeOrientation::Out) {
                        next[b as usize] += share * weight;
                    }
                } else {
                    dangling += (1.0 - self.teleport) * mass;
                }
            }
            next[query as usize] += self.teleport + dangling;

            let diff: f64 = scores.iter().zip(&next).map(|(old, new)| (old - new).abs()).sum();
            std::mem::swap(&mut scores, &mut next);
            if diff < PAGERANK_TOLERANCE {
                log::trace!("PageRank for {} converged after {} iterations", query, iteration + 1);
                break;
            }
        }
        scores
    }
}

impl Recommender for PersonalizedPageRank<'_> {
    fn scores(&self, query: u32) -> Vec<(u32, f64)> {
        nonzero_except(&self.propagate(query), query)
    }

    fn score_fn(&self, query: u32) -> ScoreFn<'_> {
        vector_lookup(self.propagate(query))
    }

    fn query_scores(&self, query: u32) -> QueryScores<'_> {
        QueryScores::from_vector(self.propagate(query), query)
    }
}

/// Which side of the SALSA bipartite graph supplies the scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoneyMode {
    Auth,
    Hubs,
}

impl fmt::Display for MoneyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyMode::Auth => f.write_str("auth"),
            MoneyMode::Hubs => f.write_str("hubs"),
        }
    }
}

/// Personalized SALSA over the hub/authority split of the graph
///
/// Hubs are vertices with out-links, authorities vertices with in-links.
pub struct Money<'g> {
    graph: &'g IndexedGraph,
    mode: MoneyMode,
    alpha: f64,
    out_degree: Vec<f64>,
    in_degree: Vec<f64>,
    authority_count: usize,
}

impl<'g> Money<'g> {
    pub fn new(graph: &'g IndexedGraph, mode: MoneyMode, alpha: f64) -> Self {
        let out_degree: Vec<f64> = graph
            .vertices()
            .map(|v| graph.degree(v, EdgeOrientation::Out) as f64)
            .collect();
        let in_degree: Vec<f64> = graph
            .vertices()
            .map(|v| graph.degree(v, EdgeOrientation::In) as f64)
            .collect();
        let authority_count = in_degree.iter().filter(|&&d| d > 0.0).count();
        Self {
            graph,
            mode,
            alpha,
            out_degree,
            in_degree,
            authority_count,
        }
    }

    /// Hub and authority masses personalized on `query`
    pub fn propagate(&self, query: u32) -> (Vec<f64>, Vec<f64>) {
        let n = self.graph.node_count;
        let is_hub = |v: u32| self.out_degree[v as usize] > 0.0;

        let mut hubs = vec![0.0; n];
        if is_hub(query) {
            hubs[query as usize] = 1.0;
        }
        let uniform = if self.authority_count > 0 {
            1.0 / self.authority_count as f64
        } else {
            0.0
        };
        let mut auths: Vec<f64> = self
            .in_degree
            .iter()
            .map(|&d| if d > 0.0 { uniform } else { 0.0 })
            .collect();

        for round in 0..MONEY_MAX_ROUNDS {
            let mut diff = 0.0;
            for b in self.graph.vertices() {
                if self.in_degree[b as usize] == 0.0 {
                    continue;
                }
                let score: f64 = self
                    .graph
                    .neighbors(b, EdgeOrientation::In)
                    .map(|(a, _)| hubs[a as usize] / self.out_degree[a as usize])
                    .sum();
                diff += (auths[b as usize] - score).abs();
                auths[b as usize] = score;
            }
            for a in self.graph.vertices() {
                if !is_hub(a) {
                    continue;
                }
                let mut score = (1.0 - self.alpha)
                    * self
                        .graph
                        .neighbors(a, EdgeOrientation::Out)
                        .map(|(b, _)| auths[b as usize] / self.in_degree[b as usize])
                        .sum::<f64>();
                if a == query {
                    score += self.alpha;
                }
                diff += (hubs[a as usize] - score).abs();
                hubs[a as usize] = score;
            }

            if diff <= MONEY_THRESHOLD {
                log::trace!("Money for {} converged after {} rounds", query, round + 1);
                break;
            }
        }
        (hubs, auths)
    }

    fn exposed(&self, query: u32) -> Vec<f64> {
        let (hubs, auths) = self.propagate(query);
        match self.mode {
            MoneyMode::Auth => auths,
            MoneyMode::Hubs => hubs,
        }
    }
}

impl Recommender for Money<'_> {
    fn scores(&self, query: u32) -> Vec<(u32, f64)> {
        nonzero_except(&self.exposed(query), query)
    }

    fn score_fn(&self, query: u32) -> ScoreFn<'_> {
        vector_lookup(self.exposed(query))
    }

    fn query_scores(&self, query: u32) -> QueryScores<'_> {
        QueryScores::from_vector(self.exposed(query), query)
    }
}
