//! Implicit-feedback matrix factorization (Hu, Koren and Volinsky ALS)
//!
//! Users are edge sources, items edge targets. An edge of weight `w` is an observed
//! preference with confidence `1 + alpha * w`.

use crate::graph::{EdgeOrientation, IndexedGraph};
use crate::recommender::{QueryScores, Recommender};
use crate::similarity::ScoreFn;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::Instant;

/// Trained factors, one row per vertex on each side
pub struct ImplicitMf {
    users: Array2<f64>,
    items: Array2<f64>,
}

impl ImplicitMf {
    pub fn train(
        graph: &IndexedGraph,
        factors: usize,
        lambda: f64,
        alpha: f64,
        iterations: usize,
        seed: u64,
    ) -> Self {
        let start = Instant::now();
        let n = graph.node_count;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut users = Array2::zeros((n, factors));
        let mut items = Array2::from_shape_fn((n, factors), |_| rng.gen::<f64>() * 0.1);

        for _ in 0..iterations {
            users = als_step(graph, EdgeOrientation::Out, items.view(), lambda, alpha);
            items = als_step(graph, EdgeOrientation::In, users.view(), lambda, alpha);
        }

        log::debug!(
            "Trained {} factors for {} vertices in {:?}",
            factors,
            n,
            start.elapsed()
        );
        Self { users, items }
    }

    pub fn factors(&self) -> usize {
        self.users.ncols()
    }

    fn predict(&self, query: u32) -> Array1<f64> {
        self.items.dot(&self.users.row(query as usize))
    }
}

/// Solves every row of one side with the other side fixed
fn als_step(
    graph: &IndexedGraph,
    orientation: EdgeOrientation,
    fixed: ArrayView2<'_, f64>,
    lambda: f64,
    alpha: f64,
) -> Array2<f64> {
    let k = fixed.ncols();
    let gram = fixed.t().dot(&fixed);

    let rows: Vec<Array1<f64>> = graph
        .vertices()
        .into_par_iter()
        .map(|v| {
            let mut lhs = gram.clone();
            let mut rhs = Array1::zeros(k);
            for (other, weight) in graph.neighbors(v, orientation) {
                let y = fixed.row(other as usize);
                let confidence = 1.0 + alpha * weight;
                for i in 0..k {
                    rhs[i] += confidence * y[i];
                    for j in 0..k {
                        lhs[[i, j]] += (confidence - 1.0) * y[i] * y[j];
                    }
                }
            }
            for i in 0..k {
                lhs[[i, i]] += lambda;
            }
            cholesky_solve(lhs, rhs).unwrap_or_else(|| Array1::zeros(k))
        })
        .collect();

    let mut factors = Array2::zeros((graph.node_count, k));
    for (mut target, row) in factors.axis_iter_mut(Axis(0)).zip(rows) {
        target.assign(&row);
    }
    factors
}

/// Solves `a x = b` for a symmetric positive-definite `a`; `None` if `a` is not
fn cholesky_solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    // lower triangle of `a` becomes L with a = L Lᵀ
    for j in 0..n {
        let mut diag = a[[j, j]];
        for p in 0..j {
            diag -= a[[j, p]] * a[[j, p]];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return None;
        }
        let diag = diag.sqrt();
        a[[j, j]] = diag;
        for i in (j + 1)..n {
            let mut value = a[[i, j]];
            for p in 0..j {
                value -= a[[i, p]] * a[[j, p]];
            }
            a[[i, j]] = value / diag;
        }
    }

    for i in 0..n {
        for p in 0..i {
            b[i] -= a[[i, p]] * b[p];
        }
        b[i] /= a[[i, i]];
    }
    for i in (0..n).rev() {
        for p in (i + 1)..n {
            b[i] -= a[[p, i]] * b[p];
        }
        b[i] /= a[[i, i]];
    }
    Some(b)
}

impl Recommender for ImplicitMf {
    fn scores(&self, query: u32) -> Vec<(u32, f64)> {
        self.predict(query)
            .iter()
            .enumerate()
            .filter(|&(v, _)| v as u32 != query)
            .map(|(v, &s)| (v as u32, s))
            .collect()
    }

    fn score_fn(&self, query: u32) -> ScoreFn<'_> {
        super::vector_lookup(self.predict(query).to_vec())
    }

    fn query_scores(&self, query: u32) -> QueryScores<'_> {
        let predicted = self.predict(query).to_vec();
        let natural = predicted
            .iter()
            .enumerate()
            .filter(|&(v, _)| v as u32 != query)
            .map(|(v, &s)| (v as u32, s))
            .collect();
        QueryScores::new(natural, Some(super::vector_lookup(predicted)))
    }
}
