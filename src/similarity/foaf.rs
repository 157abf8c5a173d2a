//! Friends-of-friends similarities: common neighbors, Jaccard, Adamic-Adar, cosine

use crate::graph::{EdgeOrientation, IndexedGraph};
use crate::similarity::{finite_or_zero, ScoreFn, Similarity};
use std::collections::HashMap;

/// How shared neighbors are aggregated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FoafMetric {
    MostCommonNeighbors,
    Jaccard,
    /// Shared neighbors dampened by their degree under the given orientation
    AdamicAdar { w_sel: EdgeOrientation },
    Cosine,
}

/// Similarity over the intersection `N(u, u_sel) ∩ N(v, v_sel)`
pub struct FoafSimilarity<'g> {
    graph: &'g IndexedGraph,
    metric: FoafMetric,
    u_sel: EdgeOrientation,
    v_sel: EdgeOrientation,
    /// Per-vertex neighborhood size (Jaccard) or squared norm (cosine), query side
    u_sizes: Vec<f64>,
    /// Same, candidate side
    v_sizes: Vec<f64>,
    /// Adamic-Adar contribution of each intermediate vertex
    damping: Vec<f64>,
}

impl<'g> FoafSimilarity<'g> {
    pub fn new(
        graph: &'g IndexedGraph,
        metric: FoafMetric,
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
    ) -> Self {
        let size_of = |sel: EdgeOrientation| -> Vec<f64> {
            match metric {
                FoafMetric::Jaccard => graph.vertices().map(|x| graph.degree(x, sel) as f64).collect(),
                FoafMetric::Cosine => graph
                    .vertices()
                    .map(|x| graph.neighbors(x, sel).map(|(_, w)| w * w).sum())
                    .collect(),
                _ => Vec::new(),
            }
        };
        let u_sizes = size_of(u_sel);
        let v_sizes = if u_sel == v_sel || !graph.is_directed() {
            u_sizes.clone()
        } else {
            size_of(v_sel)
        };

        let damping = match metric {
            FoafMetric::AdamicAdar { w_sel } => graph
                .vertices()
                .map(|w| match graph.degree(w, w_sel) {
                    0 => 0.0,
                    d => 1.0 / (1.0 + d as f64).ln(),
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            graph,
            metric,
            u_sel,
            v_sel,
            u_sizes,
            v_sizes,
            damping,
        }
    }

    fn contribution(&self, w: u32, weight_u: f64, weight_v: f64) -> f64 {
        match self.metric {
            FoafMetric::MostCommonNeighbors | FoafMetric::Jaccard => 1.0,
            FoafMetric::AdamicAdar { .. } => self.damping[w as usize],
            FoafMetric::Cosine => weight_u * weight_v,
        }
    }

    fn finish(&self, u: u32, v: u32, acc: f64) -> f64 {
        match self.metric {
            FoafMetric::MostCommonNeighbors | FoafMetric::AdamicAdar { .. } => acc,
            FoafMetric::Jaccard => {
                let union = self.u_sizes[u as usize] + self.v_sizes[v as usize] - acc;
                if union > 0.0 {
                    acc / union
                } else {
                    0.0
                }
            }
            FoafMetric::Cosine => {
                finite_or_zero(acc / (self.u_sizes[u as usize] * self.v_sizes[v as usize]).sqrt())
            }
        }
    }
}

impl Similarity for FoafSimilarity<'_> {
    fn similarity(&self, query: u32) -> ScoreFn<'_> {
        let query_side: HashMap<u32, f64> = self.graph.neighbors(query, self.u_sel).collect();

        Box::new(move |candidate| {
            let acc: f64 = self
                .graph
                .neighbors(candidate, self.v_sel)
                .filter_map(|(w, weight_v)| {
                    query_side
                        .get(&w)
                        .map(|&weight_u| self.contribution(w, weight_u, weight_v))
                })
                .sum();
            self.finish(query, candidate, acc)
        })
    }

    fn similar_elements(&self, query: u32) -> Vec<(u32, f64)> {
        let mut acc: HashMap<u32, f64> = HashMap::new();
        let reverse = self.v_sel.invert();

        for (w, weight_u) in self.graph.neighbors(query, self.u_sel) {
            for (v, weight_v) in self.graph.neighbors(w, reverse) {
                if v != query {
                    *acc.entry(v).or_insert(0.0) += self.contribution(w, weight_u, weight_v);
                }
            }
        }

        acc.into_iter()
            .map(|(v, sum)| (v, self.finish(query, v, sum)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::fixtures::{follow_graph, undirected_graph};
    use EdgeOrientation::{In, Out, Und};

    fn idx(g: &IndexedGraph, label: u64) -> u32 {
        g.index_of(label).unwrap()
    }

    #[test]
    fn common_neighbors_counts_shared_followees() {
        let g = follow_graph();
        // N(1, OUT) = {2, 3}; N(2, OUT) = {3, 4}; shared = {3}
        let sim = FoafSimilarity::new(&g, FoafMetric::MostCommonNeighbors, Out, Out);
        let score = sim.similarity(idx(&g, 1));
        assert_eq!(score(idx(&g, 2)), 1.0);
        assert_eq!(score(idx(&g, 4)), 0.0);
    }

    #[test]
    fn sparse_and_dense_agree() {
        let g = follow_graph();
        let metrics = [
            FoafMetric::MostCommonNeighbors,
            FoafMetric::Jaccard,
            FoafMetric::AdamicAdar { w_sel: In },
            FoafMetric::Cosine,
        ];
        for metric in metrics {
            for (u_sel, v_sel) in [(Out, In), (Out, Out), (In, Und), (Und, Und)] {
                let sim = FoafSimilarity::new(&g, metric, u_sel, v_sel);
                for u in g.vertices() {
                    let dense = sim.similarity(u);
                    for (v, s) in sim.similar_elements(u) {
                        assert_ne!(v, u);
                        assert!((dense(v) - s).abs() < 1e-12, "{metric:?} {u_sel} {v_sel} {u}->{v}");
                    }
                }
            }
        }
    }

    #[test]
    fn jaccard_is_shared_over_union() {
        // N(1) = {2, 3}, N(4) = {2, 3, 5}
        let g = undirected_graph();
        let sim = FoafSimilarity::new(&g, FoafMetric::Jaccard, Und, Und);
        assert_eq!(sim.similarity(idx(&g, 1))(idx(&g, 4)), 2.0 / 3.0);
        // 2 and 3: N(2) = {1, 3, 4}, N(3) = {1, 2, 4}; shared {1, 4}, union of 4
        assert_eq!(sim.similarity(idx(&g, 2))(idx(&g, 3)), 0.5);
        // isolated neighborhoods score 0 instead of dividing by zero
        assert_eq!(sim.similarity(idx(&g, 1))(idx(&g, 6)), 0.0);
    }

    #[test]
    fn adamic_adar_needs_a_common_neighbor() {
        let g = undirected_graph();
        let sim = FoafSimilarity::new(&g, FoafMetric::AdamicAdar { w_sel: Und }, Und, Und);
        let score = sim.similarity(idx(&g, 1));
        assert_eq!(score(idx(&g, 6)), 0.0);
        // shared {2, 3}, both of degree 3
        let expected = 2.0 / 4f64.ln();
        assert!((score(idx(&g, 4)) - expected).abs() < 1e-12);
    }

    #[test]
    fn cosine_is_bounded() {
        let g = undirected_graph();
        let sim = FoafSimilarity::new(&g, FoafMetric::Cosine, Und, Und);
        for u in g.vertices() {
            for (_, s) in sim.similar_elements(u) {
                assert!(s > 0.0 && s <= 1.0 + 1e-12);
            }
        }
    }
}
