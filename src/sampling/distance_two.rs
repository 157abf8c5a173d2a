//! Friends-of-friends candidate sampling

use super::IndividualSampler;
use crate::graph::{EdgeOrientation, IndexedGraph};
use crate::recommender::filler::query_rng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;

/// Every vertex two steps away from the query
pub struct DistanceTwoSampler<'g> {
    graph: &'g IndexedGraph,
    u_sel: EdgeOrientation,
    v_sel: EdgeOrientation,
}

impl<'g> DistanceTwoSampler<'g> {
    pub fn new(graph: &'g IndexedGraph, u_sel: EdgeOrientation, v_sel: EdgeOrientation) -> Self {
        Self { graph, u_sel, v_sel }
    }
}

impl IndividualSampler for DistanceTwoSampler<'_> {
    fn sample(&self, query: u32, filter: &dyn Fn(u32) -> bool) -> BTreeSet<u32> {
        let reverse = self.v_sel.invert();
        self.graph
            .neighbors(query, self.u_sel)
            .flat_map(|(w, _)| self.graph.neighbors(w, reverse).ids())
            .filter(|&v| v != query && filter(v))
            .collect()
    }
}

/// Distance-two candidates balanced between future links and non-links
///
/// Keeps every candidate linked from the query in the ground-truth graph and as many
/// randomly chosen unlinked candidates, when available.
pub struct DistanceTwoLinkPredictionSampler<'g> {
    graph: &'g IndexedGraph,
    truth: &'g IndexedGraph,
    u_sel: EdgeOrientation,
    v_sel: EdgeOrientation,
    seed: u64,
}

impl<'g> DistanceTwoLinkPredictionSampler<'g> {
    pub fn new(
        graph: &'g IndexedGraph,
        truth: &'g IndexedGraph,
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
        seed: u64,
    ) -> Self {
        Self {
            graph,
            truth,
            u_sel,
            v_sel,
            seed,
        }
    }
}

impl IndividualSampler for DistanceTwoLinkPredictionSampler<'_> {
    fn sample(&self, query: u32, filter: &dyn Fn(u32) -> bool) -> BTreeSet<u32> {
        let reverse = self.v_sel.invert();
        let label = self.graph.label_of(query);
        let mut positives = BTreeSet::new();
        let mut negatives = BTreeSet::new();

        for (w, _) in self.graph.neighbors(query, self.u_sel) {
            if w == query {
                continue;
            }
            for v in self.graph.neighbors(w, reverse).ids() {
                if v == query || !filter(v) {
                    continue;
                }
                if self.truth.contains_edge_labels(label, self.graph.label_of(v)) {
                    positives.insert(v);
                } else {
                    negatives.insert(v);
                }
            }
        }

        let mut negatives: Vec<u32> = negatives.into_iter().collect();
        negatives.shuffle(&mut query_rng(self.seed, query));
        let keep = positives.len().min(negatives.len());
        log::trace!(
            "Query {}: {} positives, {} of {} negatives",
            label,
            positives.len(),
            keep,
            negatives.len()
        );

        positives.extend(negatives.into_iter().take(keep));
        positives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::recommender::CandidateFilter;
    use crate::similarity::fixtures::follow_graph;
    use EdgeOrientation::{In, Out};

    #[test]
    fn distance_two_follows_orientations() {
        let g = follow_graph();
        let idx = |l| g.index_of(l).unwrap();
        let filter = CandidateFilter::new(&g, false);

        // followees of followees of 1: 3, 4 (via 2), 4 (via 3); 3 is already followed
        let sampler = DistanceTwoSampler::new(&g, Out, In);
        let sample = sampler.sample(idx(1), &filter.for_query(idx(1)));
        assert_eq!(sample, BTreeSet::from([idx(4)]));

        // co-followers of what 1 follows
        let sampler = DistanceTwoSampler::new(&g, Out, Out);
        let sample = sampler.sample(idx(1), &|_: u32| true);
        assert_eq!(sample, BTreeSet::from([idx(2), idx(5)]));
    }

    #[test]
    fn link_prediction_balances_classes() {
        let g = follow_graph();
        let idx = |l| g.index_of(l).unwrap();
        let mut truth = GraphBuilder::new(true, false);
        truth.add_edge(2, 1, 1.0);
        let truth = truth.build();

        // candidates of 2 under (UND, UND) minus its links: 1 and 5
        let sampler = DistanceTwoLinkPredictionSampler::new(&g, &truth, EdgeOrientation::Und, EdgeOrientation::Und, 3);
        let filter = CandidateFilter::new(&g, false);
        let sample = sampler.sample(idx(2), &filter.for_query(idx(2)));
        assert!(sample.contains(&idx(1)));
        assert_eq!(sample.len(), 2);
    }

    #[test]
    fn no_positives_means_no_negatives() {
        let g = follow_graph();
        let truth = GraphBuilder::new(true, false).build();
        let sampler = DistanceTwoLinkPredictionSampler::new(&g, &truth, Out, In, 0);
        assert!(sampler.sample(0, &|_: u32| true).is_empty());
    }
}
