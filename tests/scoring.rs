use contact_letor::graph::EdgeOrientation::{In, Out, Und};
use contact_letor::graph::{GraphBuilder, IndexedGraph};
use contact_letor::letor::Normalization;
use contact_letor::recommender::CandidateFilter;
use contact_letor::sampling::{DistanceTwoLinkPredictionSampler, DistanceTwoSampler, IndividualSampler};
use contact_letor::similarity::{FoafMetric, FoafSimilarity, Similarity};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};

fn build(edges: &[(u64, u64)], directed: bool) -> IndexedGraph {
    let mut builder = GraphBuilder::new(directed, false);
    for &(src, dst) in edges {
        builder.add_edge(src, dst, 1.0);
    }
    builder.build()
}

fn edge_lists() -> impl Strategy<Value = Vec<(u64, u64)>> {
    prop::collection::vec((0u64..15, 0u64..15), 1..50)
        .prop_map(|edges| edges.into_iter().filter(|(a, b)| a != b).collect())
}

#[test]
fn end_to_end_on_a_four_vertex_graph() {
    let train = build(&[(1, 2), (2, 3), (1, 3)], true);
    let truth = build(&[(1, 2), (2, 3), (1, 3), (1, 4)], true);
    let idx = |l| train.index_of(l).unwrap();

    // 3 is two steps away through 2, but 1 already follows it
    let filter = CandidateFilter::new(&train, false);
    let sampler = DistanceTwoLinkPredictionSampler::new(&train, &truth, Out, In, 0);
    assert_eq!(sampler.sample(idx(1), &filter.for_query(idx(1))), BTreeSet::new());
    let unfiltered = sampler.sample(idx(1), &|_: u32| true);
    assert!(unfiltered.contains(&idx(3)));
    assert!(truth.contains_edge_labels(1, 3));

    let mcn = FoafSimilarity::new(&train, FoafMetric::MostCommonNeighbors, Out, In);
    assert_eq!(mcn.similarity(idx(1))(idx(3)), 1.0);
}

#[test]
fn adamic_adar_needs_a_common_neighbor() {
    // 1 and 2 share 3; 4 shares nothing with 1
    let g = build(&[(1, 3), (2, 3), (4, 5)], false);
    let idx = |l| g.index_of(l).unwrap();
    let aa = FoafSimilarity::new(&g, FoafMetric::AdamicAdar { w_sel: Und }, Und, Und);
    let score = aa.similarity(idx(1));
    assert!(score(idx(2)) > 0.0);
    assert_eq!(score(idx(4)), 0.0);
}

#[test]
fn jaccard_of_identical_neighborhoods_is_one() {
    let g = build(&[(1, 3), (1, 4), (2, 3), (2, 4)], false);
    let idx = |l| g.index_of(l).unwrap();
    let jaccard = FoafSimilarity::new(&g, FoafMetric::Jaccard, Und, Und);
    assert_eq!(jaccard.similarity(idx(1))(idx(2)), 1.0);
}

proptest! {
    #[test]
    fn jaccard_is_symmetric_and_bounded(edges in edge_lists()) {
        let g = build(&edges, false);
        let jaccard = FoafSimilarity::new(&g, FoafMetric::Jaccard, Und, Und);
        for u in g.vertices() {
            let from_u = jaccard.similarity(u);
            for v in g.vertices() {
                let s = from_u(v);
                prop_assert!((0.0..=1.0).contains(&s));
                prop_assert_eq!(s, jaccard.similarity(v)(u));
            }
        }
    }

    #[test]
    fn link_prediction_keeps_every_positive(edges in edge_lists(), future in edge_lists(), seed in any::<u64>()) {
        let g = build(&edges, true);
        let truth = build(&edges.iter().chain(&future).copied().collect::<Vec<_>>(), true);
        let filter = CandidateFilter::new(&g, false);
        let pool_sampler = DistanceTwoSampler::new(&g, Out, In);
        let sampler = DistanceTwoLinkPredictionSampler::new(&g, &truth, Out, In, seed);

        for q in g.vertices() {
            let accepts = filter.for_query(q);
            let pool = pool_sampler.sample(q, &accepts);
            let sample = sampler.sample(q, &accepts);
            let linked = |v: u32| truth.contains_edge_labels(g.label_of(q), g.label_of(v));

            let positives: BTreeSet<u32> = pool.iter().copied().filter(|&v| linked(v)).collect();
            let sampled_positives: BTreeSet<u32> = sample.iter().copied().filter(|&v| linked(v)).collect();
            let sampled_negatives = sample.len() - sampled_positives.len();

            prop_assert!(sample.is_subset(&pool));
            prop_assert_eq!(&sampled_positives, &positives);
            prop_assert!(sampled_negatives <= positives.len());
            prop_assert!(sampled_negatives <= pool.len() - positives.len());
        }
    }

    #[test]
    fn ranksim_orders_by_score(scores in prop::collection::vec(-100.0f64..100.0, 1..40)) {
        let input: Vec<(u32, f64)> = scores.iter().enumerate().map(|(i, &s)| (i as u32, s)).collect();
        let normalized = Normalization::Ranksim.apply(&input);
        prop_assert_eq!(normalized.len(), input.len());

        let values: Vec<f64> = normalized.iter().map(|&(_, v)| v).collect();
        prop_assert!(values.iter().all(|&v| v > 0.0 && v <= 1.0));
        let distinct: HashSet<u64> = values.iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(distinct.len(), values.len());

        let value_of = |c: u32| normalized.iter().find(|&&(v, _)| v == c).map(|&(_, v)| v).unwrap();
        for &(a, sa) in &input {
            for &(b, sb) in &input {
                if sa > sb {
                    prop_assert!(value_of(a) > value_of(b));
                }
            }
        }
    }
}
