use contact_letor::graph::{EdgeOrientation, GraphBuilder, IndexedGraph};
use proptest::prelude::*;

fn build(edges: &[(u64, u64)], directed: bool) -> IndexedGraph {
    let mut builder = GraphBuilder::new(directed, false);
    for &(src, dst) in edges {
        builder.add_edge(src, dst, 1.0);
    }
    builder.build()
}

fn edge_lists() -> impl Strategy<Value = Vec<(u64, u64)>> {
    prop::collection::vec((0u64..20, 0u64..20), 1..60)
        .prop_map(|edges| edges.into_iter().filter(|(a, b)| a != b).collect())
}

proptest! {
    #[test]
    fn undirected_degree_matches_neighbors(edges in edge_lists()) {
        let g = build(&edges, false);
        for v in g.vertices() {
            let neighbors: Vec<u32> = g.neighbors(v, EdgeOrientation::Und).ids().collect();
            prop_assert_eq!(g.degree(v, EdgeOrientation::Und), neighbors.len());
            for w in neighbors {
                prop_assert!(g.has_edge(v, w) && g.has_edge(w, v));
            }
        }
    }

    #[test]
    fn directed_und_view_is_the_union_of_both_sides(edges in edge_lists()) {
        let g = build(&edges, true);
        for v in g.vertices() {
            let mut union: Vec<u32> = g
                .neighbors(v, EdgeOrientation::Out)
                .ids()
                .chain(g.neighbors(v, EdgeOrientation::In).ids())
                .collect();
            union.sort_unstable();
            union.dedup();
            let und: Vec<u32> = g.neighbors(v, EdgeOrientation::Und).ids().collect();
            prop_assert_eq!(und, union);
        }
    }

    #[test]
    fn degree_survives_relabeling(edges in edge_lists()) {
        let g = build(&edges, false);
        // reversed insertion order with mirrored labels
        let relabeled: Vec<(u64, u64)> = edges.iter().rev().map(|&(a, b)| (100 - b, 100 - a)).collect();
        let h = build(&relabeled, false);

        prop_assert_eq!(g.node_count, h.node_count);
        prop_assert_eq!(g.edge_count(), h.edge_count());
        for v in g.vertices() {
            let label = g.label_of(v);
            let u = h.index_of(100 - label).unwrap();
            prop_assert_eq!(g.degree(v, EdgeOrientation::Und), h.degree(u, EdgeOrientation::Und));
        }
    }
}
