//! Graph clean-up applied after loading

use crate::graph::{GraphBuilder, IndexedGraph};

/// Copy of a graph without self-loops
///
/// Vertex indices are preserved: vertices are re-added in index order before any edge.
pub fn remove_self_loops(graph: &IndexedGraph) -> IndexedGraph {
    let mut builder = GraphBuilder::with_capacity(graph.is_directed(), graph.is_weighted(), graph.node_count);
    for &label in graph.labels() {
        builder.add_vertex(label);
    }

    let mut removed = 0usize;
    let adjacency = graph.outgoing();
    for src in graph.vertices() {
        let targets = adjacency.edges_of(src as usize);
        let weights = adjacency.weights_of(src as usize);
        for (&dst, &weight) in targets.iter().zip(weights) {
            if dst == src {
                removed += 1;
                continue;
            }
            // Undirected edges are stored twice; the builder mirrors them again
            if !graph.is_directed() && dst < src {
                continue;
            }
            builder.add_edge(graph.label_of(src), graph.label_of(dst), weight);
        }
    }

    log::debug!("Removed {} self-loops", removed);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeOrientation;

    #[test]
    fn drops_loops_and_keeps_indices() {
        for directed in [true, false] {
            let mut builder = GraphBuilder::new(directed, true);
            builder.add_edge(5, 5, 1.0);
            builder.add_edge(5, 6, 2.0);
            builder.add_edge(6, 7, 3.0);
            let g = builder.build();

            let clean = remove_self_loops(&g);
            assert_eq!(clean.labels(), g.labels());
            assert_eq!(clean.edge_count(), 2);
            assert!(!clean.has_edge(0, 0));
            assert_eq!(clean.edge_weight(0, 1), Some(2.0));
            assert_eq!(clean.degree(1, EdgeOrientation::Und), 2);
        }
    }
}
