//! Pairwise similarities between a query vertex and candidate vertices
//!
//! Every similarity exposes two entry points: a dense score function, usable for
//! any candidate, and a sparse enumeration of the candidates it naturally reaches.

pub mod foaf;
pub mod index;
pub mod ir;

pub use foaf::{FoafMetric, FoafSimilarity};
pub use index::{IndexSimilarity, MemoryIndex, RetrievalIndex, WeightingModel};
pub use ir::{CollectionStats, IrModel, IrSimilarity};

/// Dense score lookup for one query vertex
pub type ScoreFn<'a> = Box<dyn Fn(u32) -> f64 + Send + Sync + 'a>;

pub trait Similarity: Send + Sync {
    /// Score of any candidate against `query`
    fn similarity(&self, query: u32) -> ScoreFn<'_>;

    /// Candidates with a definable score; never contains `query`
    fn similar_elements(&self, query: u32) -> Vec<(u32, f64)>;
}

/// Degenerate arithmetic (0/0, log of 0) scores as zero
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::graph::{GraphBuilder, IndexedGraph};

    /// Small directed follow graph used across the scorer tests
    ///
    /// 1 -> 2, 1 -> 3, 2 -> 3, 2 -> 4, 3 -> 4, 4 -> 1, 5 -> 3
    pub fn follow_graph() -> IndexedGraph {
        let mut builder = GraphBuilder::new(true, false);
        for (a, b) in [(1, 2), (1, 3), (2, 3), (2, 4), (3, 4), (4, 1), (5, 3)] {
            builder.add_edge(a, b, 1.0);
        }
        builder.build()
    }

    pub fn undirected_graph() -> IndexedGraph {
        let mut builder = GraphBuilder::new(false, false);
        for (a, b) in [(1, 2), (1, 3), (2, 3), (2, 4), (3, 4), (4, 5), (5, 6)] {
            builder.add_edge(a, b, 1.0);
        }
        builder.build()
    }
}
