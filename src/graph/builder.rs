//! Graph construction module

use crate::graph::compressed::{Adjacency, IndexedGraph};
use std::collections::HashMap;

/// Builder for incrementally constructing an IndexedGraph
pub struct GraphBuilder {
    directed: bool,
    weighted: bool,

    /// Mapping from external labels to node indices
    id_to_index: HashMap<u64, u32>,

    /// Node labels, in index order
    node_ids: Vec<u64>,

    /// Adjacency lists for each node, in insertion order
    adjacency_lists: Vec<Vec<(u32, f64)>>,
}

impl GraphBuilder {
    pub fn new(directed: bool, weighted: bool) -> Self {
        Self::with_capacity(directed, weighted, 0)
    }

    /// Create a new graph builder with the given capacity
    pub fn with_capacity(directed: bool, weighted: bool, capacity: usize) -> Self {
        Self {
            directed,
            weighted,
            id_to_index: HashMap::with_capacity(capacity),
            node_ids: Vec::with_capacity(capacity),
            adjacency_lists: Vec::with_capacity(capacity),
        }
    }

    /// Get or create the node index for the given label
    pub fn add_vertex(&mut self, id: u64) -> u32 {
        if let Some(&idx) = self.id_to_index.get(&id) {
            return idx;
        }

        let idx = self.node_ids.len() as u32;
        self.id_to_index.insert(id, idx);
        self.node_ids.push(id);
        self.adjacency_lists.push(Vec::new());

        idx
    }

    /// Add an edge; the weight is ignored for unweighted graphs
    pub fn add_edge(&mut self, src_id: u64, dst_id: u64, weight: f64) {
        let src_idx = self.add_vertex(src_id);
        let dst_idx = self.add_vertex(dst_id);
        let weight = if self.weighted { weight } else { 1.0 };

        self.adjacency_lists[src_idx as usize].push((dst_idx, weight));
        if !self.directed && src_idx != dst_idx {
            self.adjacency_lists[dst_idx as usize].push((src_idx, weight));
        }
    }

    /// Build the indexed graph
    pub fn build(mut self) -> IndexedGraph {
        let node_count = self.node_ids.len();

        for list in &mut self.adjacency_lists {
            // Stable sort, so dedup keeps the first weight read for a repeated edge
            list.sort_by_key(|&(target, _)| target);
            list.dedup_by_key(|&mut (target, _)| target);
        }

        let stored: usize = self.adjacency_lists.iter().map(|list| list.len()).sum();
        let edge_count = if self.directed {
            stored
        } else {
            let loops = self
                .adjacency_lists
                .iter()
                .enumerate()
                .filter(|(src, list)| list.iter().any(|&(dst, _)| dst as usize == *src))
                .count();
            (stored + loops) / 2
        };

        let outgoing = Adjacency::from_lists(&self.adjacency_lists);
        let incoming = if self.directed {
            // Sources are visited in increasing order, so each reversed list comes out sorted
            let mut reversed: Vec<Vec<(u32, f64)>> = vec![Vec::new(); node_count];
            for (src, list) in self.adjacency_lists.iter().enumerate() {
                for &(dst, weight) in list {
                    reversed[dst as usize].push((src as u32, weight));
                }
            }
            Adjacency::from_lists(&reversed)
        } else {
            outgoing.clone()
        };

        IndexedGraph::from_parts(
            self.directed,
            self.weighted,
            edge_count,
            outgoing,
            incoming,
            self.node_ids,
            self.id_to_index,
        )
    }
}
