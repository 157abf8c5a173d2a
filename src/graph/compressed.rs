//! Memory-efficient indexed graph representation

use crate::error::GraphError;
use crate::graph::EdgeOrientation;
use std::collections::HashMap;
use std::mem;

/// One direction of a graph in compressed sparse row form
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    /// Offset array: offsets[i] to offsets[i+1] defines the edge range for node i
    pub offsets: Vec<u32>,

    /// Edge array: concatenated, per-node sorted lists of target nodes
    pub edges: Vec<u32>,

    /// Edge weights, aligned with `edges`
    pub weights: Vec<f64>,
}

impl Adjacency {
    /// Create an empty adjacency with pre-allocated capacity
    pub fn with_capacity(node_count: usize, edge_count: usize) -> Self {
        Self {
            offsets: Vec::with_capacity(node_count + 1),
            edges: Vec::with_capacity(edge_count),
            weights: Vec::with_capacity(edge_count),
        }
    }

    /// Build from per-node lists that are already sorted by target
    pub fn from_lists(lists: &[Vec<(u32, f64)>]) -> Self {
        let edge_count = lists.iter().map(|l| l.len()).sum();
        let mut adjacency = Self::with_capacity(lists.len(), edge_count);

        adjacency.offsets.push(0);
        let mut offset = 0u32;
        for list in lists {
            for &(target, weight) in list {
                adjacency.edges.push(target);
                adjacency.weights.push(weight);
            }
            offset += list.len() as u32;
            adjacency.offsets.push(offset);
        }

        adjacency
    }

    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize..self.offsets[node + 1] as usize
    }

    /// Targets of a node
    pub fn edges_of(&self, node: usize) -> &[u32] {
        &self.edges[self.range(node)]
    }

    /// Weights of a node, aligned with `edges_of`
    pub fn weights_of(&self, node: usize) -> &[f64] {
        &self.weights[self.range(node)]
    }

    /// Position of `dst` in the list of `src`, by binary search
    fn position(&self, src: usize, dst: u32) -> Option<usize> {
        self.edges_of(src)
            .binary_search(&dst)
            .ok()
            .map(|pos| self.offsets[src] as usize + pos)
    }

    pub fn degree(&self, node: usize) -> usize {
        self.range(node).len()
    }

    fn memory_usage(&self) -> usize {
        self.offsets.capacity() * mem::size_of::<u32>()
            + self.edges.capacity() * mem::size_of::<u32>()
            + self.weights.capacity() * mem::size_of::<f64>()
    }
}

/// Directed or undirected, weighted or unweighted graph with a dense index per vertex
///
/// Vertex labels are mapped to indices `0..node_count` in first-seen order; every
/// query works on indices. Undirected graphs keep each edge in both directions, so
/// the outgoing and incoming adjacency are identical.
#[derive(Debug, Clone)]
pub struct IndexedGraph {
    /// Number of vertices
    pub node_count: usize,

    directed: bool,
    weighted: bool,
    edge_count: usize,

    outgoing: Adjacency,
    incoming: Adjacency,

    /// Mapping from indices to external labels
    node_ids: Vec<u64>,

    /// Mapping from external labels to indices
    id_to_index: HashMap<u64, u32>,
}

impl IndexedGraph {
    pub(crate) fn from_parts(
        directed: bool,
        weighted: bool,
        edge_count: usize,
        outgoing: Adjacency,
        incoming: Adjacency,
        node_ids: Vec<u64>,
        id_to_index: HashMap<u64, u32>,
    ) -> Self {
        Self {
            node_count: node_ids.len(),
            directed,
            weighted,
            edge_count,
            outgoing,
            incoming,
            node_ids,
            id_to_index,
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    /// Number of distinct edges (undirected edges count once)
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Raw outgoing adjacency (for undirected graphs, the symmetric adjacency)
    pub fn outgoing(&self) -> &Adjacency {
        &self.outgoing
    }

    /// Raw incoming adjacency
    pub fn incoming(&self) -> &Adjacency {
        &self.incoming
    }

    pub fn label_of(&self, index: u32) -> u64 {
        self.node_ids[index as usize]
    }

    pub fn index_of(&self, label: u64) -> Option<u32> {
        self.id_to_index.get(&label).copied()
    }

    pub fn contains_vertex(&self, label: u64) -> bool {
        self.id_to_index.contains_key(&label)
    }

    /// All vertex labels, in index order
    pub fn labels(&self) -> &[u64] {
        &self.node_ids
    }

    /// Lazy `(neighbor, weight)` sequence of a vertex under an orientation
    ///
    /// For directed graphs, `Und` merges outgoing and incoming neighbors into a
    /// single sorted sequence; a mutual neighbor appears once with the summed weight.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid index; see [`IndexedGraph::try_neighbors`].
    pub fn neighbors(&self, node: u32, orientation: EdgeOrientation) -> Neighbors<'_> {
        let n = node as usize;
        let out = EdgeSlice::new(self.outgoing.edges_of(n), self.outgoing.weights_of(n));
        if !self.directed {
            return Neighbors::single(out);
        }

        match orientation {
            EdgeOrientation::Out => Neighbors::single(out),
            EdgeOrientation::In => Neighbors::single(EdgeSlice::new(
                self.incoming.edges_of(n),
                self.incoming.weights_of(n),
            )),
            EdgeOrientation::Und => Neighbors::merged(
                node,
                out,
                EdgeSlice::new(self.incoming.edges_of(n), self.incoming.weights_of(n)),
            ),
        }
    }

    /// Checked variant of [`IndexedGraph::neighbors`]
    pub fn try_neighbors(
        &self,
        node: u32,
        orientation: EdgeOrientation,
    ) -> Result<Neighbors<'_>, GraphError> {
        self.check(node)?;
        Ok(self.neighbors(node, orientation))
    }

    /// Number of neighbors yielded by `neighbors(node, orientation)`
    pub fn degree(&self, node: u32, orientation: EdgeOrientation) -> usize {
        let n = node as usize;
        match (self.directed, orientation) {
            (false, _) | (true, EdgeOrientation::Out) => self.outgoing.degree(n),
            (true, EdgeOrientation::In) => self.incoming.degree(n),
            (true, EdgeOrientation::Und) => self.neighbors(node, orientation).count(),
        }
    }

    /// Checked variant of [`IndexedGraph::degree`]
    pub fn try_degree(&self, node: u32, orientation: EdgeOrientation) -> Result<usize, GraphError> {
        self.check(node)?;
        Ok(self.degree(node, orientation))
    }

    /// Sum of the weights yielded by `neighbors(node, orientation)`
    pub fn strength(&self, node: u32, orientation: EdgeOrientation) -> f64 {
        self.neighbors(node, orientation).map(|(_, w)| w).sum()
    }

    /// Check if there's an edge from src to dst
    pub fn has_edge(&self, src: u32, dst: u32) -> bool {
        self.outgoing.position(src as usize, dst).is_some()
    }

    /// Weight of the edge from src to dst, if present
    pub fn edge_weight(&self, src: u32, dst: u32) -> Option<f64> {
        self.outgoing
            .position(src as usize, dst)
            .map(|pos| self.outgoing.weights[pos])
    }

    /// Edge lookup by external labels; false when either vertex is unknown
    pub fn contains_edge_labels(&self, src: u64, dst: u64) -> bool {
        match (self.index_of(src), self.index_of(dst)) {
            (Some(s), Some(d)) => self.has_edge(s, d),
            _ => false,
        }
    }

    /// All vertex indices
    pub fn vertices(&self) -> std::ops::Range<u32> {
        0..self.node_count as u32
    }

    fn check(&self, node: u32) -> Result<(), GraphError> {
        if (node as usize) < self.node_count {
            Ok(())
        } else {
            Err(GraphError::VertexOutOfRange {
                index: node as usize,
                count: self.node_count,
            })
        }
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let ids = self.node_ids.capacity() * mem::size_of::<u64>();
        let index = self.id_to_index.capacity() * (mem::size_of::<u64>() + mem::size_of::<u32>());
        let incoming = if self.directed { self.incoming.memory_usage() } else { 0 };

        base + self.outgoing.memory_usage() + incoming + ids + index
    }
}

/// Cursor over one sorted adjacency list
#[derive(Debug, Clone)]
struct EdgeSlice<'a> {
    targets: &'a [u32],
    weights: &'a [f64],
    pos: usize,
}

impl<'a> EdgeSlice<'a> {
    fn new(targets: &'a [u32], weights: &'a [f64]) -> Self {
        Self { targets, weights, pos: 0 }
    }

    fn peek(&self) -> Option<(u32, f64)> {
        self.targets
            .get(self.pos)
            .map(|&t| (t, self.weights[self.pos]))
    }

    fn remaining(&self) -> usize {
        self.targets.len() - self.pos
    }
}

impl Iterator for EdgeSlice<'_> {
    type Item = (u32, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.peek()?;
        self.pos += 1;
        Some(item)
    }
}

/// Neighborhood iterator returned by [`IndexedGraph::neighbors`]
#[derive(Debug, Clone)]
pub struct Neighbors<'a> {
    vertex: u32,
    first: EdgeSlice<'a>,
    second: Option<EdgeSlice<'a>>,
}

impl<'a> Neighbors<'a> {
    fn single(first: EdgeSlice<'a>) -> Self {
        Self { vertex: 0, first, second: None }
    }

    fn merged(vertex: u32, first: EdgeSlice<'a>, second: EdgeSlice<'a>) -> Self {
        Self { vertex, first, second: Some(second) }
    }

    /// Neighbor indices only
    pub fn ids(self) -> impl Iterator<Item = u32> + 'a {
        self.map(|(v, _)| v)
    }
}

impl Iterator for Neighbors<'_> {
    type Item = (u32, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let Some(second) = self.second.as_mut() else {
            return self.first.next();
        };

        match (self.first.peek(), second.peek()) {
            (None, None) => None,
            (Some(_), None) => self.first.next(),
            (None, Some(_)) => second.next(),
            (Some((a, wa)), Some((b, wb))) => {
                if a < b {
                    self.first.next()
                } else if b < a {
                    second.next()
                } else {
                    self.first.next();
                    second.next();
                    // A self-loop is listed on both sides but is one edge
                    let weight = if a == self.vertex { wa } else { wa + wb };
                    Some((a, weight))
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let first = self.first.remaining();
        match &self.second {
            None => (first, Some(first)),
            Some(second) => (first.max(second.remaining()), Some(first + second.remaining())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn directed() -> IndexedGraph {
        let mut builder = GraphBuilder::new(true, true);
        builder.add_edge(1, 2, 1.0);
        builder.add_edge(2, 1, 2.0);
        builder.add_edge(1, 3, 0.5);
        builder.add_edge(3, 3, 4.0);
        builder.build()
    }

    #[test]
    fn oriented_neighborhoods() {
        let g = directed();
        let (one, two, three) = (g.index_of(1).unwrap(), g.index_of(2).unwrap(), g.index_of(3).unwrap());

        let out: Vec<u32> = g.neighbors(one, EdgeOrientation::Out).ids().collect();
        assert_eq!(out, vec![two, three]);
        let inc: Vec<u32> = g.neighbors(one, EdgeOrientation::In).ids().collect();
        assert_eq!(inc, vec![two]);

        let und: Vec<(u32, f64)> = g.neighbors(one, EdgeOrientation::Und).collect();
        assert_eq!(und, vec![(two, 3.0), (three, 0.5)]);
        assert_eq!(g.degree(one, EdgeOrientation::Und), 2);
        assert_eq!(g.strength(one, EdgeOrientation::Und), 3.5);
    }

    #[test]
    fn self_loop_counted_once_undirected_view() {
        let g = directed();
        let three = g.index_of(3).unwrap();
        let und: Vec<(u32, f64)> = g.neighbors(three, EdgeOrientation::Und).collect();
        assert_eq!(und, vec![(g.index_of(1).unwrap(), 0.5), (three, 4.0)]);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let g = directed();
        let err = g.try_degree(17, EdgeOrientation::Out).unwrap_err();
        assert_eq!(err, GraphError::VertexOutOfRange { index: 17, count: 3 });
        assert!(g.try_neighbors(2, EdgeOrientation::In).is_ok());
    }

    #[test]
    fn edge_lookups() {
        let g = directed();
        let (one, two) = (g.index_of(1).unwrap(), g.index_of(2).unwrap());
        assert!(g.has_edge(one, two));
        assert_eq!(g.edge_weight(two, one), Some(2.0));
        assert!(g.contains_edge_labels(1, 3));
        assert!(!g.contains_edge_labels(3, 1));
        assert!(!g.contains_edge_labels(1, 99));
        assert_eq!(g.edge_count(), 4);
        assert!(g.memory_usage() > 0);
    }
}
