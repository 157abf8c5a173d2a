//! Inverted index over vertex neighborhoods, scored with divergence-from-randomness models

use crate::graph::{EdgeOrientation, IndexedGraph};
use crate::similarity::{finite_or_zero, ScoreFn, Similarity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::{E, PI};

/// Weighting models understood by a [`RetrievalIndex`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightingModel {
    PL2,
    DLH,
    DPH,
    DFRee,
    DFReeKLIM,
}

impl WeightingModel {
    pub fn name(self) -> &'static str {
        match self {
            WeightingModel::PL2 => "PL2",
            WeightingModel::DLH => "DLH",
            WeightingModel::DPH => "DPH",
            WeightingModel::DFRee => "DFRee",
            WeightingModel::DFReeKLIM => "DFReeKLIM",
        }
    }
}

/// Search capability: rank the documents (vertices) matching a query vertex
pub trait RetrievalIndex: Send + Sync {
    /// Scored documents, best first; may include the query vertex itself
    fn query(&self, query: u32, model: WeightingModel, c: Option<f64>) -> Vec<(u32, f64)>;
}

/// In-memory inverted index built once from a graph
///
/// Documents are the `v_sel` neighborhoods, queries the `u_sel` neighborhoods.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    /// term -> (document, term frequency)
    postings: Vec<Vec<(u32, f64)>>,
    /// query vertex -> (term, query term frequency)
    queries: Vec<Vec<(u32, f64)>>,
    doc_len: Vec<f64>,
    avg_len: f64,
    num_docs: f64,
    /// Summed frequency of each term
    term_freq: Vec<f64>,
}

impl MemoryIndex {
    pub fn build(graph: &IndexedGraph, u_sel: EdgeOrientation, v_sel: EdgeOrientation) -> Self {
        let reverse = v_sel.invert();
        let postings: Vec<Vec<(u32, f64)>> = graph
            .vertices()
            .map(|w| graph.neighbors(w, reverse).collect())
            .collect();
        let queries = graph
            .vertices()
            .map(|u| graph.neighbors(u, u_sel).collect())
            .collect();
        let doc_len: Vec<f64> = graph.vertices().map(|v| graph.strength(v, v_sel)).collect();
        let term_freq = postings
            .iter()
            .map(|list| list.iter().map(|&(_, tf)| tf).sum::<f64>())
            .collect();

        let num_docs = graph.node_count as f64;
        let total: f64 = doc_len.iter().sum();
        log::debug!(
            "Built neighborhood index: {} documents, {} postings",
            graph.node_count,
            postings.iter().map(Vec::len).sum::<usize>()
        );

        Self {
            postings,
            queries,
            avg_len: if num_docs > 0.0 { total / num_docs } else { 0.0 },
            doc_len,
            num_docs,
            term_freq,
        }
    }

    /// Score of one posting under a weighting model
    fn weight(&self, model: WeightingModel, c: Option<f64>, term: u32, qtf: f64, doc: u32, tf: f64) -> f64 {
        let len = self.doc_len[doc as usize];
        let n = self.num_docs;
        let avg = self.avg_len;
        let cf = self.term_freq[term as usize];

        let score = match model {
            WeightingModel::PL2 => {
                let c = c.unwrap_or(1.0);
                let tfn = tf * (1.0 + c * avg / len).log2();
                let lambda = cf / n;
                qtf / (tfn + 1.0)
                    * (tfn * (tfn / lambda).log2()
                        + (lambda - tfn) * E.log2()
                        + 0.5 * (2.0 * PI * tfn).log2())
            }
            WeightingModel::DLH => {
                let f = tf / len;
                qtf / (tf + 0.5)
                    * (tf * ((tf * avg / len) * (n / cf)).log2()
                        + (len - tf) * (1.0 - f).log2()
                        + 0.5 * (2.0 * PI * tf * (1.0 - f)).log2())
            }
            WeightingModel::DPH => {
                let f = tf / len;
                let norm = (1.0 - f) * (1.0 - f) / (tf + 1.0);
                qtf * norm
                    * (tf * ((tf * avg / len) * (n / cf)).log2() + 0.5 * (2.0 * PI * tf * (1.0 - f)).log2())
            }
            WeightingModel::DFRee | WeightingModel::DFReeKLIM => {
                let total = avg * n;
                let prior = tf / len;
                let posterior = (tf + 1.0) / (len + 1.0);
                let inv_prior_collection = total / cf;
                let norm = tf * (posterior / prior).log2();
                let divergence = (tf + 1.0) * (posterior * inv_prior_collection).log2()
                    - tf * (prior * inv_prior_collection).log2();
                if model == WeightingModel::DFRee {
                    qtf * norm * (divergence + 0.5 * (posterior / prior).log2())
                } else {
                    qtf * norm * divergence
                }
            }
        };
        finite_or_zero(score)
    }
}

impl RetrievalIndex for MemoryIndex {
    fn query(&self, query: u32, model: WeightingModel, c: Option<f64>) -> Vec<(u32, f64)> {
        let mut scores: HashMap<u32, f64> = HashMap::new();
        for &(term, qtf) in &self.queries[query as usize] {
            for &(doc, tf) in &self.postings[term as usize] {
                *scores.entry(doc).or_insert(0.0) += self.weight(model, c, term, qtf, doc, tf);
            }
        }

        let mut ranked: Vec<(u32, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}

/// Similarity that delegates scoring to a [`RetrievalIndex`]
pub struct IndexSimilarity<I> {
    index: I,
    model: WeightingModel,
    c: Option<f64>,
}

impl<I: RetrievalIndex> IndexSimilarity<I> {
    pub fn new(index: I, model: WeightingModel, c: Option<f64>) -> Self {
        Self { index, model, c }
    }
}

impl<I: RetrievalIndex> Similarity for IndexSimilarity<I> {
    fn similarity(&self, query: u32) -> ScoreFn<'_> {
        let scores: HashMap<u32, f64> = self.index.query(query, self.model, self.c).into_iter().collect();
        Box::new(move |doc| scores.get(&doc).copied().unwrap_or(0.0))
    }

    fn similar_elements(&self, query: u32) -> Vec<(u32, f64)> {
        self.index
            .query(query, self.model, self.c)
            .into_iter()
            .filter(|&(doc, _)| doc != query)
            .collect()
    }
}
