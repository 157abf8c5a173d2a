//! Probabilistic and vector-space IR models over graph neighborhoods
//!
//! Each vertex is a document whose terms are its `v_sel` neighbors; the query is the
//! `u_sel` neighborhood of the target vertex, with edge weights as term frequencies.

use crate::graph::{EdgeOrientation, IndexedGraph};
use crate::similarity::{finite_or_zero, ScoreFn, Similarity};
use std::collections::HashMap;

/// Collection statistics shared by every query of a scorer
#[derive(Debug, Clone)]
pub struct CollectionStats {
    pub num_docs: f64,
    /// Document length of each vertex
    pub doc_len: Vec<f64>,
    pub avg_len: f64,
    pub total_tokens: f64,
    /// Number of documents containing each term
    pub doc_freq: Vec<f64>,
    /// Summed weight of each term over the collection
    pub coll_freq: Vec<f64>,
}

impl CollectionStats {
    /// One pass over the graph, O(V + E)
    pub fn compute(graph: &IndexedGraph, v_sel: EdgeOrientation, dl_sel: EdgeOrientation) -> Self {
        let postings = v_sel.invert();
        let doc_len: Vec<f64> = graph.vertices().map(|v| graph.strength(v, dl_sel)).collect();
        let total_tokens: f64 = doc_len.iter().sum();
        let num_docs = graph.node_count as f64;

        let mut doc_freq = Vec::with_capacity(graph.node_count);
        let mut coll_freq = Vec::with_capacity(graph.node_count);
        for w in graph.vertices() {
            let (df, cf) = graph
                .neighbors(w, postings)
                .fold((0.0, 0.0), |(df, cf), (_, weight)| (df + 1.0, cf + weight));
            doc_freq.push(df);
            coll_freq.push(cf);
        }

        Self {
            num_docs,
            avg_len: if num_docs > 0.0 { total_tokens / num_docs } else { 0.0 },
            doc_len,
            total_tokens,
            doc_freq,
            coll_freq,
        }
    }

    /// Robertson-Sparck-Jones weight of a term
    pub fn rsj(&self, term: u32) -> f64 {
        let df = self.doc_freq[term as usize];
        ((self.num_docs - df + 0.5) / (df + 0.5)).ln()
    }

    pub fn idf(&self, term: u32) -> f64 {
        let df = self.doc_freq[term as usize];
        if df > 0.0 {
            (self.num_docs / df).ln()
        } else {
            0.0
        }
    }

    /// Document length over the average, 0 on an empty collection
    pub fn len_ratio(&self, doc: u32) -> f64 {
        if self.avg_len > 0.0 {
            self.doc_len[doc as usize] / self.avg_len
        } else {
            0.0
        }
    }
}

/// Weighting scheme of an [`IrSimilarity`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IrModel {
    Bm25 { b: f64, k: f64 },
    /// BM25 in the limit of an infinite `k`
    ExtremeBm25 { b: f64 },
    /// Binary independence
    Bir,
    /// Query likelihood, Jelinek-Mercer smoothing
    QlJelinekMercer { lambda: f64 },
    /// Query likelihood, Dirichlet smoothing
    QlDirichlet { mu: f64 },
    /// Query likelihood, Laplace smoothing
    QlLaplace { gamma: f64 },
    /// tf-idf cosine
    Vsm,
}

pub struct IrSimilarity<'g> {
    graph: &'g IndexedGraph,
    model: IrModel,
    u_sel: EdgeOrientation,
    v_sel: EdgeOrientation,
    stats: CollectionStats,
    /// tf-idf norm of each document, only for `Vsm`
    doc_norms: Vec<f64>,
}

impl<'g> IrSimilarity<'g> {
    pub fn new(graph: &'g IndexedGraph, model: IrModel, u_sel: EdgeOrientation, v_sel: EdgeOrientation) -> Self {
        Self::with_length_orientation(graph, model, u_sel, v_sel, v_sel)
    }

    /// Document lengths measured over `dl_sel` instead of `v_sel`
    pub fn with_length_orientation(
        graph: &'g IndexedGraph,
        model: IrModel,
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
        dl_sel: EdgeOrientation,
    ) -> Self {
        let stats = CollectionStats::compute(graph, v_sel, dl_sel);
        let doc_norms = match model {
            IrModel::Vsm => graph
                .vertices()
                .map(|v| {
                    graph
                        .neighbors(v, v_sel)
                        .map(|(w, tf)| (tf * stats.idf(w)).powi(2))
                        .sum::<f64>()
                        .sqrt()
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            graph,
            model,
            u_sel,
            v_sel,
            stats,
            doc_norms,
        }
    }

    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    /// Contribution of one matched term
    fn term_score(&self, term: u32, qtf: f64, doc: u32, tf: f64) -> f64 {
        let s = &self.stats;
        match self.model {
            IrModel::Bm25 { b, k } => {
                let den = k * (1.0 - b + b * s.len_ratio(doc)) + tf;
                (k + 1.0) * tf * s.rsj(term) / den
            }
            IrModel::ExtremeBm25 { b } => tf * s.rsj(term) / (1.0 - b + b * s.len_ratio(doc)),
            IrModel::Bir => s.rsj(term),
            IrModel::QlJelinekMercer { lambda } => {
                let p_doc = tf / s.doc_len[doc as usize];
                let p_coll = s.coll_freq[term as usize] / s.total_tokens;
                qtf * (1.0 + (1.0 - lambda) / lambda * p_doc / p_coll).ln()
            }
            IrModel::QlDirichlet { mu } => {
                let p_coll = s.coll_freq[term as usize] / s.total_tokens;
                qtf * (1.0 + tf / (mu * p_coll)).ln()
            }
            IrModel::QlLaplace { gamma } => qtf * (1.0 + tf / gamma).ln(),
            IrModel::Vsm => {
                let idf = s.idf(term);
                qtf * idf * tf * idf
            }
        }
    }

    /// Per-document part of the score that does not depend on matched terms
    fn finish(&self, doc: u32, acc: f64, query_len: f64, query_norm: f64) -> f64 {
        let s = &self.stats;
        let len = s.doc_len[doc as usize];
        let score = match self.model {
            IrModel::QlDirichlet { mu } => acc + query_len * (mu / (len + mu)).ln(),
            IrModel::QlLaplace { gamma } => acc - query_len * (len + gamma * s.num_docs).ln(),
            IrModel::Vsm => acc / (query_norm * self.doc_norms[doc as usize]),
            _ => acc,
        };
        finite_or_zero(score)
    }

    fn query_terms(&self, query: u32) -> (Vec<(u32, f64)>, f64, f64) {
        let terms: Vec<(u32, f64)> = self.graph.neighbors(query, self.u_sel).collect();
        let len = terms.iter().map(|&(_, qtf)| qtf).sum();
        let norm = match self.model {
            IrModel::Vsm => terms
                .iter()
                .map(|&(w, qtf)| (qtf * self.stats.idf(w)).powi(2))
                .sum::<f64>()
                .sqrt(),
            _ => 0.0,
        };
        (terms, len, norm)
    }
}

impl Similarity for IrSimilarity<'_> {
    fn similarity(&self, query: u32) -> ScoreFn<'_> {
        let (terms, query_len, query_norm) = self.query_terms(query);
        let terms: HashMap<u32, f64> = terms.into_iter().collect();

        Box::new(move |doc| {
            let acc: f64 = self
                .graph
                .neighbors(doc, self.v_sel)
                .filter_map(|(w, tf)| terms.get(&w).map(|&qtf| finite_or_zero(self.term_score(w, qtf, doc, tf))))
                .sum();
            self.finish(doc, acc, query_len, query_norm)
        })
    }

    fn similar_elements(&self, query: u32) -> Vec<(u32, f64)> {
        let (terms, query_len, query_norm) = self.query_terms(query);
        let postings = self.v_sel.invert();
        let mut acc: HashMap<u32, f64> = HashMap::new();

        for (w, qtf) in terms {
            for (doc, tf) in self.graph.neighbors(w, postings) {
                if doc != query {
                    *acc.entry(doc).or_insert(0.0) += finite_or_zero(self.term_score(w, qtf, doc, tf));
                }
            }
        }

        acc.into_iter()
            .map(|(doc, sum)| (doc, self.finish(doc, sum, query_len, query_norm)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::similarity::fixtures::{follow_graph, undirected_graph};
    use EdgeOrientation::{In, Out, Und};

    fn all_models() -> Vec<IrModel> {
        vec![
            IrModel::Bm25 { b: 0.75, k: 1.2 },
            IrModel::ExtremeBm25 { b: 0.5 },
            IrModel::Bir,
            IrModel::QlJelinekMercer { lambda: 0.4 },
            IrModel::QlDirichlet { mu: 100.0 },
            IrModel::QlLaplace { gamma: 1.0 },
            IrModel::Vsm,
        ]
    }

    #[test]
    fn statistics_follow_the_posting_orientation() {
        let g = follow_graph();
        let stats = CollectionStats::compute(&g, Out, Out);
        let three = g.index_of(3).unwrap();
        // 3 is followed by 1, 2 and 5
        assert_eq!(stats.doc_freq[three as usize], 3.0);
        assert_eq!(stats.total_tokens, 7.0);
        assert!((stats.avg_len - 7.0 / 5.0).abs() < 1e-12);
        assert!((stats.rsj(three) - (2.5f64 / 3.5).ln()).abs() < 1e-12);
    }

    #[test]
    fn sparse_and_dense_agree() {
        let g = follow_graph();
        for model in all_models() {
            for (u_sel, v_sel) in [(Out, Out), (Out, In), (Und, Und)] {
                let sim = IrSimilarity::new(&g, model, u_sel, v_sel);
                for u in g.vertices() {
                    let dense = sim.similarity(u);
                    for (v, s) in sim.similar_elements(u) {
                        assert_ne!(v, u);
                        assert!(s.is_finite());
                        assert!((dense(v) - s).abs() < 1e-9, "{model:?} {u}->{v}: {} vs {s}", dense(v));
                    }
                }
            }
        }
    }

    /// 1 -> 10 (2), 1 -> 11 (1), 2 -> 10 (3), 3 -> 11 (1), 4 -> 12 (1)
    ///
    /// Query 1 has terms 10 (qtf 2) and 11 (qtf 1). Document 2 holds term 10 with tf 3
    /// and has length 3. N = 7, total length 8; term 10 has df 2 and cf 5.
    fn weighted_graph() -> IndexedGraph {
        let mut builder = GraphBuilder::new(true, true);
        for (a, b, w) in [(1, 10, 2.0), (1, 11, 1.0), (2, 10, 3.0), (3, 11, 1.0), (4, 12, 1.0)] {
            builder.add_edge(a, b, w);
        }
        builder.build()
    }

    #[test]
    fn weighted_scores_match_hand_computation() {
        let g = weighted_graph();
        let (one, two) = (g.index_of(1).unwrap(), g.index_of(2).unwrap());
        let avg = 8.0 / 7.0;
        let rsj = 2.2f64.ln();

        let cases = [
            (
                IrModel::Bm25 { b: 0.75, k: 1.2 },
                2.2 * 3.0 * rsj / (1.2 * (0.25 + 0.75 * 3.0 / avg) + 3.0),
            ),
            (IrModel::ExtremeBm25 { b: 0.5 }, 3.0 * rsj / (0.5 + 0.5 * 3.0 / avg)),
            (IrModel::Bir, rsj),
            // p(t|d) = 1, p(t|C) = 5/8
            (IrModel::QlJelinekMercer { lambda: 0.4 }, 2.0 * 3.4f64.ln()),
            (IrModel::QlDirichlet { mu: 4.0 }, 2.0 * 2.2f64.ln() + 3.0 * (4.0f64 / 7.0).ln()),
            (IrModel::QlLaplace { gamma: 1.0 }, 2.0 * 4.0f64.ln() - 3.0 * 10.0f64.ln()),
            // every term has idf ln(7/2), so only the tf profile matters
            (IrModel::Vsm, 2.0 / 5.0f64.sqrt()),
        ];
        for (model, expected) in cases {
            let sim = IrSimilarity::new(&g, model, Out, Out);
            let actual = sim.similarity(one)(two);
            assert!((actual - expected).abs() < 1e-12, "{model:?}: {actual} != {expected}");
            let sparse = sim.similar_elements(one);
            assert!(sparse.iter().any(|&(v, s)| v == two && (s - expected).abs() < 1e-12), "{model:?}");
        }
    }

    #[test]
    fn vsm_of_a_vertex_with_itself_is_one() {
        let g = undirected_graph();
        let sim = IrSimilarity::new(&g, IrModel::Vsm, Und, Und);
        let two = g.index_of(2).unwrap();
        assert!((sim.similarity(two)(two) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_query_scores_zero() {
        let g = follow_graph();
        // nobody follows 5
        let five = g.index_of(5).unwrap();
        let sim = IrSimilarity::new(&g, IrModel::QlDirichlet { mu: 10.0 }, In, In);
        assert!(sim.similar_elements(five).is_empty());
    }
}
