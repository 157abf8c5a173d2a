//! Ranked, filtered candidate lists on top of similarities and standalone scorers

pub mod algorithm;
pub mod filler;
pub mod standalone;

pub use algorithm::AlgorithmConfig;
pub use filler::RandomFiller;

use crate::graph::IndexedGraph;
use crate::similarity::{ScoreFn, Similarity};
use std::cmp::Ordering;

/// Something that scores candidates for a query vertex
pub trait Recommender: Send + Sync {
    /// Candidates the scorer reaches on its own, with their scores
    fn scores(&self, query: u32) -> Vec<(u32, f64)>;

    /// Score of any candidate
    fn score_fn(&self, query: u32) -> ScoreFn<'_>;

    /// Natural scores of `query`, plus the dense scores when they come out of the same
    /// computation
    fn query_scores(&self, query: u32) -> QueryScores<'_> {
        QueryScores::new(self.scores(query), None)
    }

    /// Natural scores passing `filter`, best first, at most `cutoff` entries
    fn recommend(&self, query: u32, filter: &dyn Fn(u32) -> bool, cutoff: usize) -> Vec<(u32, f64)> {
        self.query_scores(query).ranking(filter, cutoff)
    }
}

/// Scores of one query, computed once for ranking and filling
pub struct QueryScores<'a> {
    natural: Vec<(u32, f64)>,
    dense: Option<ScoreFn<'a>>,
}

impl<'a> QueryScores<'a> {
    pub fn new(natural: Vec<(u32, f64)>, dense: Option<ScoreFn<'a>>) -> Self {
        Self { natural, dense }
    }

    /// Natural candidates are the non-zero entries of `vector` other than `query`
    pub fn from_vector(vector: Vec<f64>, query: u32) -> Self {
        let natural = standalone::nonzero_except(&vector, query);
        Self::new(natural, Some(standalone::vector_lookup(vector)))
    }

    /// Natural scores passing `filter`, best first, at most `cutoff` entries
    pub fn ranking(&self, filter: &dyn Fn(u32) -> bool, cutoff: usize) -> Vec<(u32, f64)> {
        let mut ranking: Vec<(u32, f64)> = self
            .natural
            .iter()
            .copied()
            .filter(|&(candidate, _)| filter(candidate))
            .collect();
        sort_ranking(&mut ranking);
        ranking.truncate(cutoff);
        ranking
    }

    /// Dense scores, asking `recommender` only when they were not kept
    pub fn into_score_fn<R>(self, recommender: &'a R, query: u32) -> ScoreFn<'a>
    where
        R: Recommender + ?Sized,
    {
        match self.dense {
            Some(dense) => dense,
            None => recommender.score_fn(query),
        }
    }
}

/// Score descending, candidate index ascending on ties
pub fn sort_ranking(ranking: &mut [(u32, f64)]) {
    ranking.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
}

/// Standard candidate predicates for contact recommendation
#[derive(Clone, Copy)]
pub struct CandidateFilter<'g> {
    graph: &'g IndexedGraph,
    exclude_reciprocal: bool,
}

impl<'g> CandidateFilter<'g> {
    pub fn new(graph: &'g IndexedGraph, exclude_reciprocal: bool) -> Self {
        Self {
            graph,
            exclude_reciprocal,
        }
    }

    /// `candidate` is neither `query` nor already linked from it
    pub fn accepts(&self, query: u32, candidate: u32) -> bool {
        if candidate == query || self.graph.has_edge(query, candidate) {
            return false;
        }
        !(self.exclude_reciprocal && self.graph.has_edge(candidate, query))
    }

    /// The filter bound to one query
    pub fn for_query(&self, query: u32) -> impl Fn(u32) -> bool + '_ {
        move |candidate| self.accepts(query, candidate)
    }
}

/// Recommender backed by a [`Similarity`]
pub struct SimilarityRecommender<'g> {
    similarity: Box<dyn Similarity + 'g>,
}

impl<'g> SimilarityRecommender<'g> {
    pub fn new(similarity: impl Similarity + 'g) -> Self {
        Self {
            similarity: Box::new(similarity),
        }
    }
}

impl Recommender for SimilarityRecommender<'_> {
    fn scores(&self, query: u32) -> Vec<(u32, f64)> {
        self.similarity.similar_elements(query)
    }

    fn score_fn(&self, query: u32) -> ScoreFn<'_> {
        self.similarity.similarity(query)
    }
}
