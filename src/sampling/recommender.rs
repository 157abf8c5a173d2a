//! Candidates taken from the top of a recommendation list

use super::IndividualSampler;
use crate::recommender::Recommender;
use std::collections::BTreeSet;

pub struct RecommenderSampler<'g> {
    recommender: Box<dyn Recommender + 'g>,
    k: usize,
}

impl<'g> RecommenderSampler<'g> {
    pub fn new(recommender: Box<dyn Recommender + 'g>, k: usize) -> Self {
        Self { recommender, k }
    }
}

impl IndividualSampler for RecommenderSampler<'_> {
    fn sample(&self, query: u32, filter: &dyn Fn(u32) -> bool) -> BTreeSet<u32> {
        self.recommender
            .recommend(query, filter, self.k)
            .into_iter()
            .map(|(v, _)| v)
            .collect()
    }
}
