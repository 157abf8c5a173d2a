//! Per-user contact rankings from trainer predictions
//!
//! The trainer writes one score per line, aligned with the rows of the test set it
//! scored. Scores are grouped by query, filtered against the training graph and
//! written as a TREC run:
//!
//! ```text
//! 17	Q0	42	1	0.8125	r
//! ```

use super::instance::InstanceSet;
use crate::error::{ParseError, TrainerError};
use crate::graph::IndexedGraph;
use crate::recommender::{sort_ranking, CandidateFilter};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Run tag of the TREC lines
pub const RUN_NAME: &str = "r";

pub fn load_predictions(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let scores = read_predictions(BufReader::new(file), path)?;
    log::info!("Read {} predictions from {}", scores.len(), path.display());
    Ok(scores)
}

/// One score per non-blank line; `origin` only labels errors
pub fn read_predictions<R: BufRead>(reader: R, origin: &Path) -> Result<Vec<f64>, ParseError> {
    let mut scores = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ParseError::line(origin, line_no + 1, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let score = trimmed
            .parse::<f64>()
            .map_err(|e| ParseError::line(origin, line_no + 1, format!("invalid score `{trimmed}`: {e}")))?;
        scores.push(score);
    }
    Ok(scores)
}

/// Ranked contacts of one user, best first
#[derive(Debug, Clone, PartialEq)]
pub struct UserRanking {
    pub user: u64,
    pub contacts: Vec<(u64, f64)>,
}

/// Builds rankings over the vertices of the training graph
pub struct PredictionRanker<'g> {
    graph: &'g IndexedGraph,
    filter: CandidateFilter<'g>,
    cutoff: usize,
}

impl<'g> PredictionRanker<'g> {
    pub fn new(graph: &'g IndexedGraph, exclude_reciprocal: bool, cutoff: usize) -> Self {
        Self {
            graph,
            filter: CandidateFilter::new(graph, exclude_reciprocal),
            cutoff,
        }
    }

    /// Groups `scores` by the query of each test row
    ///
    /// Users and contacts unknown to the training graph are skipped, as are
    /// candidates the filter rejects. A pair scored twice keeps its last score.
    pub fn rank(&self, test: &InstanceSet, scores: &[f64]) -> Result<Vec<UserRanking>, TrainerError> {
        if scores.len() != test.len() {
            return Err(TrainerError::PredictionCount {
                expected: test.len(),
                found: scores.len(),
            });
        }

        let mut by_user: BTreeMap<u64, HashMap<u32, f64>> = BTreeMap::new();
        let mut skipped = 0usize;
        for (instance, &score) in test.instances().iter().zip(scores) {
            let (Some(user), Some(contact)) = (
                self.graph.index_of(instance.origin()),
                self.graph.index_of(instance.destination()),
            ) else {
                skipped += 1;
                continue;
            };
            let candidates = by_user.entry(instance.origin()).or_default();
            if self.filter.accepts(user, contact) {
                candidates.insert(contact, score);
            }
        }
        if skipped > 0 {
            log::warn!("{} test rows name vertices outside the training graph", skipped);
        }

        let rankings = by_user
            .into_iter()
            .map(|(user, candidates)| {
                let mut ranking: Vec<(u32, f64)> = candidates.into_iter().collect();
                sort_ranking(&mut ranking);
                ranking.truncate(self.cutoff);
                UserRanking {
                    user,
                    contacts: ranking.into_iter().map(|(v, s)| (self.graph.label_of(v), s)).collect(),
                }
            })
            .collect();
        Ok(rankings)
    }
}

/// `user Q0 contact rank score run`, tab separated, ranks from 1
pub fn write_trec<W: Write>(writer: &mut W, rankings: &[UserRanking], run: &str) -> std::io::Result<()> {
    for ranking in rankings {
        for (rank, (contact, score)) in ranking.contacts.iter().enumerate() {
            writeln!(writer, "{}\tQ0\t{}\t{}\t{}\t{}", ranking.user, contact, rank + 1, score, run)?;
        }
    }
    Ok(())
}
