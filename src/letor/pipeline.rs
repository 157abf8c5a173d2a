//! End-to-end feature generation
//!
//! Sample candidates per query, score every sampled pair with every configured
//! algorithm in parallel, normalize per query, and join the scores into labeled rows.

use super::instance::{FeatureInformation, FeatureType, Instance, InstanceSet};
use super::normalization::Normalization;
use crate::config::{GeneratorConfig, RunConfig};
use crate::data::edgelist::load_edge_list;
use crate::data::preprocessing::remove_self_loops;
use crate::graph::{EdgeOrientation, IndexedGraph};
use crate::recommender::{AlgorithmConfig, CandidateFilter, RandomFiller};
use crate::sampling::SamplerConfig;
use crate::storage::{self, SplitSummary};
use anyhow::{bail, Result};
use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Join key of a (query, candidate) pair
///
/// Equality and hashing ignore orientation, so `(a, b)` and `(b, a)` are one pair; the
/// orientation it was created with is kept for labeling.
#[derive(Debug, Clone, Copy)]
pub struct Pair {
    query: u32,
    candidate: u32,
}

impl Pair {
    pub fn new(query: u32, candidate: u32) -> Self {
        Self { query, candidate }
    }

    pub fn query(&self) -> u32 {
        self.query
    }

    pub fn candidate(&self) -> u32 {
        self.candidate
    }

    fn key(&self) -> (u32, u32) {
        (self.query.min(self.candidate), self.query.max(self.candidate))
    }
}

impl PartialEq for Pair {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Pair {}

impl Hash for Pair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Counters of one generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationStats {
    pub queries: usize,
    pub sampled_pairs: usize,
    pub instances: usize,
    pub positives: usize,
    /// Pairs some scorer produced no value for
    pub dropped_pairs: usize,
}

/// Produces instance sets for a fixed list of scorers
pub struct FeatureGenerator<'a> {
    algorithms: &'a [AlgorithmConfig],
    normalization: Normalization,
    exclude_reciprocal: bool,
    filler: RandomFiller,
}

impl<'a> FeatureGenerator<'a> {
    pub fn new(algorithms: &'a [AlgorithmConfig], config: &GeneratorConfig) -> Self {
        Self {
            algorithms,
            normalization: config.normalization,
            exclude_reciprocal: config.exclude_reciprocal,
            filler: RandomFiller::new(config.filler_seed),
        }
    }

    /// Feature columns, one per scorer in registration order
    pub fn feature_information(&self) -> Result<FeatureInformation> {
        let mut info = FeatureInformation::new();
        for algorithm in self.algorithms {
            info.add_feature(algorithm.name(), FeatureType::Continuous)?;
        }
        Ok(info)
    }

    /// Builds the instance set for one split
    ///
    /// `sampling` provides candidates, `features` is scored (same vertices in the same
    /// order, possibly weighted differently) and `truth` labels the pairs.
    pub fn generate(
        &self,
        sampling: &IndexedGraph,
        features: &IndexedGraph,
        truth: &IndexedGraph,
        sampler: &SamplerConfig,
    ) -> Result<(InstanceSet, GenerationStats)> {
        if sampling.labels() != features.labels() {
            bail!("Feature graph vertices differ from the sampling graph vertices");
        }
        let info = self.feature_information()?;
        let mut stats = GenerationStats::default();

        // 1. Queries: vertices with future links that exist today
        let queries: Vec<u32> = truth
            .vertices()
            .filter(|&v| truth.degree(v, EdgeOrientation::Out) > 0)
            .filter_map(|v| sampling.index_of(truth.label_of(v)))
            .collect();
        stats.queries = queries.len();
        log::info!("Generating features for {} queries", queries.len());

        // 2. Candidates
        let candidates = self.sample(sampling, truth, sampler, &queries)?;
        let (pairs, registered) = pair_list(&queries, &candidates);
        stats.sampled_pairs = pairs.len();
        log::info!("Sampled {} pairs with {}", pairs.len(), sampler.name());

        // 3. Scores, one task per algorithm
        let scores = self
            .algorithms
            .par_iter()
            .map(|algorithm| self.score_pairs(algorithm, features, &queries, &candidates, &registered))
            .collect::<Result<Vec<HashMap<Pair, f64>>>>()?;

        // 4. Join
        let mut set = InstanceSet::new(info);
        for pair in &pairs {
            let values: Option<Vec<f64>> = scores.iter().map(|map| map.get(pair).copied()).collect();
            let Some(values) = values else {
                stats.dropped_pairs += 1;
                continue;
            };
            let origin = sampling.label_of(pair.query());
            let destination = sampling.label_of(pair.candidate());
            let category = i32::from(truth.contains_edge_labels(origin, destination));
            set.add(Instance::new(origin, destination, values, category));
        }

        if stats.dropped_pairs > 0 {
            log::warn!("Dropped {} pairs with incomplete features", stats.dropped_pairs);
        }
        stats.instances = set.len();
        stats.positives = set.positives();
        log::info!(
            "Generated {} instances ({} positive)",
            stats.instances,
            stats.positives
        );
        Ok((set, stats))
    }

    fn sample(
        &self,
        sampling: &IndexedGraph,
        truth: &IndexedGraph,
        sampler: &SamplerConfig,
        queries: &[u32],
    ) -> Result<HashMap<u32, BTreeSet<u32>>> {
        let start = Instant::now();
        let sampler = sampler.build(sampling, truth)?;
        let filter = CandidateFilter::new(sampling, self.exclude_reciprocal);

        let cache: DashMap<u32, BTreeSet<u32>> = DashMap::with_capacity(queries.len());
        queries.par_iter().for_each(|&query| {
            let sample = sampler.sample(query, &filter.for_query(query));
            log::debug!("Query {}: {} candidates", sampling.label_of(query), sample.len());
            cache.insert(query, sample);
        });

        log::info!("Sampling took {:?}", start.elapsed());
        Ok(cache.into_iter().collect())
    }

    /// Normalized score of every registered pair reachable by one algorithm
    fn score_pairs(
        &self,
        algorithm: &AlgorithmConfig,
        graph: &IndexedGraph,
        queries: &[u32],
        candidates: &HashMap<u32, BTreeSet<u32>>,
        registered: &HashSet<Pair>,
    ) -> Result<HashMap<Pair, f64>> {
        let start = Instant::now();
        let name = algorithm.name();
        log::info!("Starting {}", name);

        let recommender = algorithm.build(graph)?;
        let mut values = HashMap::new();

        for &query in queries {
            let Some(pool) = candidates.get(&query) else {
                continue;
            };
            if pool.is_empty() {
                continue;
            }

            let scored = recommender.query_scores(query);
            let mut ranking = scored.ranking(&|v: u32| pool.contains(&v), pool.len());
            if ranking.len() < pool.len() {
                let dense = scored.into_score_fn(&*recommender, query);
                ranking = self.filler.fill(query, ranking, pool.iter().copied(), pool.len(), &*dense);
            }

            for (candidate, value) in self.normalization.apply(&ranking) {
                match registered.get(&Pair::new(query, candidate)) {
                    Some(pair) if pair.query() == query => {
                        values.insert(*pair, value);
                    }
                    _ => {}
                }
            }
        }

        log::info!("Finished {} in {:?}", name, start.elapsed());
        Ok(values)
    }
}

/// Pairs in query order then candidate order; the first orientation seen wins
fn pair_list(queries: &[u32], candidates: &HashMap<u32, BTreeSet<u32>>) -> (Vec<Pair>, HashSet<Pair>) {
    let mut pairs = Vec::new();
    let mut seen = HashSet::new();
    for query in queries {
        let Some(pool) = candidates.get(query) else {
            continue;
        };
        for &candidate in pool {
            let pair = Pair::new(*query, candidate);
            if seen.insert(pair) {
                pairs.push(pair);
            }
        }
    }
    (pairs, seen)
}

/// Input and output locations of a full `generate` run
#[derive(Debug, Clone)]
pub struct GenerationPaths {
    pub train_instances: PathBuf,
    pub train_classes: PathBuf,
    pub test_instances: PathBuf,
    pub test_classes: PathBuf,
    pub train_output: PathBuf,
    pub test_output: PathBuf,
    pub feature_info: PathBuf,
    pub summary: Option<PathBuf>,
}

fn load_graph(path: &Path, directed: bool, weighted: bool, config: &GeneratorConfig) -> Result<IndexedGraph> {
    let graph = load_edge_list(path, directed, weighted)?;
    Ok(if config.remove_self_loops {
        remove_self_loops(&graph)
    } else {
        graph
    })
}

fn generate_split(
    generator: &FeatureGenerator<'_>,
    config: &GeneratorConfig,
    instances: &Path,
    classes: &Path,
    sampler: &SamplerConfig,
) -> Result<(InstanceSet, GenerationStats)> {
    let sampling = load_graph(instances, config.directed, config.weighted_sampling, config)?;
    let features = if config.weighted_features != config.weighted_sampling {
        Some(load_graph(instances, config.directed, config.weighted_features, config)?)
    } else {
        None
    };
    let truth = load_graph(classes, config.directed, false, config)?;
    generator.generate(&sampling, features.as_ref().unwrap_or(&sampling), &truth, sampler)
}

/// Training set, test set and feature description of a run
pub fn generate_files(run: &RunConfig, config: &GeneratorConfig, paths: &GenerationPaths) -> Result<Vec<SplitSummary>> {
    run.validate(!config.only_test)?;
    let generator = FeatureGenerator::new(&run.algorithms, config);
    let mut splits = Vec::new();

    if let (false, Some(sampler)) = (config.only_test, &run.train_sampler) {
        log::info!("Generating training set");
        let (set, stats) = generate_split(&generator, config, &paths.train_instances, &paths.train_classes, sampler)?;
        storage::save_instances(&set, &paths.train_output)?;
        storage::save_feature_info(set.info(), &paths.feature_info)?;
        splits.push(SplitSummary {
            name: "train".to_string(),
            output: paths.train_output.clone(),
            stats,
        });
    }

    log::info!("Generating test set");
    let (set, stats) = generate_split(
        &generator,
        config,
        &paths.test_instances,
        &paths.test_classes,
        &run.test_sampler,
    )?;
    storage::save_instances(&set, &paths.test_output)?;
    if config.only_test {
        storage::save_feature_info(set.info(), &paths.feature_info)?;
    }
    splits.push(SplitSummary {
        name: "test".to_string(),
        output: paths.test_output.clone(),
        stats,
    });

    if let Some(summary) = &paths.summary {
        storage::save_summary(&run.feature_names(), &splits, summary)?;
    }
    Ok(splits)
}
