//! Configuration for LETOR feature generation

use crate::error::ConfigError;
use crate::letor::Normalization;
use crate::recommender::AlgorithmConfig;
use crate::sampling::SamplerConfig;
use anyhow::{Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options of a generation run that do not depend on the scorer list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Whether the input graphs are directed
    pub directed: bool,

    /// Whether edge weights are read for the sampling graph
    pub weighted_sampling: bool,

    /// Whether edge weights are read for the graph the features are computed on
    pub weighted_features: bool,

    /// Per-query normalization applied to every feature
    pub normalization: Normalization,

    /// Drop candidates that already link to the query
    pub exclude_reciprocal: bool,

    /// Seed of the random filler
    pub filler_seed: u64,

    /// Remove self-loops from the loaded graphs
    pub remove_self_loops: bool,

    /// Skip the training set
    pub only_test: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            directed: true,
            weighted_sampling: false,
            weighted_features: false,
            normalization: Normalization::None,
            exclude_reciprocal: true,
            filler_seed: 0,
            remove_self_loops: false,
            only_test: false,
        }
    }
}

/// Scorers and samplers of a run, as read from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub algorithms: Vec<AlgorithmConfig>,
    #[serde(default)]
    pub train_sampler: Option<SamplerConfig>,
    pub test_sampler: SamplerConfig,
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config: RunConfig =
            serde_json::from_str(&text).with_context(|| format!("Invalid run configuration {}", path.display()))?;
        log::info!(
            "Loaded {} algorithms from {}",
            config.algorithms.len(),
            path.display()
        );
        Ok(config)
    }

    /// Checks every scorer and sampler; `needs_train` requires a training sampler
    pub fn validate(&self, needs_train: bool) -> Result<(), ConfigError> {
        if self.algorithms.is_empty() {
            return Err(ConfigError::NoAlgorithms);
        }

        for algorithm in &self.algorithms {
            algorithm.validate()?;
        }
        if let Some(name) = self.algorithms.iter().map(AlgorithmConfig::name).duplicates().next() {
            return Err(ConfigError::DuplicateFeature(name));
        }

        match &self.train_sampler {
            Some(sampler) => sampler.validate()?,
            None if needs_train => return Err(ConfigError::MissingSampler("train")),
            None => {}
        }
        self.test_sampler.validate()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.algorithms.iter().map(AlgorithmConfig::name).collect()
    }
}
