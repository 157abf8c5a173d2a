//! Per-query candidate sampling

pub mod distance_two;
pub mod recommender;

pub use distance_two::{DistanceTwoLinkPredictionSampler, DistanceTwoSampler};
pub use recommender::RecommenderSampler;

use crate::error::ConfigError;
use crate::graph::{EdgeOrientation, IndexedGraph};
use crate::recommender::AlgorithmConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Chooses the candidates of one query vertex
pub trait IndividualSampler: Send + Sync {
    /// Candidates of `query` passing `filter`, in index order
    fn sample(&self, query: u32, filter: &dyn Fn(u32) -> bool) -> BTreeSet<u32>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sampler", rename_all = "snake_case")]
pub enum SamplerConfig {
    DistanceTwo {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
    },
    #[serde(rename = "distance_two_link_prediction")]
    DistanceTwoLinkPrediction {
        u_sel: EdgeOrientation,
        v_sel: EdgeOrientation,
        #[serde(default)]
        seed: u64,
    },
    Recommender {
        recommender: AlgorithmConfig,
        k: usize,
    },
}

impl SamplerConfig {
    pub fn name(&self) -> String {
        match self {
            SamplerConfig::DistanceTwo { u_sel, v_sel } => format!("distance-two_{u_sel}_{v_sel}"),
            SamplerConfig::DistanceTwoLinkPrediction { u_sel, v_sel, .. } => {
                format!("distance-two-lp_{u_sel}_{v_sel}")
            }
            SamplerConfig::Recommender { recommender, k } => format!("recommender_{}_{k}", recommender.name()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            SamplerConfig::Recommender { recommender, k } => {
                if *k == 0 {
                    return Err(ConfigError::InvalidParameter {
                        algorithm: self.name(),
                        parameter: "k",
                        value: k.to_string(),
                        expected: "at least 1",
                    });
                }
                recommender.validate()
            }
            _ => Ok(()),
        }
    }

    /// Resolves the sampler over the sampling graph; `truth` labels link-prediction positives
    pub fn build<'g>(
        &self,
        graph: &'g IndexedGraph,
        truth: &'g IndexedGraph,
    ) -> Result<Box<dyn IndividualSampler + 'g>, ConfigError> {
        self.validate()?;
        let sampler: Box<dyn IndividualSampler + 'g> = match self {
            SamplerConfig::DistanceTwo { u_sel, v_sel } => Box::new(DistanceTwoSampler::new(graph, *u_sel, *v_sel)),
            SamplerConfig::DistanceTwoLinkPrediction { u_sel, v_sel, seed } => Box::new(
                DistanceTwoLinkPredictionSampler::new(graph, truth, *u_sel, *v_sel, *seed),
            ),
            SamplerConfig::Recommender { recommender, k } => {
                Box::new(RecommenderSampler::new(recommender.build(graph)?, *k))
            }
        };
        Ok(sampler)
    }
}
