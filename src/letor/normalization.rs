//! Per-query score normalization

use crate::error::ConfigError;
use crate::recommender::sort_ranking;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    #[default]
    None,
    /// Rank position mapped onto (0, 1]
    Ranksim,
    MinMax,
    ZScore,
}

impl Normalization {
    /// Normalized copy of one query's (candidate, score) list
    pub fn apply(self, scores: &[(u32, f64)]) -> Vec<(u32, f64)> {
        match self {
            Normalization::None => scores.to_vec(),
            Normalization::Ranksim => {
                let mut ranking = scores.to_vec();
                sort_ranking(&mut ranking);
                let len = ranking.len() as f64;
                ranking
                    .into_iter()
                    .enumerate()
                    .map(|(i, (v, _))| (v, (len - i as f64) / len))
                    .collect()
            }
            Normalization::MinMax => {
                let min = Statistics::min(scores.iter().map(|s| s.1));
                let max = Statistics::max(scores.iter().map(|s| s.1));
                let range = max - min;
                scores
                    .iter()
                    .map(|&(v, s)| (v, if range > 0.0 { (s - min) / range } else { 0.0 }))
                    .collect()
            }
            Normalization::ZScore => {
                let mean = scores.iter().map(|s| s.1).mean();
                let sigma = scores.iter().map(|s| s.1).population_std_dev();
                scores
                    .iter()
                    .map(|&(v, s)| (v, if sigma > 0.0 { (s - mean) / sigma } else { 0.0 }))
                    .collect()
            }
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Normalization::None => "none",
            Normalization::Ranksim => "ranksim",
            Normalization::MinMax => "minmax",
            Normalization::ZScore => "zscore",
        };
        f.write_str(name)
    }
}

impl FromStr for Normalization {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Normalization::None),
            "ranksim" => Ok(Normalization::Ranksim),
            "minmax" => Ok(Normalization::MinMax),
            "zscore" | "z-score" => Ok(Normalization::ZScore),
            _ => Err(ConfigError::UnknownNormalization(s.to_string())),
        }
    }
}
