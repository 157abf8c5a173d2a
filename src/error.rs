//! Typed errors for the library layers

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by graph queries
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("vertex index {index} out of range (graph has {count} vertices)")]
    VertexOutOfRange { index: usize, count: usize },
}

/// Malformed input lines, reported with their location
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{path}:{line}: {message}")]
    Line {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl ParseError {
    pub fn line(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        ParseError::Line {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

/// Invalid run configuration, detected before any scoring starts
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{algorithm}: parameter `{parameter}` = {value} is invalid ({expected})")]
    InvalidParameter {
        algorithm: String,
        parameter: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("no algorithms configured")]
    NoAlgorithms,

    #[error("no {0} sampler configured")]
    MissingSampler(&'static str),

    #[error("duplicate feature name `{0}`")]
    DuplicateFeature(String),

    #[error("unknown normalization `{0}` (expected none, ranksim, minmax or zscore)")]
    UnknownNormalization(String),

    #[error("unknown edge orientation `{0}` (expected OUT, IN or UND)")]
    UnknownOrientation(String),
}

/// Failures of the external ranking-model trainer
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("trainer did not produce {0}")]
    MissingOutput(PathBuf),

    #[error("{found} predictions for {expected} test instances")]
    PredictionCount { expected: usize, found: usize },

    #[error("training and validation sets have {train} and {valid} features")]
    FeatureMismatch { train: usize, valid: usize },
}
