//! Learning-to-rank instance generation, storage, training and ranking

pub mod combiner;
pub mod format;
pub mod instance;
pub mod normalization;
pub mod pipeline;
pub mod ranking;
pub mod trainer;

pub use combiner::combine;
pub use instance::{FeatureInformation, FeatureType, Instance, InstanceSet};
pub use normalization::Normalization;
pub use pipeline::{generate_files, FeatureGenerator, GenerationPaths, GenerationStats, Pair};
pub use ranking::{PredictionRanker, UserRanking};
pub use trainer::{train_and_predict, CommandTrainer, ModelHandle, RankTrainer};
