//! Core library functions for contact-recommendation LETOR feature generation

pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod letor;
pub mod recommender;
pub mod sampling;
pub mod similarity;
pub mod storage;

pub use anyhow::{anyhow, Result};
