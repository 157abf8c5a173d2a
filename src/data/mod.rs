//! Graph input and preprocessing

pub mod edgelist;
pub mod preprocessing;
