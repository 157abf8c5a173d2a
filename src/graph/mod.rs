//! Graph representation and neighborhood queries

pub mod compressed;
pub mod builder;

pub use compressed::{IndexedGraph, Neighbors};
pub use builder::GraphBuilder;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of an edge a neighborhood query follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeOrientation {
    #[serde(rename = "OUT")]
    Out,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "UND", alias = "UNDIRECTED")]
    Und,
}

impl EdgeOrientation {
    /// OUT and IN swap, UND stays
    pub fn invert(self) -> Self {
        match self {
            EdgeOrientation::Out => EdgeOrientation::In,
            EdgeOrientation::In => EdgeOrientation::Out,
            EdgeOrientation::Und => EdgeOrientation::Und,
        }
    }
}

impl fmt::Display for EdgeOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeOrientation::Out => "OUT",
            EdgeOrientation::In => "IN",
            EdgeOrientation::Und => "UND",
        };
        f.write_str(name)
    }
}

impl FromStr for EdgeOrientation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OUT" => Ok(EdgeOrientation::Out),
            "IN" => Ok(EdgeOrientation::In),
            "UND" | "UNDIRECTED" => Ok(EdgeOrientation::Und),
            _ => Err(ConfigError::UnknownOrientation(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_is_an_involution() {
        for o in [EdgeOrientation::Out, EdgeOrientation::In, EdgeOrientation::Und] {
            assert_eq!(o.invert().invert(), o);
        }
        assert_eq!(EdgeOrientation::Out.invert(), EdgeOrientation::In);
        assert_eq!(EdgeOrientation::Und.invert(), EdgeOrientation::Und);
    }

    #[test]
    fn parses_display_names() {
        assert_eq!("out".parse::<EdgeOrientation>().unwrap(), EdgeOrientation::Out);
        assert_eq!("UNDIRECTED".parse::<EdgeOrientation>().unwrap(), EdgeOrientation::Und);
        assert_eq!(EdgeOrientation::In.to_string(), "IN");
        assert!("sideways".parse::<EdgeOrientation>().is_err());
    }
}
