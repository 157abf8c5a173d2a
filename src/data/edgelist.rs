//! Tab-separated edge list handling for graph data

use crate::error::ParseError;
use crate::graph::{GraphBuilder, IndexedGraph};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Load a `source \t destination [\t weight]` edge list
pub fn load_edge_list(path: impl AsRef<Path>, directed: bool, weighted: bool) -> Result<IndexedGraph> {
    let path = path.as_ref();
    log::info!("Reading edge list: {}", path.display());

    let file = File::open(path).with_context(|| format!("File not found: {}", path.display()))?;
    let graph = read_edge_list(BufReader::new(file), path, directed, weighted)?;

    log::info!(
        "Loaded graph with {} nodes and {} edges ({}, {})",
        graph.node_count,
        graph.edge_count(),
        if directed { "directed" } else { "undirected" },
        if weighted { "weighted" } else { "unweighted" },
    );
    Ok(graph)
}

/// Parse an edge list from any reader; `origin` only labels error messages
pub fn read_edge_list<R: BufRead>(
    reader: R,
    origin: &Path,
    directed: bool,
    weighted: bool,
) -> Result<IndexedGraph> {
    let mut builder = GraphBuilder::new(directed, weighted);

    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed reading {}", origin.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (src, dst, weight) = parse_edge(trimmed)
            .map_err(|message| ParseError::line(origin, number + 1, message))?;
        builder.add_edge(src, dst, weight);
    }

    Ok(builder.build())
}

fn parse_edge(line: &str) -> std::result::Result<(u64, u64, f64), String> {
    let mut fields = line.split('\t');
    let src = parse_label(fields.next())?;
    let dst = parse_label(fields.next())?;
    let weight = match fields.next().map(str::trim) {
        None | Some("") => 1.0,
        Some(w) => w
            .parse::<f64>()
            .map_err(|_| format!("invalid edge weight `{w}`"))?,
    };
    if !weight.is_finite() {
        return Err(format!("edge weight must be finite, got {weight}"));
    }
    Ok((src, dst, weight))
}

fn parse_label(field: Option<&str>) -> std::result::Result<u64, String> {
    let field = field.map(str::trim).ok_or("expected source and destination columns")?;
    field
        .parse::<u64>()
        .map_err(|_| format!("invalid vertex identifier `{field}`"))
}
