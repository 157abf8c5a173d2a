//! LETOR text format
//!
//! ```text
//! # 1	MCN_OUT_IN	CONTINUOUS
//! 1 qid:17 1:3 #docid:42
//! ```

use super::instance::{FeatureInformation, FeatureType, Instance, InstanceSet};
use crate::error::ParseError;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

const QID: &str = "qid:";
const DOCID: &str = "docid:";
const COMMENT: char = '#';

/// Writes the feature header followed by one line per instance
pub fn write_instances<W: Write>(writer: &mut W, set: &InstanceSet) -> std::io::Result<()> {
    for (i, (name, feature_type)) in set.info().features().enumerate() {
        writeln!(writer, "{COMMENT} {}\t{}\t{}", i + 1, name, feature_type)?;
    }
    for instance in set.instances() {
        write!(writer, "{} {}{}", instance.category(), QID, instance.origin())?;
        for (i, value) in instance.values().iter().enumerate() {
            write!(writer, " {}:{}", i + 1, value)?;
        }
        writeln!(writer, " {COMMENT}{}{}", DOCID, instance.destination())?;
    }
    Ok(())
}

/// Feature description table: index, name and observed range of each column
pub fn write_feature_info<W: Write>(writer: &mut W, info: &FeatureInformation) -> std::io::Result<()> {
    writeln!(writer, "FeatureIndex\tname\tMin\tMax")?;
    for i in 0..info.len() {
        writeln!(writer, "{}\t{}\t{}\t{}", i + 1, info.name(i), info.min(i), info.max(i))?;
    }
    Ok(())
}

/// Column ranges jforests bins on, merged over the training and validation sets
///
/// Both sets must share their columns; names follow `train`.
pub fn write_feature_stats<W: Write>(
    writer: &mut W,
    train: &FeatureInformation,
    valid: &FeatureInformation,
) -> std::io::Result<()> {
    writeln!(writer, "FeatureIndex\tname\tMin\tMax")?;
    for i in 0..train.len().min(valid.len()) {
        let min = train.min(i).min(valid.min(i));
        let max = train.max(i).max(valid.max(i));
        writeln!(writer, "{}\t{}\t{}\t{}", i + 1, train.name(i), min, max)?;
    }
    Ok(())
}

pub fn load_instances(path: impl AsRef<Path>) -> Result<InstanceSet> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let set = read_instances(BufReader::new(file), path)?;
    log::info!(
        "Read {} instances with {} features from {}",
        set.len(),
        set.info().len(),
        path.display()
    );
    Ok(set)
}

/// Parses an instance set; `origin` only labels errors
pub fn read_instances<R: BufRead>(reader: R, origin: &Path) -> Result<InstanceSet, ParseError> {
    let mut header = Vec::new();
    let mut declared = FeatureInformation::new();
    let mut set: Option<InstanceSet> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.map_err(|e| ParseError::line(origin, line_no, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with(COMMENT) {
            if set.is_some() {
                return Err(ParseError::line(origin, line_no, "header line after the first instance"));
            }
            if let Some((name, feature_type)) = parse_feature_line(trimmed) {
                declared
                    .add_feature(name, feature_type)
                    .map_err(|e| ParseError::line(origin, line_no, e.to_string()))?;
            }
            header.push(line);
            continue;
        }

        let instance = parse_instance(trimmed).map_err(|message| ParseError::line(origin, line_no, message))?;
        let set = set.get_or_insert_with(|| {
            let info = if declared.is_empty() {
                numbered_features(instance.values().len())
            } else {
                std::mem::take(&mut declared)
            };
            InstanceSet::with_header(info, std::mem::take(&mut header))
        });
        if instance.values().len() != set.info().len() {
            return Err(ParseError::line(
                origin,
                line_no,
                format!("expected {} features, found {}", set.info().len(), instance.values().len()),
            ));
        }
        set.add(instance);
    }

    Ok(set.unwrap_or_else(|| InstanceSet::with_header(declared, header)))
}

/// `# <index>\t<name>\t<TYPE>`
fn parse_feature_line(line: &str) -> Option<(String, FeatureType)> {
    let body = line.trim_start_matches(COMMENT).trim();
    let mut parts = body.split('\t');
    let _index: usize = parts.next()?.trim().parse().ok()?;
    let name = parts.next()?.trim();
    let feature_type = parts.next()?.parse().ok()?;
    if name.is_empty() || parts.next().is_some() {
        return None;
    }
    Some((name.to_string(), feature_type))
}

fn numbered_features(count: usize) -> FeatureInformation {
    let mut info = FeatureInformation::new();
    for i in 1..=count {
        // generated names are distinct
        let _ = info.add_feature(format!("feature{i}"), FeatureType::Continuous);
    }
    info
}

fn parse_instance(line: &str) -> Result<Instance, String> {
    let (body, comment) = match line.split_once(COMMENT) {
        Some((body, comment)) => (body, comment.trim()),
        None => return Err("missing #docid comment".to_string()),
    };
    let destination = comment
        .strip_prefix(DOCID)
        .ok_or_else(|| format!("expected `{DOCID}` in comment, found `{comment}`"))?
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid docid: {e}"))?;

    let mut tokens = body.split_whitespace();
    let category = tokens
        .next()
        .ok_or("empty line")?
        .parse::<i32>()
        .map_err(|e| format!("invalid category: {e}"))?;
    let origin = tokens
        .next()
        .and_then(|t| t.strip_prefix(QID))
        .ok_or("missing qid")?
        .parse::<u64>()
        .map_err(|e| format!("invalid qid: {e}"))?;

    let mut values = Vec::new();
    for (expected, token) in tokens.enumerate() {
        let (index, value) = token
            .split_once(':')
            .ok_or_else(|| format!("malformed feature `{token}`"))?;
        let index: usize = index.parse().map_err(|_| format!("malformed feature index `{index}`"))?;
        if index != expected + 1 {
            return Err(format!("feature {index} out of order, expected {}", expected + 1));
        }
        values.push(value.parse::<f64>().map_err(|e| format!("invalid value for feature {index}: {e}"))?);
    }

    Ok(Instance::new(origin, destination, values, category))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_set() -> InstanceSet {
        let mut info = FeatureInformation::new();
        info.add_feature("MCN_OUT_IN", FeatureType::Continuous).unwrap();
        info.add_feature("Popularity", FeatureType::Discrete).unwrap();
        let mut set = InstanceSet::new(info);
        set.add(Instance::new(17, 42, vec![3.0, 0.125], 1));
        set.add(Instance::new(17, 8, vec![0.0, -2.5e-7], 0));
        set
    }

    #[test]
    fn writes_header_and_rows() {
        let mut out = Vec::new();
        write_instances(&mut out, &sample_set()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "# 1\tMCN_OUT_IN\tCONTINUOUS\n\
             # 2\tPopularity\tDISCRETE\n\
             1 qid:17 1:3 2:0.125 #docid:42\n\
             0 qid:17 1:0 2:-0.00000025 #docid:8\n"
        );
    }

    #[test]
    fn reads_what_it_writes() {
        let set = sample_set();
        let mut out = Vec::new();
        write_instances(&mut out, &set).unwrap();
        let back = read_instances(out.as_slice(), Path::new("mem")).unwrap();
        assert_eq!(back.instances(), set.instances());
        assert_eq!(back.info(), set.info());
        assert_eq!(back.header().len(), 2);
    }

    #[test]
    fn unnamed_features_get_numbered() {
        let text = "# produced elsewhere\n0 qid:1 1:0.5 2:1 #docid:2\n";
        let set = read_instances(text.as_bytes(), Path::new("mem")).unwrap();
        assert_eq!(set.info().name(1), "feature2");
        assert_eq!(set.header(), ["# produced elsewhere".to_string()]);
    }

    #[test]
    fn reports_the_offending_line() {
        let text = "1 qid:1 1:0.5 #docid:2\n1 qid:1 2:0.5 #docid:3\n";
        let err = read_instances(text.as_bytes(), Path::new("set.letor")).unwrap_err();
        assert!(err.to_string().starts_with("set.letor:2:"), "{err}");
    }

    #[test]
    fn feature_info_table() {
        let mut out = Vec::new();
        write_feature_info(&mut out, sample_set().info()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "FeatureIndex\tname\tMin\tMax\n1\tMCN_OUT_IN\t0\t3\n2\tPopularity\t-0.00000025\t0.125\n"
        );
    }

    #[test]
    fn feature_stats_span_training_and_validation() {
        let train = sample_set();
        let mut info = FeatureInformation::new();
        info.add_feature("MCN_OUT_IN", FeatureType::Continuous).unwrap();
        info.add_feature("Popularity", FeatureType::Discrete).unwrap();
        let mut valid = InstanceSet::new(info);
        valid.add(Instance::new(3, 4, vec![5.0, 0.5], 0));

        let mut out = Vec::new();
        write_feature_stats(&mut out, train.info(), valid.info()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "FeatureIndex\tname\tMin\tMax\n1\tMCN_OUT_IN\t0\t5\n2\tPopularity\t-0.00000025\t0.5\n"
        );
    }
}
