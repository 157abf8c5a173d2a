//! Merging the feature columns of two instance sets over the same pairs

use super::instance::{FeatureInformation, Instance, InstanceSet};
use anyhow::{bail, Result};
use std::collections::HashMap;

/// Column selection; `None` keeps every column
pub type Selection<'a> = Option<&'a [usize]>;

fn resolve(selection: Selection<'_>, info: &FeatureInformation) -> Result<Vec<usize>> {
    match selection {
        None => Ok((0..info.len()).collect()),
        Some(indices) => {
            if let Some(&bad) = indices.iter().find(|&&i| i >= info.len()) {
                bail!("Feature index {} out of range ({} features)", bad, info.len());
            }
            Ok(indices.to_vec())
        }
    }
}

/// `name`, or a suffixed variant when the combined set already has a column by that name
fn distinct_name(info: &FeatureInformation, name: &str, side: &str) -> String {
    if !info.contains(name) {
        return name.to_string();
    }
    let base = format!("{name}_{side}");
    std::iter::once(base.clone())
        .chain((2..).map(|k| format!("{base}{k}")))
        .find(|candidate| !info.contains(candidate))
        .unwrap_or(base)
}

/// Rows present in both sets, with the first set's category and the selected columns
/// of the first set followed by those of the second
pub fn combine(
    first: &InstanceSet,
    first_selection: Selection<'_>,
    second: &InstanceSet,
    second_selection: Selection<'_>,
) -> Result<InstanceSet> {
    let first_columns = resolve(first_selection, first.info())?;
    let second_columns = resolve(second_selection, second.info())?;

    let mut info = FeatureInformation::new();
    for (set, columns, side) in [(first, &first_columns, "first"), (second, &second_columns, "second")] {
        for &i in columns {
            let name = distinct_name(&info, set.info().name(i), side);
            info.add_feature(name, set.info().feature_type(i))?;
        }
    }

    let lookup: HashMap<(u64, u64), &Instance> = second
        .instances()
        .iter()
        .map(|instance| ((instance.origin(), instance.destination()), instance))
        .collect();

    let mut combined = InstanceSet::new(info);
    let mut unmatched = 0usize;
    for instance in first.instances() {
        let Some(other) = lookup.get(&(instance.origin(), instance.destination())) else {
            unmatched += 1;
            continue;
        };
        let values = first_columns
            .iter()
            .map(|&i| instance.values()[i])
            .chain(second_columns.iter().map(|&i| other.values()[i]))
            .collect();
        combined.add(Instance::new(
            instance.origin(),
            instance.destination(),
            values,
            instance.category(),
        ));
    }

    if unmatched > 0 {
        log::warn!("{} rows of the first set have no counterpart in the second", unmatched);
    }
    log::info!(
        "Combined {} rows with {} features",
        combined.len(),
        combined.info().len()
    );
    Ok(combined)
}

/// Parses `1,3,4`; `-1` or an empty list selects every column
pub fn parse_selection(text: &str) -> Result<Option<Vec<usize>>> {
    let text = text.trim();
    if text.is_empty() || text == "-1" {
        return Ok(None);
    }
    let indices = text
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|e| anyhow::anyhow!("Invalid feature index `{}`: {}", part, e))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(indices))
}
