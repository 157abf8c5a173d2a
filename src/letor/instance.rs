//! Labeled feature rows and their column descriptions

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeatureType {
    Continuous,
    Discrete,
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureType::Continuous => f.write_str("CONTINUOUS"),
            FeatureType::Discrete => f.write_str("DISCRETE"),
        }
    }
}

impl FromStr for FeatureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONTINUOUS" => Ok(FeatureType::Continuous),
            "DISCRETE" => Ok(FeatureType::Discrete),
            other => Err(format!("unknown feature type `{other}`")),
        }
    }
}

/// Ordered feature columns with the value range seen so far
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureInformation {
    names: Vec<String>,
    types: Vec<FeatureType>,
    min: Vec<f64>,
    max: Vec<f64>,
}

impl FeatureInformation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column; names must be unique
    pub fn add_feature(&mut self, name: impl Into<String>, feature_type: FeatureType) -> Result<(), ConfigError> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(ConfigError::DuplicateFeature(name));
        }
        self.names.push(name);
        self.types.push(feature_type);
        self.min.push(f64::INFINITY);
        self.max.push(f64::NEG_INFINITY);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    pub fn feature_type(&self, index: usize) -> FeatureType {
        self.types[index]
    }

    /// Smallest value inserted so far, `+inf` before any row
    pub fn min(&self, index: usize) -> f64 {
        self.min[index]
    }

    pub fn max(&self, index: usize) -> f64 {
        self.max[index]
    }

    /// (name, type) pairs in column order
    pub fn features(&self) -> impl Iterator<Item = (&str, FeatureType)> + '_ {
        self.names.iter().map(String::as_str).zip(self.types.iter().copied())
    }

    fn update(&mut self, values: &[f64]) {
        for (i, &value) in values.iter().enumerate() {
            self.min[i] = self.min[i].min(value);
            self.max[i] = self.max[i].max(value);
        }
    }
}

/// One (query, candidate) row
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    origin: u64,
    destination: u64,
    values: Vec<f64>,
    category: i32,
}

impl Instance {
    pub fn new(origin: u64, destination: u64, values: Vec<f64>, category: i32) -> Self {
        Self {
            origin,
            destination,
            values,
            category,
        }
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }

    pub fn destination(&self) -> u64 {
        self.destination
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn category(&self) -> i32 {
        self.category
    }
}

/// Rows sharing one column layout, in emission order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstanceSet {
    info: FeatureInformation,
    /// Comment lines read from a file, kept verbatim
    header: Vec<String>,
    instances: Vec<Instance>,
}

impl InstanceSet {
    pub fn new(info: FeatureInformation) -> Self {
        Self {
            info,
            header: Vec::new(),
            instances: Vec::new(),
        }
    }

    pub fn with_header(info: FeatureInformation, header: Vec<String>) -> Self {
        Self {
            info,
            header,
            instances: Vec::new(),
        }
    }

    /// Appends a row and widens the column ranges
    ///
    /// # Panics
    ///
    /// If the row does not have one value per column.
    pub fn add(&mut self, instance: Instance) {
        assert_eq!(
            instance.values.len(),
            self.info.len(),
            "instance has {} values for {} features",
            instance.values.len(),
            self.info.len()
        );
        self.info.update(&instance.values);
        self.instances.push(instance);
    }

    pub fn info(&self) -> &FeatureInformation {
        &self.info
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of rows with a positive category
    pub fn positives(&self) -> usize {
        self.instances.iter().filter(|i| i.category > 0).count()
    }

    /// The same rows restricted to the first `count` columns
    pub fn prefix(&self, count: usize) -> InstanceSet {
        let count = count.min(self.info.len());
        let mut info = FeatureInformation::new();
        for (name, feature_type) in self.info.features().take(count) {
            // names were already unique
            let _ = info.add_feature(name, feature_type);
        }
        let mut set = InstanceSet::new(info);
        for instance in &self.instances {
            set.add(Instance::new(
                instance.origin,
                instance.destination,
                instance.values[..count].to_vec(),
                instance.category,
            ));
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_follow_insertions() {
        let mut info = FeatureInformation::new();
        info.add_feature("a", FeatureType::Continuous).unwrap();
        info.add_feature("b", FeatureType::Discrete).unwrap();
        assert_eq!(
            info.add_feature("a", FeatureType::Discrete),
            Err(ConfigError::DuplicateFeature("a".into()))
        );

        let mut set = InstanceSet::new(info);
        set.add(Instance::new(1, 2, vec![0.5, 3.0], 1));
        set.add(Instance::new(1, 3, vec![-1.0, 2.0], 0));
        assert_eq!(set.info().min(0), -1.0);
        assert_eq!(set.info().max(1), 3.0);
        assert_eq!(set.positives(), 1);
    }

    #[test]
    fn prefixes_recompute_their_ranges() {
        let mut info = FeatureInformation::new();
        info.add_feature("a", FeatureType::Continuous).unwrap();
        info.add_feature("b", FeatureType::Discrete).unwrap();
        let mut set = InstanceSet::new(info);
        set.add(Instance::new(1, 2, vec![0.5, 3.0], 1));
        set.add(Instance::new(1, 3, vec![-1.0, 2.0], 0));

        let first = set.prefix(1);
        assert_eq!(first.info().len(), 1);
        assert_eq!(first.info().name(0), "a");
        assert_eq!(first.info().min(0), -1.0);
        assert_eq!(first.instances()[1], Instance::new(1, 3, vec![-1.0], 0));
        assert_eq!(set.prefix(5).instances(), set.instances());
    }

    #[test]
    #[should_panic(expected = "1 values for 2 features")]
    fn short_rows_are_rejected() {
        let mut info = FeatureInformation::new();
        info.add_feature("a", FeatureType::Continuous).unwrap();
        info.add_feature("b", FeatureType::Continuous).unwrap();
        InstanceSet::new(info).add(Instance::new(1, 2, vec![0.0], 0));
    }

    #[test]
    fn feature_types_round_trip_through_text() {
        for t in [FeatureType::Continuous, FeatureType::Discrete] {
            assert_eq!(t.to_string().parse::<FeatureType>(), Ok(t));
        }
        assert!("ordinal".parse::<FeatureType>().is_err());
    }
}
