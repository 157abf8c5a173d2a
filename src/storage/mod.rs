//! Results persistence module
//!
//! Every file is written next to its destination under a temporary name and renamed
//! into place once complete.

use crate::letor::format::{write_feature_info, write_feature_stats, write_instances};
use crate::letor::ranking::write_trec;
use crate::letor::{FeatureInformation, GenerationStats, InstanceSet, UserRanking};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, to_string_pretty};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".tmp{}", std::process::id()));
    path.with_file_name(name)
}

/// Runs `fill` against a buffered temporary file, then renames it onto `path`
pub fn write_atomically<F>(path: impl AsRef<Path>, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temporary_sibling(path);
    let result = File::create(&tmp)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            fill(&mut writer)?;
            writer.flush()?;
            writer.get_ref().sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to write {}", path.display()));
    }
    Ok(())
}

/// Save an instance set in LETOR format
pub fn save_instances(set: &InstanceSet, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    log::info!("Saving {} instances to {}", set.len(), path.display());
    write_atomically(path, |w| write_instances(w, set))
}

/// Save the feature description table
pub fn save_feature_info(info: &FeatureInformation, path: impl AsRef<Path>) -> Result<()> {
    write_atomically(path, |w| write_feature_info(w, info))
}

/// Save the merged column ranges the trainer bins features with
pub fn save_feature_stats(train: &FeatureInformation, valid: &FeatureInformation, path: impl AsRef<Path>) -> Result<()> {
    write_atomically(path, |w| write_feature_stats(w, train, valid))
}

/// Save per-user rankings as a TREC run
pub fn save_ranking(rankings: &[UserRanking], run: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    log::info!("Saving rankings of {} users to {}", rankings.len(), path.display());
    write_atomically(path, |w| write_trec(w, rankings, run))
}

/// Save the combined-set description: both sources, then the feature table
pub fn save_combined_description(
    info: &FeatureInformation,
    first: &Path,
    second: &Path,
    path: impl AsRef<Path>,
) -> Result<()> {
    write_atomically(path, |w| {
        writeln!(w, "First dataset: {}", first.display())?;
        writeln!(w, "Second dataset: {}", second.display())?;
        write_feature_info(w, info)
    })
}

/// Summary of one generated split
#[derive(Debug, Clone, Serialize)]
pub struct SplitSummary {
    pub name: String,
    pub output: PathBuf,
    pub stats: GenerationStats,
}

/// Save run summary as JSON
pub fn save_summary(features: &[String], splits: &[SplitSummary], path: impl AsRef<Path>) -> Result<()> {
    log::info!("Saving summary information");

    let summary = json!({
        "features": features,
        "splits": splits,
        "instance_count": splits.iter().map(|s| s.stats.instances).sum::<usize>(),
        "dropped_pairs": splits.iter().map(|s| s.stats.dropped_pairs).sum::<usize>(),
    });
    let text = to_string_pretty(&summary)?;
    write_atomically(path, |w| w.write_all(text.as_bytes()))
}
