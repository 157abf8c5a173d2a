//! External learning-to-rank trainer
//!
//! Model training happens in a separate program (a jforests-compatible command line);
//! this module only drives it.

use super::instance::InstanceSet;
use crate::error::TrainerError;
use crate::storage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A trained model stored on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    pub path: PathBuf,
}

pub trait RankTrainer {
    /// Trains a model on `train`, early-stopping on `valid`
    fn train(&self, train: &Path, valid: &Path) -> Result<ModelHandle, TrainerError>;

    /// Scores `test` and returns the prediction file
    fn predict(&self, model: &ModelHandle, test: &Path) -> Result<PathBuf, TrainerError>;
}

/// Runs the trainer binary once per step, inside a working directory
#[derive(Debug, Clone)]
pub struct CommandTrainer {
    program: PathBuf,
    config_file: Option<PathBuf>,
    work_dir: PathBuf,
}

impl CommandTrainer {
    pub fn new(program: impl Into<PathBuf>, config_file: Option<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            config_file,
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Converts LETOR files of the working directory into the trainer's binned format
    ///
    /// Returns the binned file of each input, in order.
    pub fn generate_bins(&self, files: &[&Path]) -> Result<Vec<PathBuf>, TrainerError> {
        let mut args: Vec<OsString> = vec!["--cmd=generate-bin".into(), "--ranking".into()];
        args.push("--folder".into());
        args.push(self.work_dir.clone().into_os_string());
        for file in files {
            args.push("--file".into());
            args.push(file.file_name().unwrap_or(file.as_os_str()).to_os_string());
        }
        self.run(args)?;

        files
            .iter()
            .map(|file| {
                let stem = file.file_stem().unwrap_or(file.as_os_str());
                let bin = self.work_dir.join(stem).with_extension("bin");
                if bin.exists() {
                    Ok(bin)
                } else {
                    Err(TrainerError::MissingOutput(bin))
                }
            })
            .collect()
    }

    fn run(&self, args: Vec<OsString>) -> Result<(), TrainerError> {
        let mut command = Command::new(&self.program);
        if let Some(config) = &self.config_file {
            command.arg("--config-file").arg(config);
        }
        command.args(&args).current_dir(&self.work_dir);

        let line = format!("{:?}", command);
        log::info!("Running {}", line);
        let status = command.status().map_err(|source| TrainerError::Spawn {
            command: line.clone(),
            source,
        })?;
        if !status.success() {
            return Err(TrainerError::CommandFailed {
                command: line,
                status: status.to_string(),
            });
        }
        Ok(())
    }

    fn expect_output(path: PathBuf) -> Result<PathBuf, TrainerError> {
        if path.exists() {
            Ok(path)
        } else {
            Err(TrainerError::MissingOutput(path))
        }
    }
}

impl RankTrainer for CommandTrainer {
    fn train(&self, train: &Path, valid: &Path) -> Result<ModelHandle, TrainerError> {
        let model = self.work_dir.join("model.txt");
        self.run(vec![
            "--cmd=train".into(),
            "--ranking".into(),
            "--train-file".into(),
            train.into(),
            "--validation-file".into(),
            valid.into(),
            "--output-model".into(),
            model.clone().into(),
        ])?;
        Ok(ModelHandle {
            path: Self::expect_output(model)?,
        })
    }

    fn predict(&self, model: &ModelHandle, test: &Path) -> Result<PathBuf, TrainerError> {
        let output = self.work_dir.join("pred.txt");
        self.run(vec![
            "--cmd=predict".into(),
            "--ranking".into(),
            "--model".into(),
            model.path.clone().into(),
            "--tree-type".into(),
            "RegressionTree".into(),
            "--test-file".into(),
            test.into(),
            "--output-file".into(),
            output.clone().into(),
        ])?;
        Self::expect_output(output)
    }
}

/// Name of the column-range file the trainer reads from its working directory
pub const FEATURE_STATS: &str = "jforests-feature-stats.txt";

/// Writes the sets and their feature ranges into the working directory, then trains
/// on `train`/`valid` and scores `test`
///
/// Returns the prediction file, one score per row of `test`.
pub fn train_and_predict(
    trainer: &CommandTrainer,
    train: &InstanceSet,
    valid: &InstanceSet,
    test: &InstanceSet,
) -> anyhow::Result<PathBuf> {
    if train.info().len() != valid.info().len() {
        return Err(TrainerError::FeatureMismatch {
            train: train.info().len(),
            valid: valid.info().len(),
        }
        .into());
    }

    let dir = trainer.work_dir();
    let train_file = dir.join("train.letor");
    let valid_file = dir.join("valid.letor");
    let test_file = dir.join("test.letor");
    storage::save_instances(train, &train_file)?;
    storage::save_instances(valid, &valid_file)?;
    storage::save_instances(test, &test_file)?;
    storage::save_feature_stats(train.info(), valid.info(), dir.join(FEATURE_STATS))?;

    let bins = trainer.generate_bins(&[train_file.as_path(), valid_file.as_path()])?;
    let test_bins = trainer.generate_bins(&[test_file.as_path()])?;
    let model = trainer.train(&bins[0], &bins[1])?;
    Ok(trainer.predict(&model, &test_bins[0])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = CommandTrainer::new(dir.path().join("no-such-trainer"), None, dir.path());
        let err = trainer.train(Path::new("train.bin"), Path::new("valid.bin")).unwrap_err();
        assert!(matches!(err, TrainerError::Spawn { .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = CommandTrainer::new("false", None, dir.path());
        let model = ModelHandle {
            path: dir.path().join("model.txt"),
        };
        let err = trainer.predict(&model, Path::new("test.bin")).unwrap_err();
        assert!(matches!(err, TrainerError::CommandFailed { .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn successful_runs_must_produce_output() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = CommandTrainer::new("true", None, dir.path());
        let err = trainer.train(Path::new("train.bin"), Path::new("valid.bin")).unwrap_err();
        assert_eq!(err.to_string(), format!("trainer did not produce {}", dir.path().join("model.txt").display()));
    }

    /// Stand-in trainer: empty bins and model, then the 1-based row number as score
    #[cfg(unix)]
    const FAKE_TRAINER: &str = r#"#!/bin/sh
cmd=; folder=.; files=; model=; out=
while [ $# -gt 0 ]; do
  case "$1" in
    --cmd=*) cmd="${1#--cmd=}" ;;
    --folder) folder="$2"; shift ;;
    --file) files="$files $2"; shift ;;
    --output-model) model="$2"; shift ;;
    --output-file) out="$2"; shift ;;
    --config-file|--train-file|--validation-file|--model|--tree-type|--test-file) shift ;;
  esac
  shift
done
case "$cmd" in
  generate-bin) for f in $files; do : > "$folder/${f%.letor}.bin"; done ;;
  train) : > "$model" ;;
  predict) awk '!/^#/ { n++; print n }' test.letor > "$out" ;;
esac
"#;

    #[cfg(unix)]
    fn fake_trainer(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-trainer.sh");
        std::fs::write(&path, FAKE_TRAINER).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn two_feature_set(rows: &[(u64, u64, f64)]) -> InstanceSet {
        use crate::letor::{FeatureInformation, FeatureType, Instance};
        let mut info = FeatureInformation::new();
        info.add_feature("MCN_OUT_IN", FeatureType::Continuous).unwrap();
        info.add_feature("Popularity", FeatureType::Continuous).unwrap();
        let mut set = InstanceSet::new(info);
        for &(origin, destination, value) in rows {
            set.add(Instance::new(origin, destination, vec![value, 1.0], 0));
        }
        set
    }

    #[cfg(unix)]
    #[test]
    fn full_run_leaves_stats_model_and_predictions() {
        let bin = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let trainer = CommandTrainer::new(fake_trainer(bin.path()), None, work.path());

        let train = two_feature_set(&[(1, 2, 0.5), (1, 3, 2.0)]);
        let valid = two_feature_set(&[(2, 3, -1.0)]);
        let test = two_feature_set(&[(3, 4, 0.0), (3, 5, 0.0), (4, 5, 0.0)]);

        let predictions = train_and_predict(&trainer, &train, &valid, &test).unwrap();
        assert_eq!(std::fs::read_to_string(&predictions).unwrap(), "1\n2\n3\n");
        assert!(work.path().join("model.txt").exists());
        assert_eq!(
            std::fs::read_to_string(work.path().join(FEATURE_STATS)).unwrap(),
            "FeatureIndex\tname\tMin\tMax\n1\tMCN_OUT_IN\t-1\t2\n2\tPopularity\t1\t1\n"
        );
    }

    #[test]
    fn mismatched_columns_stop_before_training() {
        let work = tempfile::tempdir().unwrap();
        let trainer = CommandTrainer::new(work.path().join("unused"), None, work.path());
        let train = two_feature_set(&[(1, 2, 0.5)]);
        let valid = train.prefix(1);
        let err = train_and_predict(&trainer, &train, &valid, &train).unwrap_err();
        assert_eq!(err.to_string(), "training and validation sets have 2 and 1 features");
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }
}
