//! Sort computed climate-index files into `<experiment>/<index>/` directories.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{IndicesConfig, PipelineConfig};
use crate::error::{Error, Result};
use crate::filename::FIELD_DELIMITER;
use crate::scan;
use crate::stage::{Action, ActionStatus, RunOptions, StageReport};

/// First configured experiment tag contained in a model directory's name.
pub fn classify_experiment<'a>(dir_name: &str, experiments: &'a [String]) -> Option<&'a str> {
    experiments
        .iter()
        .find(|tag| dir_name.contains(tag.as_str()))
        .map(String::as_str)
}

/// Leading `_` field of an index file name, e.g. `txx` for `txx_ANN_..nc`.
pub fn index_name(file_name: &str) -> Option<&str> {
    file_name
        .split(FIELD_DELIMITER)
        .next()
        .filter(|token| !token.is_empty() && *token != file_name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub experiment: String,
    pub index: String,
}

impl SortMove {
    pub fn destination_dir(&self) -> &Path {
        self.destination.parent().unwrap_or(&self.destination)
    }
}

pub fn plan_sort(
    config: &IndicesConfig,
    experiments: &[String],
    report: &mut StageReport,
) -> Result<Vec<SortMove>> {
    let mut moves = Vec::new();
    for model_dir in scan::list_dirs(&config.source_root)? {
        let dir_name = scan::file_name(&model_dir).unwrap_or_default();
        let Some(experiment) = classify_experiment(dir_name, experiments) else {
            report.skip(&model_dir, "directory name matches no experiment");
            continue;
        };
        for source in scan::list_files(&model_dir)? {
            let Some(name) = scan::file_name(&source) else {
                continue;
            };
            if config.skip_files.iter().any(|skip| skip == name) {
                debug!(file = %source.display(), "housekeeping file, not an index");
                continue;
            }
            let Some(index) = index_name(name) else {
                report.skip(&source, "no leading index name");
                continue;
            };
            let destination = config.dest_root.join(experiment).join(index).join(name);
            let index = index.to_string();
            moves.push(SortMove {
                source,
                destination,
                experiment: experiment.to_string(),
                index,
            });
        }
    }
    Ok(moves)
}

fn copy_one(config: &IndicesConfig, planned: &SortMove) -> Result<()> {
    let dir = planned.destination_dir();
    if !dir.is_dir() {
        if !config.create_missing_dirs {
            return Err(Error::MissingDestination(dir.to_path_buf()));
        }
        fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;
    }
    if planned.destination.exists() {
        debug!(file = %planned.destination.display(), "overwriting");
    }
    fs::copy(&planned.source, &planned.destination)
        .map_err(|err| Error::io(&planned.source, err))?;
    Ok(())
}

pub fn run_sort(config: &PipelineConfig, options: &RunOptions) -> Result<StageReport> {
    let indices = &config.indices;
    let mut report = StageReport::new("sort-indices", options);
    let moves = plan_sort(indices, &config.experiments, &mut report)?;

    for planned in &moves {
        let action = Action::new(&planned.destination, ActionStatus::Planned)
            .with_detail(planned.source.display().to_string());
        if !options.execute {
            report.push(action);
            continue;
        }
        match copy_one(indices, planned) {
            Ok(()) => {
                info!(
                    index = %planned.index,
                    experiment = %planned.experiment,
                    file = %planned.destination.display(),
                    "copied"
                );
                report.push(Action {
                    status: ActionStatus::Executed,
                    ..action
                });
            }
            Err(err) => {
                warn!(file = %planned.source.display(), %err, "copy failed");
                report.push(Action {
                    status: ActionStatus::Failed,
                    ..action
                }
                .with_detail(err.to_string()));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiments() -> Vec<String> {
        vec!["historical".into(), "rcp45".into(), "rcp85".into()]
    }

    #[test]
    fn classifies_by_substring() {
        let exps = experiments();
        assert_eq!(
            classify_experiment("CCAM_ACCESS1-0_rcp45_r1i1p1", &exps),
            Some("rcp45")
        );
        assert_eq!(classify_experiment("historical-run", &exps), Some("historical"));
        assert_eq!(classify_experiment("obs_awap", &exps), None);
    }

    #[test]
    fn index_name_is_leading_token() {
        assert_eq!(index_name("txx_ANN_CCAM_rcp45_2006-2099.nc"), Some("txx"));
        assert_eq!(index_name("README"), None);
        assert_eq!(index_name("_odd.nc"), None);
    }

    #[test]
    fn plan_records_experiment_and_index_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("src/WRF_CanESM2_rcp85_r1i1p1");
        fs::create_dir_all(&model).unwrap();
        fs::write(model.join("cdd_ANN_WRF_rcp85_2006-2099.nc"), b"").unwrap();
        fs::write(model.join("README.txt"), b"").unwrap();
        let config = IndicesConfig {
            source_root: dir.path().join("src"),
            dest_root: dir.path().join("dest"),
            ..IndicesConfig::default()
        };
        let mut report = StageReport::new("sort-indices", &RunOptions::dry_run());

        let moves = plan_sort(&config, &experiments(), &mut report).unwrap();

        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].experiment, "rcp85");
        assert_eq!(moves[0].index, "cdd");
        assert_eq!(moves[0].source, model.join("cdd_ANN_WRF_rcp85_2006-2099.nc"));
        assert_eq!(
            moves[0].destination,
            dir.path().join("dest/rcp85/cdd/cdd_ANN_WRF_rcp85_2006-2099.nc")
        );
        assert_eq!(moves[0].destination_dir(), dir.path().join("dest/rcp85/cdd"));
    }
}
