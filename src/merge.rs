//! Merge time-chunked daily files into one file per simulation and variable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cdo::{CdoCommand, Operator, ToolRunner};
use crate::config::{MergeConfig, PipelineConfig};
use crate::error::Result;
use crate::filename::{merged_date_range, DateRange, FilenameRecord};
use crate::scan;
use crate::stage::{dispatch, RunOptions, StageReport, ToolJob};

/// Chunks of one simulation and variable, possibly spread over several directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeGroup {
    pub record: FilenameRecord,
    /// Ordered by file name, one path per distinct chunk name.
    pub inputs: Vec<PathBuf>,
    /// Chunks whose file name was already taken by an earlier path.
    pub duplicates: Vec<PathBuf>,
}

impl MergeGroup {
    pub fn stem(&self) -> String {
        self.record.stem()
    }

    pub fn date_range(&self) -> &DateRange {
        &self.record.date_range
    }

    /// `<output_dir>/<experiment>/<stem>_<start>-<end>.nc`
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir
            .join(&self.record.experiment)
            .join(self.record.file_name())
    }
}

/// The three substring predicates applied to every candidate filename.
pub fn matches_filters(name: &str, variable: &str, config: &MergeConfig) -> bool {
    name.contains(&config.ensemble)
        && name.contains(&config.frequency)
        && name.starts_with(&format!("{variable}_"))
}

/// Group the filtered chunks of one variable found under any of `roots`.
///
/// Groups are keyed by experiment and stem, the two parts of the output
/// path, so every output file has exactly one merge job.
pub fn plan_variable(
    roots: &[PathBuf],
    variable: &str,
    config: &MergeConfig,
    extra_institutes: &[String],
) -> Result<Vec<MergeGroup>> {
    let mut by_output: BTreeMap<(String, String), BTreeMap<String, Vec<(PathBuf, FilenameRecord)>>> =
        BTreeMap::new();
    for root in roots {
        for path in scan::walk_files(root)? {
            let Some(name) = scan::file_name(&path) else {
                continue;
            };
            if !matches_filters(name, variable, config) {
                continue;
            }
            let record = FilenameRecord::parse_with_institutes(name, extra_institutes)?;
            let name = name.to_string();
            by_output
                .entry((record.experiment.clone(), record.stem()))
                .or_default()
                .entry(name)
                .or_default()
                .push((path, record));
        }
    }

    let mut groups = Vec::with_capacity(by_output.len());
    for (_key, chunks) in by_output {
        let range = merged_date_range(chunks.keys())?;
        let mut inputs = Vec::with_capacity(chunks.len());
        let mut duplicates = Vec::new();
        let mut template = None;
        for (_name, copies) in chunks {
            let mut copies = copies.into_iter();
            if let Some((path, record)) = copies.next() {
                template.get_or_insert(record);
                inputs.push(path);
            }
            duplicates.extend(copies.map(|(path, _)| path));
        }
        let Some(template) = template else {
            continue;
        };
        let mut record = template.with_date_range(range);
        record.extension = scan::NETCDF_EXTENSION.to_string();
        groups.push(MergeGroup {
            record,
            inputs,
            duplicates,
        });
    }
    Ok(groups)
}

pub fn merge_command(group: &MergeGroup, output: &Path) -> CdoCommand {
    CdoCommand::new(Operator::MergeTime)
        .inputs(group.inputs.iter().cloned())
        .output(output)
}

pub fn run_merge(
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
    options: &RunOptions,
) -> Result<StageReport> {
    let merge = &config.merge;
    let mut report = StageReport::new("merge", options);
    let mut jobs = Vec::new();

    for variable in &merge.variables {
        let groups = plan_variable(&merge.roots, variable, merge, &config.extra_institutes)?;
        if groups.is_empty() {
            report.skip(
                Path::new(variable),
                format!(
                    "no {variable} files matching '{}' and '{}'",
                    merge.ensemble, merge.frequency
                ),
            );
            continue;
        }
        for group in groups {
            for duplicate in &group.duplicates {
                report.skip(duplicate, "same chunk name already found in another directory");
            }
            let output = group.output_path(&merge.output_dir);
            if output.exists() {
                report.skip_existing(&output);
                continue;
            }
            info!(
                stem = %group.stem(),
                range = %group.date_range(),
                chunks = group.inputs.len(),
                "merging"
            );
            jobs.push(ToolJob::new(output.clone(), merge_command(&group, &output)));
        }
    }

    dispatch(runner, &jobs, options, &mut report)?;
    Ok(report)
}
