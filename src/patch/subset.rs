//! Cut one model's files down to the common lon/lat box.

use std::path::PathBuf;

use crate::cdo::{CdoCommand, Operator, ToolRunner};
use crate::config::{PipelineConfig, SubsetConfig};
use crate::error::Result;
use crate::scan;
use crate::stage::{dispatch, RunOptions, StageReport, ToolJob};

pub fn plan_subset(config: &SubsetConfig, report: &mut StageReport) -> Result<Vec<ToolJob>> {
    let mut jobs = Vec::new();
    for dir in &config.input_dirs {
        let Some(dir_name) = scan::file_name(dir) else {
            report.skip(dir, "input directory has no usable name");
            continue;
        };
        let out_dir = config.output_dir.join(dir_name);
        for input in scan::list_netcdf(dir)? {
            let Some(name) = scan::file_name(&input) else {
                continue;
            };
            if !name.starts_with(&config.file_prefix) {
                continue;
            }
            let output: PathBuf = out_dir.join(name);
            if output.exists() {
                report.skip_existing(&output);
                continue;
            }
            let command = CdoCommand::new(Operator::SelLonLatBox(config.bounds))
                .input(&input)
                .output(&output);
            jobs.push(ToolJob::new(output, command));
        }
    }
    Ok(jobs)
}

pub fn run_subset(
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
    options: &RunOptions,
) -> Result<StageReport> {
    let mut report = StageReport::new("patch-subset", options);
    let jobs = plan_subset(&config.patch.subset, &mut report)?;
    dispatch(runner, &jobs, options, &mut report)?;
    Ok(report)
}
