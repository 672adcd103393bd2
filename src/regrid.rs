//! Regrid merged files onto the common target grid.
//!
//! Precipitation must conserve area integrals, so it goes through `remapcon`;
//! temperatures use `remapbil`. The method is picked by variable prefix.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cdo::{CdoCommand, Operator, ToolRunner};
use crate::config::{PipelineConfig, RegridConfig};
use crate::error::Result;
use crate::filename::FilenameRecord;
use crate::scan;
use crate::stage::{dispatch, RunOptions, StageReport, ToolJob};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegridMethod {
    Conservative,
    Bilinear,
}

impl RegridMethod {
    pub fn operator(self, target_grid: &Path) -> Operator {
        match self {
            Self::Conservative => Operator::RemapCon(target_grid.to_path_buf()),
            Self::Bilinear => Operator::RemapBil(target_grid.to_path_buf()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegridRule {
    pub prefix: String,
    pub method: RegridMethod,
}

impl RegridRule {
    pub fn new(prefix: impl Into<String>, method: RegridMethod) -> Self {
        Self {
            prefix: prefix.into(),
            method,
        }
    }
}

/// First rule whose prefix starts the filename wins.
pub fn select_method(rules: &[RegridRule], file_name: &str) -> Option<RegridMethod> {
    rules
        .iter()
        .find(|rule| file_name.starts_with(&rule.prefix))
        .map(|rule| rule.method)
}

pub fn regrid_command(
    method: RegridMethod,
    config: &RegridConfig,
    input: &Path,
    output: &Path,
) -> CdoCommand {
    let mut command = CdoCommand::new(method.operator(&config.target_grid));
    if let Some(source_grid) = &config.source_grid {
        command = command.then(Operator::SetGrid(source_grid.clone()));
    }
    command.input(input).output(output)
}

/// Output path for one input, with the domain field swapped to the target.
pub fn regridded_path(
    config: &RegridConfig,
    experiment: &str,
    record: &FilenameRecord,
) -> PathBuf {
    config
        .output_dir
        .join(experiment)
        .join(record.with_domain(&config.target_domain).file_name())
}

pub fn run_regrid(
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
    options: &RunOptions,
) -> Result<StageReport> {
    let regrid = &config.regrid;
    let mut report = StageReport::new("regrid", options);
    let mut jobs = Vec::new();

    for experiment in &config.experiments {
        let input_dir = regrid.input_dir.join(experiment);
        if !input_dir.is_dir() {
            report.skip(&input_dir, "experiment directory does not exist");
            continue;
        }
        for input in scan::list_netcdf(&input_dir)? {
            let Some(name) = scan::file_name(&input) else {
                continue;
            };
            let record = FilenameRecord::parse_with_institutes(name, &config.extra_institutes)?;
            if record.domain != regrid.source_domain {
                report.skip(
                    &input,
                    format!(
                        "domain '{}' is not the source domain '{}'",
                        record.domain, regrid.source_domain
                    ),
                );
                continue;
            }
            let output = regridded_path(regrid, experiment, &record);
            if output.exists() {
                report.skip_existing(&output);
                continue;
            }
            let Some(method) = select_method(&regrid.rules, name) else {
                report.skip(&input, "no regrid rule matches this variable");
                continue;
            };
            jobs.push(ToolJob::new(
                output.clone(),
                regrid_command(method, regrid, &input, &output),
            ));
        }
    }

    dispatch(runner, &jobs, options, &mut report)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_pick_conservative_for_precip() {
        let rules = RegridConfig::default().rules;
        assert_eq!(
            select_method(&rules, "pr_AUS-44_x.nc"),
            Some(RegridMethod::Conservative)
        );
        assert_eq!(
            select_method(&rules, "tasmax_AUS-44_x.nc"),
            Some(RegridMethod::Bilinear)
        );
        assert_eq!(select_method(&rules, "huss_AUS-44_x.nc"), None);
    }

    #[test]
    fn source_grid_is_applied_before_remap() {
        let config = RegridConfig {
            source_grid: Some(PathBuf::from("grids/src.txt")),
            target_grid: PathBuf::from("grids/dst.txt"),
            ..RegridConfig::default()
        };
        let cmd = regrid_command(
            RegridMethod::Bilinear,
            &config,
            Path::new("in.nc"),
            Path::new("out.nc"),
        );
        assert_eq!(
            cmd.args(),
            vec!["remapbil,grids/dst.txt", "-setgrid,grids/src.txt", "in.nc", "out.nc"]
        );
    }

    #[test]
    fn output_path_swaps_domain_field_only() {
        let config = RegridConfig::default();
        let record = FilenameRecord::parse(
            "pr_AUS-44_CCCma-CanESM2_rcp45_r1i1p1_UNSW-WRF360J_v1_day_20060101-20991231.nc",
        )
        .unwrap();
        let path = regridded_path(&config, "rcp45", &record);
        assert_eq!(
            path,
            PathBuf::from("scratch/step2_regrid_AUS-44i/rcp45")
                .join("pr_AUS-44i_CCCma-CanESM2_rcp45_r1i1p1_UNSW-WRF360J_v1_day_20060101-20991231.nc")
        );
    }
}
