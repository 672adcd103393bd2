//! Synthesize a month of all-missing data where a model's output has a gap.
//!
//! Each configured variable gets its own file on the template's grid and with
//! its global attributes. The files are meant to be merged with the genuine
//! data afterwards.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::cdo::{CdoCommand, Operator, ToolRunner};
use crate::config::{FillBackend, FillConfig, PipelineConfig};
use crate::error::{Error, Result};
use crate::filename::FilenameRecord;
use crate::scan;
use crate::stage::{dispatch, Action, RunOptions, StageReport, ToolJob};

use super::time_axis::{month_date_range, Calendar, CalendarDate, TimeAxis};

/// CF metadata written on the synthesized variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableMeta {
    pub name: &'static str,
    pub standard_name: &'static str,
    pub long_name: &'static str,
    pub units: &'static str,
}

pub const KNOWN_VARIABLES: &[VariableMeta] = &[
    VariableMeta {
        name: "pr",
        standard_name: "precipitation_flux",
        long_name: "Precipitation",
        units: "kg m-2 s-1",
    },
    VariableMeta {
        name: "tasmax",
        standard_name: "air_temperature",
        long_name: "Daily Maximum Near-Surface Air Temperature",
        units: "K",
    },
    VariableMeta {
        name: "tasmin",
        standard_name: "air_temperature",
        long_name: "Daily Minimum Near-Surface Air Temperature",
        units: "K",
    },
];

pub fn variable_meta(name: &str) -> Option<&'static VariableMeta> {
    KNOWN_VARIABLES.iter().find(|meta| meta.name == name)
}

/// One file to synthesize.
#[derive(Debug, Clone, PartialEq)]
pub struct FillJob {
    pub variable: String,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillPlan {
    pub template: PathBuf,
    pub axis: TimeAxis,
    pub first_day: CalendarDate,
    pub fill_value: f64,
    pub jobs: Vec<FillJob>,
}

pub fn plan_fill(config: &FillConfig, extra_institutes: &[String]) -> Result<FillPlan> {
    let template = config
        .template
        .clone()
        .ok_or_else(|| Error::Config("patch.fill.template is not set".into()))?;
    let template_name = scan::file_name(&template)
        .ok_or_else(|| Error::Config(format!("bad template path '{}'", template.display())))?;
    let record = FilenameRecord::parse_with_institutes(template_name, extra_institutes)?;

    let calendar: Calendar = config.calendar.parse()?;
    let reference: CalendarDate = config.reference_date.parse()?;
    let axis = TimeAxis::for_month(config.year, config.month, calendar, reference)?;
    let range = month_date_range(config.year, config.month, calendar)?;

    let jobs = config
        .variables
        .iter()
        .map(|variable| {
            let mut out = record.with_variable(variable).with_date_range(range.clone());
            out.extension = scan::NETCDF_EXTENSION.to_string();
            FillJob {
                variable: variable.clone(),
                output: config.output_dir.join(out.file_name()),
            }
        })
        .collect();

    Ok(FillPlan {
        template,
        axis,
        first_day: CalendarDate::new(config.year, config.month, 1),
        fill_value: config.fill_value,
        jobs,
    })
}

/// CDO chain: first timestep of the template, every value set missing,
/// renamed, duplicated to one step per day and given the month's time axis.
pub fn fill_command(plan: &FillPlan, job: &FillJob) -> CdoCommand {
    let mut command = CdoCommand::new(Operator::SetCalendar(plan.axis.calendar.cf_name().to_string()))
        .then(Operator::SetTAxis {
            date: plan.first_day.to_string(),
            time: "12:00:00".to_string(),
            increment: "1day".to_string(),
        })
        .then(Operator::Duplicate(plan.axis.len()));
    if let Some(meta) = variable_meta(&job.variable) {
        for (name, value) in [
            ("units", meta.units),
            ("standard_name", meta.standard_name),
            ("long_name", meta.long_name),
        ] {
            command = command.then(Operator::SetAttribute {
                variable: job.variable.clone(),
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }
    command
        .then(Operator::SetName(job.variable.clone()))
        .then(Operator::SetMissVal(plan.fill_value))
        .then(Operator::SetRToMiss {
            low: -1e36,
            high: 1e36,
        })
        .then(Operator::SelTimestep(1))
        .input(&plan.template)
        .output(&job.output)
}

pub fn run_fill(
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
    options: &RunOptions,
) -> Result<StageReport> {
    let fill = &config.patch.fill;
    let mut report = StageReport::new("patch-fill", options);
    let plan = plan_fill(fill, &config.extra_institutes)?;
    info!(
        template = %plan.template.display(),
        days = plan.axis.len(),
        calendar = %plan.axis.calendar,
        "synthesizing missing month"
    );

    let pending: Vec<&FillJob> = plan
        .jobs
        .iter()
        .filter(|job| {
            if job.output.exists() {
                report.skip_existing(&job.output);
                false
            } else {
                true
            }
        })
        .collect();

    match fill.backend {
        FillBackend::Cdo => {
            let jobs: Vec<ToolJob> = pending
                .iter()
                .map(|job| ToolJob::new(job.output.clone(), fill_command(&plan, job)))
                .collect();
            dispatch(runner, &jobs, options, &mut report)?;
        }
        FillBackend::Native => {
            for job in pending {
                report.push(write_native_job(&plan, job, options)?);
            }
        }
    }
    Ok(report)
}

#[cfg(feature = "netcdf")]
fn write_native_job(plan: &FillPlan, job: &FillJob, options: &RunOptions) -> Result<Action> {
    use crate::stage::{remove_partial_output, ActionStatus};

    if !options.execute {
        return Ok(Action::new(&job.output, ActionStatus::Planned).with_detail("native writer"));
    }
    match super::native::write_fill_file(plan, job) {
        Ok(()) => {
            info!(output = %job.output.display(), "written");
            Ok(Action::new(&job.output, ActionStatus::Executed))
        }
        Err(err) => {
            warn!(output = %job.output.display(), %err, "native fill failed");
            remove_partial_output(&job.output);
            Ok(Action::new(&job.output, ActionStatus::Failed).with_detail(err.to_string()))
        }
    }
}

#[cfg(not(feature = "netcdf"))]
fn write_native_job(_plan: &FillPlan, job: &FillJob, _options: &RunOptions) -> Result<Action> {
    warn!(output = %job.output.display(), "native backend requested without netcdf support");
    Err(Error::FeatureDisabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str =
        "pr_AUS-44_CSIRO-BOM-ACCESS1-0_rcp85_r1i1p1_CSIRO-CCAM-2008_v1_day_20060101-20061231.nc";

    fn config() -> FillConfig {
        FillConfig {
            template: Some(PathBuf::from("templates").join(TEMPLATE)),
            output_dir: PathBuf::from("fill"),
            year: 2007,
            month: 2,
            ..FillConfig::default()
        }
    }

    #[test]
    fn plans_one_file_per_variable_named_for_the_month() {
        let plan = plan_fill(&config(), &[]).unwrap();
        let names: Vec<String> = plan
            .jobs
            .iter()
            .map(|j| j.output.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "pr_AUS-44_CSIRO-BOM-ACCESS1-0_rcp85_r1i1p1_CSIRO-CCAM-2008_v1_day_20070201-20070228.nc",
                "tasmax_AUS-44_CSIRO-BOM-ACCESS1-0_rcp85_r1i1p1_CSIRO-CCAM-2008_v1_day_20070201-20070228.nc",
                "tasmin_AUS-44_CSIRO-BOM-ACCESS1-0_rcp85_r1i1p1_CSIRO-CCAM-2008_v1_day_20070201-20070228.nc",
            ]
        );
        assert_eq!(plan.axis.len(), 28);
    }

    #[test]
    fn cdo_chain_blanks_and_duplicates_first_step() {
        let plan = plan_fill(&config(), &[]).unwrap();
        let args = fill_command(&plan, &plan.jobs[1]).args();
        assert_eq!(args[0], "setcalendar,365_day");
        assert_eq!(args[1], "-settaxis,2007-02-01,12:00:00,1day");
        assert_eq!(args[2], "-duplicate,28");
        assert!(args.contains(&"-setattribute,tasmax@units=K".to_string()));
        assert!(args.contains(&"-setname,tasmax".to_string()));
        assert!(args.contains(&"-setmissval,1e20".to_string()));
        let n = args.len();
        assert_eq!(args[n - 3], "-seltimestep,1");
        assert!(args[n - 2].ends_with(TEMPLATE));
    }

    #[test]
    fn missing_template_is_a_config_error() {
        let config = FillConfig::default();
        assert!(matches!(plan_fill(&config, &[]), Err(Error::Config(_))));
    }
}
