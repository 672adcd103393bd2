//! Calendar normalization: reset the reference time, then force the target calendar.

use std::path::{Path, PathBuf};

use crate::cdo::{CdoCommand, Operator, ToolRunner};
use crate::config::{CalendarConfig, PipelineConfig};
use crate::error::Result;
use crate::scan;
use crate::stage::{dispatch, RunOptions, StageReport, ToolJob};

use super::time_axis::Calendar;

pub fn calendar_command(config: &CalendarConfig, input: &Path, output: &Path) -> Result<CdoCommand> {
    let calendar: Calendar = config.calendar.parse()?;
    Ok(CdoCommand::new(Operator::SetCalendar(calendar.cf_name().to_string()))
        .then(Operator::SetRefTime {
            date: config.reference_date.clone(),
            time: config.reference_time.clone(),
            units: config.units.clone(),
        })
        .input(input)
        .output(output))
}

pub fn plan_calendar(
    config: &CalendarConfig,
    inputs: &[PathBuf],
    output_dir: &Path,
    report: &mut StageReport,
) -> Result<Vec<ToolJob>> {
    let mut jobs = Vec::new();
    for input in scan::expand_netcdf_inputs(inputs)? {
        let Some(name) = scan::file_name(&input) else {
            continue;
        };
        let output = output_dir.join(name);
        if output == input {
            report.skip(&input, "output would overwrite its own input");
            continue;
        }
        if output.exists() {
            report.skip_existing(&output);
            continue;
        }
        let command = calendar_command(config, &input, &output)?;
        jobs.push(ToolJob::new(output, command));
    }
    Ok(jobs)
}

pub fn run_calendar(
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
    options: &RunOptions,
) -> Result<StageReport> {
    let calendar = &config.patch.calendar;
    let mut report = StageReport::new("patch-calendar", options);
    let jobs = plan_calendar(calendar, &calendar.inputs, &calendar.output_dir, &mut report)?;
    dispatch(runner, &jobs, options, &mut report)?;
    Ok(report)
}

/// Same fix applied to the synthesized fill files.
pub fn run_recalendar(
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
    options: &RunOptions,
) -> Result<StageReport> {
    let fill = &config.patch.fill;
    let mut report = StageReport::new("patch-recalendar", options);
    if !fill.output_dir.is_dir() {
        report.skip(&fill.output_dir, "no fill output yet; run `patch fill` first");
        return Ok(report);
    }
    let jobs = plan_calendar(
        &config.patch.calendar,
        std::slice::from_ref(&fill.output_dir),
        &fill.recalendar_output_dir,
        &mut report,
    )?;
    dispatch(runner, &jobs, options, &mut report)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_reference_time_before_calendar() {
        let cmd = calendar_command(
            &CalendarConfig::default(),
            Path::new("in.nc"),
            Path::new("out/in.nc"),
        )
        .unwrap();
        assert_eq!(
            cmd.to_string(),
            "cdo setcalendar,365_day -setreftime,1949-12-01,00:00:00,days in.nc out/in.nc"
        );
    }

    #[test]
    fn calendar_alias_is_normalized() {
        let config = CalendarConfig {
            calendar: "noleap".into(),
            ..CalendarConfig::default()
        };
        let cmd = calendar_command(&config, Path::new("a.nc"), Path::new("b.nc")).unwrap();
        assert_eq!(cmd.args()[0], "setcalendar,365_day");
    }
}
