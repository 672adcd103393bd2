//! Climate Data Operators (CDO) invocations.
//!
//! Every stage that touches NetCDF contents does so through a [CdoCommand]
//! handed to a [ToolRunner]. Operators are chained outermost first, so
//! `[setcalendar, setreftime]` renders as `cdo setcalendar,.. -setreftime,.. in out`
//! and CDO applies `setreftime` first.

pub mod runner;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use runner::{run_checked, ProcessRunner, ToolOutput, ToolRunner, DEFAULT_CDO_PROGRAM};

/// Longitude/latitude bounding box for `sellonlatbox`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLatBox {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    MergeTime,
    SetGrid(PathBuf),
    RemapCon(PathBuf),
    RemapBil(PathBuf),
    SelLonLatBox(LonLatBox),
    SetRefTime {
        date: String,
        time: String,
        units: String,
    },
    SetCalendar(String),
    SelTimestep(usize),
    SetName(String),
    SetAttribute {
        variable: String,
        name: String,
        value: String,
    },
    SetRToMiss {
        low: f64,
        high: f64,
    },
    SetMissVal(f64),
    Duplicate(usize),
    SetTAxis {
        date: String,
        time: String,
        increment: String,
    },
    ShowDate,
}

impl Operator {
    pub fn render(&self) -> String {
        match self {
            Self::MergeTime => "mergetime".to_string(),
            Self::SetGrid(grid) => format!("setgrid,{}", grid.display()),
            Self::RemapCon(grid) => format!("remapcon,{}", grid.display()),
            Self::RemapBil(grid) => format!("remapbil,{}", grid.display()),
            Self::SelLonLatBox(b) => format!(
                "sellonlatbox,{},{},{},{}",
                b.lon_min, b.lon_max, b.lat_min, b.lat_max
            ),
            Self::SetRefTime { date, time, units } => format!("setreftime,{date},{time},{units}"),
            Self::SetCalendar(calendar) => format!("setcalendar,{calendar}"),
            Self::SelTimestep(step) => format!("seltimestep,{step}"),
            Self::SetName(name) => format!("setname,{name}"),
            Self::SetAttribute {
                variable,
                name,
                value,
            } => format!("setattribute,{variable}@{name}={value}"),
            Self::SetRToMiss { low, high } => format!("setrtomiss,{low:e},{high:e}"),
            Self::SetMissVal(value) => format!("setmissval,{value:e}"),
            Self::Duplicate(n) => format!("duplicate,{n}"),
            Self::SetTAxis {
                date,
                time,
                increment,
            } => format!("settaxis,{date},{time},{increment}"),
            Self::ShowDate => "showdate".to_string(),
        }
    }
}

/// One CDO process invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CdoCommand {
    pub operators: Vec<Operator>,
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub silent: bool,
}

impl CdoCommand {
    pub fn new(operator: Operator) -> Self {
        Self {
            operators: vec![operator],
            inputs: Vec::new(),
            output: None,
            silent: false,
        }
    }

    /// Chain an operator that runs before the ones already added.
    pub fn then(mut self, operator: Operator) -> Self {
        self.operators.push(operator);
        self
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Arguments passed to the CDO binary.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.operators.len() + self.inputs.len() + 2);
        if self.silent {
            args.push("-s".to_string());
        }
        for (i, op) in self.operators.iter().enumerate() {
            if i == 0 {
                args.push(op.render());
            } else {
                args.push(format!("-{}", op.render()));
            }
        }
        args.extend(self.inputs.iter().map(|p| p.display().to_string()));
        if let Some(output) = &self.output {
            args.push(output.display().to_string());
        }
        args
    }
}

impl fmt::Display for CdoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cdo {}", self.args().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_chained_calendar_fix() {
        let cmd = CdoCommand::new(Operator::SetCalendar("365_day".into()))
            .then(Operator::SetRefTime {
                date: "1949-12-01".into(),
                time: "00:00:00".into(),
                units: "days".into(),
            })
            .input("in.nc")
            .output("out.nc");
        assert_eq!(
            cmd.args(),
            vec![
                "setcalendar,365_day",
                "-setreftime,1949-12-01,00:00:00,days",
                "in.nc",
                "out.nc"
            ]
        );
        assert_eq!(
            cmd.to_string(),
            "cdo setcalendar,365_day -setreftime,1949-12-01,00:00:00,days in.nc out.nc"
        );
    }

    #[test]
    fn renders_box_and_missing_values() {
        let op = Operator::SelLonLatBox(LonLatBox {
            lon_min: 110.0,
            lon_max: 156.25,
            lat_min: -45.0,
            lat_max: -10.5,
        });
        assert_eq!(op.render(), "sellonlatbox,110,156.25,-45,-10.5");
        assert_eq!(Operator::SetMissVal(1e20).render(), "setmissval,1e20");
        assert_eq!(
            Operator::SetRToMiss {
                low: -1e36,
                high: 1e36
            }
            .render(),
            "setrtomiss,-1e36,1e36"
        );
    }

    #[test]
    fn silent_showdate_has_no_output() {
        let cmd = CdoCommand::new(Operator::ShowDate).silent().input("a.nc");
        assert_eq!(cmd.args(), vec!["-s", "showdate", "a.nc"]);
        assert!(cmd.output_path().is_none());
    }
}
