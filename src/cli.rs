use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::error;

use crate::cdo::ProcessRunner;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::filename::{merged_date_range, FilenameRecord};
use crate::parallel::WorkerPool;
use crate::stage::{RunOptions, StageReport};
use crate::{catalogue, indices, logging, merge, patch, regrid};

#[derive(Debug, Parser)]
#[command(name = "cordex-prep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Prepare CORDEX regional climate model output: merge, regrid, catalogue, patch, sort")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// YAML config file (defaults to $CORDEX_PREP_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// trace, debug, info, warn or error
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Actually run tools and write files; without it every stage is a dry run
    #[arg(long, global = true)]
    pub execute: bool,

    /// Independent jobs to run at once
    #[arg(long, global = true, default_value_t = 1)]
    pub jobs: usize,

    /// Print reports as JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Parse CORDEX filenames and print their fields as JSON
    Parse {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Print the merged date range of a set of filenames
    DateRange {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Merge time chunks into one file per simulation and variable
    Merge,
    /// Regrid merged files onto the target grid
    Regrid,
    /// Build the metadata catalogue from regridded filenames
    Catalogue {
        /// Override catalogue.output
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip unparsable filenames instead of aborting
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Corrective procedures for known data defects
    #[command(subcommand)]
    Patch(PatchCommand),
    /// Copy climate-index files into <experiment>/<index>/ directories
    SortIndices,
}

#[derive(Debug, Clone, Subcommand)]
pub enum PatchCommand {
    /// Cut files to the configured lon/lat box
    Subset,
    /// Reset reference time and force the target calendar
    Calendar,
    /// Synthesize an all-missing month from a template file
    Fill,
    /// Apply the calendar fix to the fill outputs
    Recalendar,
    /// Print days per month found in a file
    Inspect { file: PathBuf },
}

/// A pipeline stage that produces a [StageReport].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    Merge,
    Regrid,
    Catalogue {
        output: Option<PathBuf>,
        skip_invalid: bool,
    },
    Subset,
    Calendar,
    Fill,
    Recalendar,
    SortIndices,
}

/// Parse `args` (including the program name) and run. Returns the exit code.
pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { 2 } else { 0 };
        }
    };
    logging::init(&cli.global.log_level);

    let stage = match cli.command {
        Command::Parse { names } => return handle_parse(&cli.global, &names),
        Command::DateRange { names } => return handle_date_range(&names),
        Command::Patch(PatchCommand::Inspect { file }) => return handle_inspect(&cli.global, &file),
        Command::Merge => Stage::Merge,
        Command::Regrid => Stage::Regrid,
        Command::Catalogue {
            output,
            skip_invalid,
        } => Stage::Catalogue {
            output,
            skip_invalid,
        },
        Command::Patch(PatchCommand::Subset) => Stage::Subset,
        Command::Patch(PatchCommand::Calendar) => Stage::Calendar,
        Command::Patch(PatchCommand::Fill) => Stage::Fill,
        Command::Patch(PatchCommand::Recalendar) => Stage::Recalendar,
        Command::SortIndices => Stage::SortIndices,
    };

    match run_stage(&cli.global, stage) {
        Ok(report) => print_report(&report, cli.global.json),
        Err(err) => {
            error!(%err, "stage aborted");
            eprintln!("error: {err}");
            1
        }
    }
}

fn handle_parse(global: &GlobalArgs, names: &[String]) -> i32 {
    let config = match PipelineConfig::load(global.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    let mut records = Vec::with_capacity(names.len());
    let mut failed = 0;
    for name in names {
        match FilenameRecord::parse_with_institutes(name, &config.extra_institutes) {
            Ok(record) => records.push(record),
            Err(err) => {
                eprintln!("{err}");
                failed += 1;
            }
        }
    }
    match serde_json::to_string_pretty(&records) {
        Ok(payload) => println!("{payload}"),
        Err(err) => {
            eprintln!("failed to serialize records: {err}");
            return 1;
        }
    }
    if failed > 0 {
        1
    } else {
        0
    }
}

fn handle_date_range(names: &[String]) -> i32 {
    match merged_date_range(names) {
        Ok(range) => {
            println!("{range}");
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn run_stage(global: &GlobalArgs, stage: Stage) -> Result<StageReport> {
    let mut config = PipelineConfig::load(global.config.as_deref())?;
    let runner = ProcessRunner::new(config.cdo.program.clone());
    let options = RunOptions {
        execute: global.execute,
        pool: WorkerPool::with_workers(global.jobs),
    };

    match stage {
        Stage::Merge => merge::run_merge(&config, &runner, &options),
        Stage::Regrid => regrid::run_regrid(&config, &runner, &options),
        Stage::Catalogue {
            output,
            skip_invalid,
        } => {
            if let Some(output) = output {
                config.catalogue.output = output;
            }
            config.catalogue.skip_invalid |= skip_invalid;
            catalogue::run_catalogue(&config, &options)
        }
        Stage::Subset => patch::run_subset(&config, &runner, &options),
        Stage::Calendar => patch::run_calendar(&config, &runner, &options),
        Stage::Fill => patch::run_fill(&config, &runner, &options),
        Stage::Recalendar => patch::run_recalendar(&config, &runner, &options),
        Stage::SortIndices => indices::run_sort(&config, &options),
    }
}

fn handle_inspect(global: &GlobalArgs, file: &Path) -> i32 {
    let result = PipelineConfig::load(global.config.as_deref()).and_then(|config| {
        let runner = ProcessRunner::new(config.cdo.program);
        patch::inspect_file(&runner, file)
    });
    let counts = match result {
        Ok(counts) => counts,
        Err(err) => {
            eprintln!("inspect failed: {err}");
            return 1;
        }
    };
    if global.json {
        match serde_json::to_string_pretty(&counts) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize day counts: {err}");
                return 1;
            }
        }
    } else {
        print!("{}", counts.render_table());
    }
    0
}

fn print_report(report: &StageReport, as_json: bool) -> i32 {
    if as_json {
        match serde_json::to_string_pretty(report) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize report: {err}");
                return 1;
            }
        }
    } else {
        print!("{}", report.render_table());
    }
    if report.has_failures() {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(args(&[
            "cordex-prep",
            "regrid",
            "--execute",
            "--jobs",
            "4",
            "--json",
        ]))
        .unwrap();
        assert!(matches!(cli.command, Command::Regrid));
        assert!(cli.global.execute);
        assert_eq!(cli.global.jobs, 4);
        assert!(cli.global.json);
    }

    #[test]
    fn patch_subcommands_parse() {
        let cli = Cli::try_parse_from(args(&["cordex-prep", "patch", "inspect", "a.nc"])).unwrap();
        match cli.command {
            Command::Patch(PatchCommand::Inspect { file }) => assert_eq!(file, PathBuf::from("a.nc")),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(!cli.global.execute);
    }

    #[test]
    fn missing_subcommand_is_usage_error() {
        assert_eq!(run_with_args(&args(&["cordex-prep"])), 2);
    }
}
