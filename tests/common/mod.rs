//! Shared fixtures: a fake CDO runner and filename builders.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use cordex_prep::cdo::{CdoCommand, ToolOutput, ToolRunner};
use cordex_prep::Result;

/// Records every command and creates its output file instead of running CDO.
/// Commands whose rendering contains `fail_on` write a partial file and exit 1.
#[derive(Default)]
pub struct RecordingRunner {
    pub commands: Mutex<Vec<CdoCommand>>,
    pub fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(pattern: &str) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail_on: Some(pattern.to_string()),
        }
    }

    pub fn commands(&self) -> Vec<CdoCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.commands().iter().map(ToString::to_string).collect()
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&self, command: &CdoCommand) -> Result<ToolOutput> {
        self.commands.lock().unwrap().push(command.clone());
        if let Some(output) = command.output_path() {
            fs::write(output, b"partial").unwrap();
        }
        let fails = self
            .fail_on
            .as_deref()
            .is_some_and(|pattern| command.to_string().contains(pattern));
        Ok(ToolOutput {
            code: Some(if fails { 1 } else { 0 }),
            stdout: String::new(),
            stderr: if fails { "cdo: simulated failure".into() } else { String::new() },
        })
    }
}

pub fn cordex_name(variable: &str, domain: &str, experiment: &str, range: &str) -> String {
    format!(
        "{variable}_{domain}_CSIRO-BOM-ACCESS1-0_{experiment}_r1i1p1_CSIRO-CCAM-2008_v1_day_{range}.nc"
    )
}

pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}
