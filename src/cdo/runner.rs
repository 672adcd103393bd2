use std::process::Command;

use serde::Serialize;
use tracing::debug;

use super::CdoCommand;
use crate::error::{Error, Result};

pub const DEFAULT_CDO_PROGRAM: &str = "cdo";

/// Captured result of one external invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs CDO commands. Implementations must be shareable across worker threads.
pub trait ToolRunner: Send + Sync {
    fn run(&self, command: &CdoCommand) -> Result<ToolOutput>;
}

/// Spawns the real CDO binary and blocks until it exits.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CDO_PROGRAM)
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, command: &CdoCommand) -> Result<ToolOutput> {
        let args = command.args();
        debug!(program = %self.program, ?args, "spawning");
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;
        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run and turn a non-zero exit into [Error::ToolFailed].
pub fn run_checked(runner: &dyn ToolRunner, command: &CdoCommand) -> Result<ToolOutput> {
    let output = runner.run(command)?;
    if output.success() {
        Ok(output)
    } else {
        Err(Error::ToolFailed {
            command: command.to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdo::Operator;

    struct FixedRunner(ToolOutput);

    impl ToolRunner for FixedRunner {
        fn run(&self, _command: &CdoCommand) -> Result<ToolOutput> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn run_checked_reports_exit_code_and_stderr() {
        let runner = FixedRunner(ToolOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: "cdo mergetime (Abort): Open failed\n".to_string(),
        });
        let cmd = CdoCommand::new(Operator::MergeTime).input("a.nc").output("b.nc");
        match run_checked(&runner, &cmd) {
            Err(Error::ToolFailed { code, stderr, .. }) => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "cdo mergetime (Abort): Open failed");
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let runner = ProcessRunner::new("cordex-prep-no-such-binary");
        let cmd = CdoCommand::new(Operator::ShowDate).input("x.nc");
        assert!(matches!(runner.run(&cmd), Err(Error::Spawn { .. })));
    }
}
