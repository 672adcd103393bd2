//! Shared plumbing for pipeline stages: run options, per-job actions and the
//! report every stage returns.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::cdo::{CdoCommand, ToolRunner};
use crate::error::{Error, Result};
use crate::parallel::WorkerPool;

/// Options common to every mutating stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Without this nothing is written; the plan is only reported.
    pub execute: bool,
    pub pool: WorkerPool,
}

impl RunOptions {
    pub fn dry_run() -> Self {
        Self::default()
    }

    pub fn execute() -> Self {
        Self {
            execute: true,
            pool: WorkerPool::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Planned,
    Executed,
    SkippedExisting,
    Skipped,
    Failed,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Executed => "executed",
            Self::SkippedExisting => "skipped_existing",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub target: String,
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Action {
    pub fn new(target: impl AsRef<Path>, status: ActionStatus) -> Self {
        Self {
            target: target.as_ref().display().to_string(),
            status,
            command: None,
            detail: None,
        }
    }

    pub fn with_command(mut self, command: impl ToString) -> Self {
        self.command = Some(command.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub dry_run: bool,
    pub planned: usize,
    pub executed: usize,
    pub skipped_existing: usize,
    pub skipped: usize,
    pub failed: usize,
    pub actions: Vec<Action>,
}

impl StageReport {
    pub fn new(stage: impl Into<String>, options: &RunOptions) -> Self {
        Self {
            stage: stage.into(),
            dry_run: !options.execute,
            ..Self::default()
        }
    }

    pub fn push(&mut self, action: Action) {
        match action.status {
            ActionStatus::Planned => self.planned += 1,
            ActionStatus::Executed => self.executed += 1,
            ActionStatus::SkippedExisting => self.skipped_existing += 1,
            ActionStatus::Skipped => self.skipped += 1,
            ActionStatus::Failed => self.failed += 1,
        }
        self.actions.push(action);
    }

    pub fn skip_existing(&mut self, target: &Path) {
        info!(output = %target.display(), "output exists, skipping");
        self.push(Action::new(target, ActionStatus::SkippedExisting));
    }

    pub fn skip(&mut self, target: &Path, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(output = %target.display(), %reason, "skipping");
        self.push(Action::new(target, ActionStatus::Skipped).with_detail(reason));
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Tab-separated summary line followed by one line per action.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "stage\tdry_run\tplanned\texecuted\tskipped_existing\tskipped\tfailed");
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.stage,
            self.dry_run,
            self.planned,
            self.executed,
            self.skipped_existing,
            self.skipped,
            self.failed
        );
        for action in &self.actions {
            let extra = action
                .detail
                .as_deref()
                .or(action.command.as_deref())
                .unwrap_or("");
            let _ = writeln!(out, "{}\t{}\t{}", action.status.as_str(), action.target, extra);
        }
        out
    }
}

/// A CDO invocation producing one output file.
#[derive(Debug, Clone)]
pub struct ToolJob {
    pub target: PathBuf,
    pub command: CdoCommand,
}

impl ToolJob {
    pub fn new(target: PathBuf, command: CdoCommand) -> Self {
        Self { target, command }
    }
}

/// Run (or, in a dry run, just record) every job and append the outcomes.
pub fn dispatch(
    runner: &dyn ToolRunner,
    jobs: &[ToolJob],
    options: &RunOptions,
    report: &mut StageReport,
) -> Result<()> {
    if !options.execute {
        for job in jobs {
            info!(output = %job.target.display(), command = %job.command, "planned");
            report.push(Action::new(&job.target, ActionStatus::Planned).with_command(&job.command));
        }
        return Ok(());
    }

    let actions = options.pool.map(jobs, |job| run_job(runner, job))?;
    for action in actions {
        report.push(action);
    }
    Ok(())
}

fn run_job(runner: &dyn ToolRunner, job: &ToolJob) -> Action {
    let action = Action::new(&job.target, ActionStatus::Executed).with_command(&job.command);
    if let Some(parent) = job.target.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            let err = Error::io(parent, err);
            warn!(output = %job.target.display(), %err, "cannot create output directory");
            return Action {
                status: ActionStatus::Failed,
                ..action
            }
            .with_detail(err.to_string());
        }
    }

    match crate::cdo::run_checked(runner, &job.command) {
        Ok(_) => {
            info!(output = %job.target.display(), "written");
            action
        }
        Err(err) => {
            warn!(output = %job.target.display(), %err, "job failed");
            remove_partial_output(&job.target);
            Action {
                status: ActionStatus::Failed,
                ..action
            }
            .with_detail(err.to_string())
        }
    }
}

/// A failed run may leave a truncated file that the skip-if-exists check
/// would later mistake for a finished one.
pub(crate) fn remove_partial_output(target: &Path) {
    if target.exists() {
        match fs::remove_file(target) {
            Ok(()) => info!(output = %target.display(), "removed partial output"),
            Err(err) => warn!(output = %target.display(), %err, "could not remove partial output"),
        }
    }
}
