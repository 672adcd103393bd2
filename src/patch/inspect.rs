//! Day counts per month from `cdo showdate`, for eyeballing gaps after a patch.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::cdo::{run_checked, CdoCommand, Operator, ToolRunner};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayCounts {
    /// Keyed by `YYYY-MM`.
    pub months: BTreeMap<String, usize>,
    pub unparsed: usize,
}

impl DayCounts {
    pub fn total_days(&self) -> usize {
        self.months.values().sum()
    }

    pub fn days_in(&self, year: i32, month: u32) -> usize {
        self.months
            .get(&format!("{year:04}-{month:02}"))
            .copied()
            .unwrap_or(0)
    }

    /// Tab-separated `year  month  days`.
    pub fn render_table(&self) -> String {
        let mut out = String::from("year\tmonth\tdays\n");
        for (key, days) in &self.months {
            let (year, month) = key.split_once('-').unwrap_or((key.as_str(), ""));
            let _ = writeln!(out, "{year}\t{month}\t{days}");
        }
        out
    }
}

/// Count `YYYY-MM-DD` tokens in `showdate` output.
pub fn count_days(showdate_output: &str) -> DayCounts {
    let mut counts = DayCounts::default();
    for token in showdate_output.split_whitespace() {
        let bytes = token.as_bytes();
        let well_formed = token.len() >= 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && token[..4].bytes().all(|b| b.is_ascii_digit())
            && token[5..7].bytes().all(|b| b.is_ascii_digit());
        if well_formed {
            *counts.months.entry(token[..7].to_string()).or_insert(0) += 1;
        } else {
            counts.unparsed += 1;
        }
    }
    counts
}

pub fn inspect_file(runner: &dyn ToolRunner, path: &Path) -> Result<DayCounts> {
    let command = CdoCommand::new(Operator::ShowDate).silent().input(path);
    let output = run_checked(runner, &command)?;
    Ok(count_days(&output.stdout))
}
