//! Metadata catalogue of regridded output files.
//!
//! One row per file in each experiment subdirectory, built purely from the
//! filename. Unparsable names abort the build unless `skip_invalid` is set.

pub mod row;

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::filename::{FilenameError, FilenameRecord};
use crate::scan;
use crate::stage::{Action, ActionStatus, RunOptions, StageReport};

pub use row::{Catalogue, CatalogueConstants, CatalogueRow, CATALOGUE_COLUMNS};

/// Rows built plus the files that were left out.
#[derive(Debug, Default)]
pub struct CatalogueBuild {
    pub catalogue: Catalogue,
    pub skipped: Vec<(PathBuf, FilenameError)>,
}

pub fn build_catalogue(config: &PipelineConfig) -> Result<CatalogueBuild> {
    let settings = &config.catalogue;
    let constants = CatalogueConstants {
        project: settings.project.clone(),
        product: settings.product.clone(),
        version: settings.version.clone(),
    };
    let mut build = CatalogueBuild::default();

    for experiment in &config.experiments {
        let dir = settings.input_dir.join(experiment);
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "experiment directory missing from catalogue input");
            continue;
        }
        for path in scan::list_files(&dir)? {
            let Some(name) = scan::file_name(&path) else {
                continue;
            };
            match FilenameRecord::parse_with_institutes(name, &config.extra_institutes) {
                Ok(record) => build
                    .catalogue
                    .push(CatalogueRow::from_record(&record, &path, &constants)),
                Err(err) if settings.skip_invalid => {
                    warn!(path = %path.display(), %err, "skipping unparsable filename");
                    build.skipped.push((path, err));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
    Ok(build)
}

pub fn run_catalogue(config: &PipelineConfig, options: &RunOptions) -> Result<StageReport> {
    let mut report = StageReport::new("catalogue", options);
    let build = build_catalogue(config)?;

    let status = if options.execute {
        ActionStatus::Executed
    } else {
        ActionStatus::Planned
    };
    for row in build.catalogue.rows() {
        report.push(Action::new(&row.path, status));
    }
    for (path, err) in &build.skipped {
        report.push(Action::new(path, ActionStatus::Skipped).with_detail(err.to_string()));
    }

    let output = &config.catalogue.output;
    if options.execute {
        build.catalogue.write_csv(output)?;
        info!(path = %output.display(), rows = build.catalogue.len(), "catalogue written");
    } else {
        info!(path = %output.display(), rows = build.catalogue.len(), "catalogue not written (dry run)");
    }
    Ok(report)
}
