use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filename::FilenameRecord;

/// Column order of the catalogue file.
pub const CATALOGUE_COLUMNS: [&str; 15] = [
    "rcm_name",
    "driving_model",
    "experiment",
    "path",
    "project",
    "product",
    "domain",
    "institute",
    "ensemble",
    "rcm_name_id",
    "rcm_version",
    "time_frequency",
    "variable",
    "version",
    "date_range",
];

/// Values that are the same for every row of one catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueConstants {
    pub project: String,
    pub product: String,
    pub version: String,
}

/// Field order matches [CATALOGUE_COLUMNS]; serde uses it for the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueRow {
    pub rcm_name: String,
    pub driving_model: String,
    pub experiment: String,
    pub path: String,
    pub project: String,
    pub product: String,
    pub domain: String,
    pub institute: String,
    pub ensemble: String,
    pub rcm_name_id: String,
    pub rcm_version: String,
    pub time_frequency: String,
    pub variable: String,
    pub version: String,
    pub date_range: String,
}

impl CatalogueRow {
    pub fn from_record(record: &FilenameRecord, path: &Path, constants: &CatalogueConstants) -> Self {
        Self {
            rcm_name: record.rcm_name.clone(),
            driving_model: record.driving_model.clone(),
            experiment: record.experiment.clone(),
            path: path.display().to_string(),
            project: constants.project.clone(),
            product: constants.product.clone(),
            domain: record.domain.clone(),
            institute: record.institute.clone(),
            ensemble: record.ensemble.clone(),
            rcm_name_id: record.rcm_name_id(),
            rcm_version: record.rcm_version.clone(),
            time_frequency: record.frequency.clone(),
            variable: record.variable.clone(),
            version: constants.version.clone(),
            date_range: record.date_range.to_string(),
        }
    }
}

/// Append-only table of rows. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogue {
    rows: Vec<CatalogueRow>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: CatalogueRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[CatalogueRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write all rows with a header, replacing any existing file.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
        }
        let file = File::create(path).map_err(|err| Error::io(path, err))?;
        let mut writer = csv::Writer::from_writer(file);
        if self.rows.is_empty() {
            writer.write_record(CATALOGUE_COLUMNS)?;
        }
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(|err| Error::io(path, err))?;
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| Error::io(path, err))?;
        let mut reader = csv::Reader::from_reader(file);
        let mut catalogue = Self::new();
        for row in reader.deserialize() {
            catalogue.push(row?);
        }
        Ok(catalogue)
    }
}

impl Extend<CatalogueRow> for Catalogue {
    fn extend<T: IntoIterator<Item = CatalogueRow>>(&mut self, iter: T) {
        self.rows.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constants() -> CatalogueConstants {
        CatalogueConstants {
            project: "CORDEX".into(),
            product: "output".into(),
            version: "v1".into(),
        }
    }

    #[test]
    fn row_carries_both_rcm_identifiers() {
        let record = FilenameRecord::parse(
            "tasmin_AUS-44i_NOAA-GFDL-GFDL-ESM2M_rcp85_r1i1p1_CSIRO-CCAM-2008_v2_day_20060101-20991231.nc",
        )
        .unwrap();
        let row = CatalogueRow::from_record(&record, Path::new("/data/x.nc"), &constants());
        assert_eq!(row.rcm_name, "CCAM-2008");
        assert_eq!(row.rcm_name_id, "CSIRO-CCAM-2008");
        assert_eq!(row.time_frequency, "day");
        assert_eq!(row.date_range, "20060101-20991231");
        assert_eq!(row.path, "/data/x.nc");
    }

    #[test]
    fn empty_catalogue_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogue.csv");
        Catalogue::new().write_csv(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim_end(), CATALOGUE_COLUMNS.join(","));
    }
}
