use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{bare_name, DateRange, FilenameError};

pub const FIELD_DELIMITER: char = '_';
pub const FIELD_COUNT: usize = 9;

/// Institutes whose own name contains a hyphen, so the `institute-rcmName`
/// field cannot be split on its first hyphen.
pub const KNOWN_COMPOUND_INSTITUTES: &[&str] = &[
    "CLMcom-HZG",
    "CLMcom-ETH",
    "CLMcom-BTU",
    "CLMcom-KIT",
    "CLMcom-CMCC",
    "IPSL-INERIS",
];

/// Positional fields of one CORDEX output filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameRecord {
    pub variable: String,
    pub domain: String,
    pub driving_model: String,
    pub experiment: String,
    pub ensemble: String,
    pub institute: String,
    pub rcm_name: String,
    pub rcm_version: String,
    pub frequency: String,
    pub date_range: DateRange,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extension: String,
}

impl FilenameRecord {
    pub fn parse(name: &str) -> Result<Self, FilenameError> {
        Self::parse_with_institutes(name, &[])
    }

    /// Parse, treating `extra_institutes` as additional compound institute names.
    pub fn parse_with_institutes(
        name: &str,
        extra_institutes: &[String],
    ) -> Result<Self, FilenameError> {
        let name = bare_name(name);
        let fields: Vec<&str> = name.split(FIELD_DELIMITER).collect();
        if fields.len() != FIELD_COUNT {
            return Err(FilenameError::FieldCount {
                name: name.to_string(),
                found: fields.len(),
                expected: FIELD_COUNT,
            });
        }

        let last = fields[8];
        let (range_token, extension) = last.split_once('.').unwrap_or((last, ""));
        let date_range =
            DateRange::parse(range_token).map_err(|_| FilenameError::MissingDateRange {
                name: name.to_string(),
            })?;

        let (institute, rcm_name) = split_institute(fields[5], extra_institutes).ok_or_else(
            || FilenameError::MissingInstitute {
                name: name.to_string(),
                token: fields[5].to_string(),
            },
        )?;

        Ok(Self {
            variable: fields[0].to_string(),
            domain: fields[1].to_string(),
            driving_model: fields[2].to_string(),
            experiment: fields[3].to_string(),
            ensemble: fields[4].to_string(),
            institute: institute.to_string(),
            rcm_name: rcm_name.to_string(),
            rcm_version: fields[6].to_string(),
            frequency: fields[7].to_string(),
            date_range,
            extension: extension.to_string(),
        })
    }

    /// The combined `institute-rcmName` field as it appears in the filename.
    pub fn rcm_name_id(&self) -> String {
        format!("{}-{}", self.institute, self.rcm_name)
    }

    /// Filename without the trailing `_<start>-<end>.<ext>`.
    pub fn stem(&self) -> String {
        [
            self.variable.as_str(),
            &self.domain,
            &self.driving_model,
            &self.experiment,
            &self.ensemble,
            &self.rcm_name_id(),
            &self.rcm_version,
            &self.frequency,
        ]
        .join("_")
    }

    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            format!("{}_{}", self.stem(), self.date_range)
        } else {
            format!("{}_{}.{}", self.stem(), self.date_range, self.extension)
        }
    }

    pub fn with_domain(&self, domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            ..self.clone()
        }
    }

    pub fn with_date_range(&self, date_range: DateRange) -> Self {
        Self {
            date_range,
            ..self.clone()
        }
    }

    pub fn with_variable(&self, variable: &str) -> Self {
        Self {
            variable: variable.to_string(),
            ..self.clone()
        }
    }
}

impl fmt::Display for FilenameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

impl FromStr for FilenameRecord {
    type Err = FilenameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split `institute-rcmName`, longest known compound institute first.
fn split_institute<'a>(token: &'a str, extra: &[String]) -> Option<(&'a str, &'a str)> {
    let mut known: Vec<&str> = KNOWN_COMPOUND_INSTITUTES
        .iter()
        .copied()
        .chain(extra.iter().map(String::as_str))
        .collect();
    known.sort_by_key(|inst| std::cmp::Reverse(inst.len()));

    for inst in known {
        if let Some(rest) = token
            .strip_prefix(inst)
            .and_then(|rest| rest.strip_prefix('-'))
        {
            if !rest.is_empty() {
                return Some((&token[..inst.len()], rest));
            }
        }
    }

    token
        .split_once('-')
        .filter(|(inst, model)| !inst.is_empty() && !model.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CCAM: &str =
        "tasmin_AUS-44i_NOAA-GFDL-GFDL-ESM2M_rcp85_r1i1p1_CSIRO-CCAM-2008_v2_day_20060101-20991231.nc";

    #[test]
    fn parses_all_nine_fields() {
        let rec = FilenameRecord::parse(CCAM).unwrap();
        assert_eq!(rec.variable, "tasmin");
        assert_eq!(rec.domain, "AUS-44i");
        assert_eq!(rec.driving_model, "NOAA-GFDL-GFDL-ESM2M");
        assert_eq!(rec.experiment, "rcp85");
        assert_eq!(rec.ensemble, "r1i1p1");
        assert_eq!(rec.institute, "CSIRO");
        assert_eq!(rec.rcm_name, "CCAM-2008");
        assert_eq!(rec.rcm_version, "v2");
        assert_eq!(rec.frequency, "day");
        assert_eq!(rec.date_range.to_string(), "20060101-20991231");
        assert_eq!(rec.extension, "nc");
    }

    #[test]
    fn compound_institute_overrides_first_hyphen() {
        let rec = FilenameRecord::parse(
            "pr_AUS-44_MPI-M-MPI-ESM-LR_historical_r1i1p1_CLMcom-HZG-CCLM5-0-15_v1_day_19700101-19741231.nc",
        )
        .unwrap();
        assert_eq!(rec.institute, "CLMcom-HZG");
        assert_eq!(rec.rcm_name, "CCLM5-0-15");
        assert_eq!(rec.rcm_name_id(), "CLMcom-HZG-CCLM5-0-15");
    }

    #[test]
    fn extra_institutes_extend_the_table() {
        let extra = vec!["UNSW-CC".to_string()];
        let rec = FilenameRecord::parse_with_institutes(
            "pr_AUS-44_M_rcp45_r1i1p1_UNSW-CC-WRF360J_v1_day_20060101-20101231.nc",
            &extra,
        )
        .unwrap();
        assert_eq!(rec.institute, "UNSW-CC");
        assert_eq!(rec.rcm_name, "WRF360J");
    }

    #[test]
    fn round_trips_file_name_and_substitutes_domain() {
        let rec = FilenameRecord::parse(CCAM).unwrap();
        assert_eq!(rec.file_name(), CCAM);
        let regridded = rec.with_domain("AUS-22");
        assert!(regridded.file_name().starts_with("tasmin_AUS-22_NOAA"));
        assert_eq!(
            rec.stem(),
            "tasmin_AUS-44i_NOAA-GFDL-GFDL-ESM2M_rcp85_r1i1p1_CSIRO-CCAM-2008_v2_day"
        );
    }

    #[test]
    fn wrong_field_count_fails_fast() {
        let err = FilenameRecord::parse("pr_AUS-44_rcp85_day_20060101-20991231.nc").unwrap_err();
        assert_eq!(
            err,
            FilenameError::FieldCount {
                name: "pr_AUS-44_rcp85_day_20060101-20991231.nc".to_string(),
                found: 5,
                expected: FIELD_COUNT,
            }
        );
    }

    #[test]
    fn institute_without_hyphen_fails() {
        let err = FilenameRecord::parse("pr_AUS-44_M_rcp85_r1i1p1_CSIRO_v2_day_20060101-20991231.nc")
            .unwrap_err();
        assert!(matches!(err, FilenameError::MissingInstitute { .. }));
    }

    #[test]
    fn parses_from_full_path() {
        let path = format!("/scratch/step2/rcp85/{CCAM}");
        let rec: FilenameRecord = path.parse().unwrap();
        assert_eq!(rec.variable, "tasmin");
    }
}
