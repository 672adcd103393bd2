//! Date ranges encoded as the final `<start>-<end>` filename field.
//!
//! Dates are compared as raw strings. That only matches chronological order
//! for fixed-width encodings such as `YYYYMMDD`, so widths are checked.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{bare_name, FilenameError, FIELD_DELIMITER};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Parse a bare `<start>-<end>` token (no extension).
    pub fn parse(token: &str) -> Result<Self, FilenameError> {
        let malformed = |reason: &str| FilenameError::MalformedDateRange {
            token: token.to_string(),
            reason: reason.to_string(),
        };
        let (start, end) = token.split_once('-').ok_or_else(|| malformed("missing '-'"))?;
        if start.is_empty() || end.is_empty() {
            return Err(malformed("empty start or end"));
        }
        if !start.bytes().all(|b| b.is_ascii_digit()) || !end.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed("dates must be digits only"));
        }
        if start.len() != end.len() {
            return Err(malformed("start and end differ in width"));
        }
        Ok(Self::new(start, end))
    }

    /// Extract the range from the last `_` field of a filename, dropping the extension.
    pub fn from_filename(name: &str) -> Result<Self, FilenameError> {
        let name = bare_name(name);
        let last = name
            .rsplit(FIELD_DELIMITER)
            .next()
            .filter(|_| name.contains(FIELD_DELIMITER))
            .ok_or_else(|| FilenameError::MissingDateRange {
                name: name.to_string(),
            })?;
        let token = last.split_once('.').map_or(last, |(range, _ext)| range);
        Self::parse(token).map_err(|_| FilenameError::MissingDateRange {
            name: name.to_string(),
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl From<DateRange> for String {
    fn from(range: DateRange) -> Self {
        range.to_string()
    }
}

impl TryFrom<String> for DateRange {
    type Error = FilenameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Minimum start and maximum end across a set of filenames.
///
/// # Example
/// ```
/// # use cordex_prep::filename::merged_date_range;
/// let range = merged_date_range([
///     "pr_AUS-44_M_rcp85_r1i1p1_CSIRO-CCAM-2008_v1_day_20060101-20301231.nc",
///     "pr_AUS-44_M_rcp85_r1i1p1_CSIRO-CCAM-2008_v1_day_20310101-20551231.nc",
/// ])
/// .unwrap();
/// assert_eq!(range.to_string(), "20060101-20551231");
/// ```
pub fn merged_date_range<I, S>(names: I) -> Result<DateRange, FilenameError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merged: Option<DateRange> = None;
    for name in names {
        let range = DateRange::from_filename(name.as_ref())?;
        merged = Some(match merged {
            None => range,
            Some(acc) => {
                if acc.start.len() != range.start.len() {
                    return Err(FilenameError::MixedDateWidths {
                        first: acc.start,
                        other: range.start,
                    });
                }
                DateRange {
                    start: acc.start.min(range.start),
                    end: acc.end.max(range.end),
                }
            }
        });
    }
    merged.ok_or(FilenameError::EmptyInput)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_range_from_historical_filename() {
        let range = DateRange::from_filename(
            "tasmax_AUS-44_CCCma-CanESM2_historical_r1i1p1_UNSW-WRF360J_v1_day_19600101-20051231.nc",
        )
        .unwrap();
        assert_eq!(range.start, "19600101");
        assert_eq!(range.end, "20051231");
    }

    #[test]
    fn extracts_range_from_path_without_extension() {
        let range = DateRange::from_filename("/data/pr/x_y_19700101-19701231").unwrap();
        assert_eq!(range, DateRange::new("19700101", "19701231"));
    }

    #[test]
    fn merges_consecutive_chunks() {
        let range = merged_date_range([
            "pr_d_m_rcp45_r1i1p1_I-M_v1_day_20310101-20551231.nc",
            "pr_d_m_rcp45_r1i1p1_I-M_v1_day_20060101-20301231.nc",
        ])
        .unwrap();
        assert_eq!(range.to_string(), "20060101-20551231");
    }

    #[test]
    fn empty_input_is_an_error() {
        let names: [&str; 0] = [];
        assert_eq!(merged_date_range(names), Err(FilenameError::EmptyInput));
    }

    #[test]
    fn rejects_mixed_widths() {
        let err = merged_date_range(["a_b_196001-200512.nc", "a_b_20060101-20301231.nc"])
            .unwrap_err();
        assert!(matches!(err, FilenameError::MixedDateWidths { .. }));
    }

    #[test]
    fn rejects_missing_range() {
        assert!(matches!(
            DateRange::from_filename("orog_AUS-44_fx.nc"),
            Err(FilenameError::MissingDateRange { .. })
        ));
        assert!(DateRange::parse("20060101-2030").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&DateRange::new("20060101", "20991231")).unwrap();
        assert_eq!(json, "\"20060101-20991231\"");
        let back: DateRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back.end, "20991231");
    }
}
