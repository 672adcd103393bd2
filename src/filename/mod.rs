//! CORDEX filename parsing.
//!
//! Every stage of the pipeline keys off the positional filename convention
//! `variable_domain_drivingModel_experiment_ensemble_institute-rcmName_rcmVersion_frequency_start-end.ext`.

pub mod date_range;
pub mod record;

use thiserror::Error;

pub use date_range::{merged_date_range, DateRange};
pub use record::{FilenameRecord, FIELD_COUNT, FIELD_DELIMITER, KNOWN_COMPOUND_INSTITUTES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilenameError {
    #[error("'{name}' has {found} '_'-separated fields, expected {expected}")]
    FieldCount {
        name: String,
        found: usize,
        expected: usize,
    },

    #[error("'{name}' does not end in a <start>-<end> date range")]
    MissingDateRange { name: String },

    #[error("date range '{token}' is malformed: {reason}")]
    MalformedDateRange { token: String, reason: String },

    #[error("institute token '{token}' in '{name}' has no '-' separating institute and model")]
    MissingInstitute { name: String, token: String },

    #[error("cannot derive a date range from an empty file set")]
    EmptyInput,

    #[error("date '{other}' has a different width than '{first}'; lexicographic order would be wrong")]
    MixedDateWidths { first: String, other: String },
}

/// Strip any directory components so paths and bare names parse alike.
pub(crate) fn bare_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
