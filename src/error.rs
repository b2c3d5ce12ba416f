use thiserror::Error;

/// Structural failures of the alignment core. Per-record problems never end
/// up here: the importer logs them and drops the record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignError {
    #[error("resolution must be between 1 and 60 minutes, got {0}")]
    InvalidResolution(u32),

    #[error("cannot derive a signal type from series name {name:?} (expected <type>_<rest>)")]
    MissingClassification { name: String },

    #[error("key series {key:?} not found among [{}]", .available.join(", "))]
    KeySeriesNotFound { key: String, available: Vec<String> },

    #[error("series {0:?} appears more than once")]
    DuplicateSeries(String),
}
