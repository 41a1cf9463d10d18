use thiserror::Error;

/// Fatal configuration problems, detected before any document is touched.
///
/// Nothing else aborts a run: match failures, unresolved fields and
/// annotation overflow are all recorded as data on the record sets and
/// surfaced through the report.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse preset: {0}")]
    Parse(String),

    #[error("Preset has no field mappings")]
    NoFields,

    #[error("Field '{0}' is mapped more than once")]
    DuplicateField(String),

    #[error("Invalid {what} pattern: {source}")]
    BadPattern {
        what: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Record strategy must set exactly one of pages_per_set or marker_pattern")]
    BadRecordStrategy,

    #[error("pages_per_set must be at least 1")]
    ZeroRecordPages,

    #[error("Unknown rule '{0}' referenced by a field mapping")]
    UnknownRule(String),

    #[error("Region for '{0}' has an empty bounding box")]
    EmptyRegionBox(String),

    #[error("Minimum font size {min} exceeds default font size {default}")]
    BadFontSizes { min: f64, default: f64 },

    #[error("Ledger has no '{0}' column")]
    MissingKeyColumn(String),

    #[error("Failed to load manual values: {0}")]
    ManualValues(String),
}

/// A single document failed to read or write.
///
/// The document is reported as failed and the batch continues with the
/// next one.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read document: {0}")]
    Read(String),

    #[error("Failed to write annotated copy: {0}")]
    Write(String),
}
