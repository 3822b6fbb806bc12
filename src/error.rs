// src/error.rs

use thiserror::Error;

/// Failures that abort an ingestion cycle or a table operation.
///
/// Extraction-level ambiguities (no regional zipcode match, an unknown
/// submission type) are not represented here: they resolve to a missing
/// value or the default category and are only logged.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The first submission is missing labels the normalizer indexes.
    #[error("form schema is missing required field labels: {}", .missing.join(", "))]
    SchemaResolution { missing: Vec<&'static str> },

    /// Connect failure, timeout or non-success HTTP status from the forms API.
    #[error("forms API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The forms API answered, but not with `success`.
    #[error("forms API returned `{0}`")]
    Api(String),

    /// The response body could not be decoded.
    #[error("decoding forms payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("table I/O: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted table could not be encoded or decoded.
    #[error("table format: {0}")]
    Table(String),

    #[error("table is empty")]
    EmptyTable,

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        IngestError::Table(e.to_string())
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
