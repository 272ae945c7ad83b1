//! Error type shared by the ingestion pipeline and the analysis engines.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackStatsError>;

#[derive(Debug, Error)]
pub enum TrackStatsError {
    /// A year or year range outside the allowed bounds.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A single input row that cannot be converted. The loader skips and
    /// counts these instead of propagating them.
    #[error("Malformed record at line {line}: field '{field}' {reason}")]
    MalformedRecord {
        line: u64,
        field: &'static str,
        reason: String,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Referential integrity violation: {table} row {id} does not exist")]
    ReferentialIntegrity { table: &'static str, id: i64 },

    #[error("Source is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Artist '{0}' not found")]
    ArtistNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackStatsError {
    pub(crate) fn schema(err: anyhow::Error) -> Self {
        TrackStatsError::Schema(format!("{:#}", err))
    }
}
