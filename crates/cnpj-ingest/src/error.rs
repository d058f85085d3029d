//! Error types for CNPJ ingestion

use serde::Serialize;
use std::path::PathBuf;

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error types for ingestion
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    RemoteStatus { url: String, status: u16 },

    #[error("No .zip archives found in listing at {0}")]
    EmptyListing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Table {0} does not exist")]
    MissingTable(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Record {record}: {message}")]
    Record { record: u64, message: String },

    #[error("Invalid value '{value}' for column {column}: {message}")]
    Value {
        column: &'static str,
        value: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl IngestError {
    /// Attach the 1-based record number to a record-level error
    pub(crate) fn at_record(self, record: u64) -> Self {
        match self {
            IngestError::Value { column, value, message } => IngestError::Record {
                record,
                message: format!("invalid value '{}' for column {}: {}", value, column, message),
            },
            IngestError::Record { record: 0, message } => IngestError::Record { record, message },
            other => other,
        }
    }
}

/// Stage of the run in which a recoverable failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Probe,
    Download,
    Extract,
    Load,
    Index,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureStage::Probe => "probe",
            FailureStage::Download => "download",
            FailureStage::Extract => "extract",
            FailureStage::Load => "load",
            FailureStage::Index => "index",
        };
        f.write_str(name)
    }
}

/// A failure scoped to one artifact, file or index that did not stop the run
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub stage: FailureStage,
    /// Archive name, file path or index name
    pub item: String,
    pub error: String,
}

impl ItemFailure {
    pub fn new(stage: FailureStage, item: impl Into<String>, error: &IngestError) -> Self {
        Self {
            stage,
            item: item.into(),
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_error_gets_record_number() {
        let err = IngestError::Value {
            column: "capital_social",
            value: "abc".to_string(),
            message: "not a number".to_string(),
        }
        .at_record(7);

        let text = err.to_string();
        assert!(text.starts_with("Record 7:"), "{}", text);
        assert!(text.contains("capital_social"));
    }

    #[test]
    fn test_item_failure_keeps_context() {
        let err = IngestError::RemoteStatus {
            url: "https://example.test/Empresas0.zip".to_string(),
            status: 404,
        };
        let failure = ItemFailure::new(FailureStage::Download, "Empresas0.zip", &err);

        assert_eq!(failure.item, "Empresas0.zip");
        assert!(failure.error.contains("404"));
        assert_eq!(failure.stage.to_string(), "download");
    }
}
