use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("{file_name} not found — place it in {}", .dir.display())]
    MissingPrimaryData { file_name: String, dir: PathBuf },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<PolarsError> for DashboardError {
    fn from(e: PolarsError) -> Self {
        DashboardError::Polars(e.to_string())
    }
}

impl DashboardError {
    /// Errors that must stop the page from rendering anything but the message.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DashboardError::MissingPrimaryData { .. } | DashboardError::Schema(_))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_primary_message_names_file_and_folder() {
        let err = DashboardError::MissingPrimaryData {
            file_name: "predictions_2026.csv".to_string(),
            dir: PathBuf::from("/srv/app"),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("predictions_2026.csv not found"));
        assert!(msg.contains("/srv/app"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_io_error_is_not_fatal() {
        let err: DashboardError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(!err.is_fatal());
    }
}
