//! Error types shared by the loader, the handler and the HTTP layer.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal startup errors; never caught, they abort initialization.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("model artifact not found at {}", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("model artifact at {} is corrupt or incompatible: {reason}", path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },
}

/// Per-request errors, converted to HTTP responses at the request boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// 400: a field failed its allow-list.
    #[error("{0}")]
    InvalidInput(String),

    /// 500: the model could not produce a usable value.
    #[error("Prediction error: {0}")]
    PredictionFailure(String),
}

/// Raised by a model backend while scoring a row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("column '{0}' is missing from the input row")]
    MissingColumn(String),

    #[error("column '{column}' expects a {expected} value")]
    CellType {
        column: String,
        expected: &'static str,
    },

    #[error("found unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("feature length mismatch: got {got}, expected {expected}")]
    Width { got: usize, expected: usize },

    #[error("{0}")]
    Backend(String),
}

/// Artifact parse/validation failures; surfaced as [`LoadError::ArtifactCorrupt`].
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported artifact version: {0}")]
    Version(u32),

    #[error("invalid artifact: {0}")]
    Invalid(String),
}

impl LoadError {
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        LoadError::ArtifactCorrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<ModelError> for PredictError {
    fn from(e: ModelError) -> Self {
        PredictError::PredictionFailure(e.to_string())
    }
}
