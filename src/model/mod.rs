//! Model artifacts and the loader that turns one into a shared [`Predictor`].

pub mod encoding;
pub mod pipeline;
#[cfg(feature = "torch")]
pub mod torch;
pub mod tree;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::{LoadError, ModelError};
use crate::row::FeatureRow;

pub use pipeline::PipelineModel;

/// Single-row regression. Implementations are read-only after load and are
/// shared across request threads.
pub trait Predictor: Send + Sync {
    fn predict_row(&self, row: &FeatureRow) -> Result<f64, ModelError>;

    /// One-line summary for startup logs.
    fn describe(&self) -> String;
}

/// Where to find the artifact (and, for TorchScript, its column metadata).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    pub path: PathBuf,
    pub meta_path: Option<PathBuf>,
}

impl ArtifactSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            meta_path: None,
        }
    }

    pub fn with_meta(mut self, meta_path: impl Into<PathBuf>) -> Self {
        self.meta_path = Some(meta_path.into());
        self
    }

    /// Explicit meta path, or `<model>.meta.json` next to the artifact.
    pub fn meta_path(&self) -> PathBuf {
        self.meta_path
            .clone()
            .unwrap_or_else(|| self.path.with_extension("meta.json"))
    }

    fn is_torchscript(&self) -> bool {
        matches!(
            self.path.extension().and_then(|e| e.to_str()),
            Some("pt" | "ts" | "torchscript")
        )
    }
}

/// Loads the artifact once. Missing files and unreadable artifacts are both
/// fatal to the caller; there is no retry.
pub fn load(source: &ArtifactSource) -> Result<Arc<dyn Predictor>, LoadError> {
    ensure_exists(&source.path)?;

    if source.is_torchscript() {
        return load_torchscript(source);
    }

    let model = PipelineModel::load(&source.path).map_err(|e| LoadError::corrupt(&source.path, e))?;
    tracing::info!(path = %source.path.display(), "loaded {}", model.describe());
    Ok(Arc::new(model))
}

fn ensure_exists(path: &Path) -> Result<(), LoadError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(LoadError::ArtifactMissing {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(feature = "torch")]
fn load_torchscript(source: &ArtifactSource) -> Result<Arc<dyn Predictor>, LoadError> {
    let meta = source.meta_path();
    ensure_exists(&meta)?;
    let model = torch::TorchModel::load(&source.path, &meta)
        .map_err(|e| LoadError::corrupt(&source.path, format!("{e:#}")))?;
    tracing::info!(path = %source.path.display(), "loaded {}", model.describe());
    Ok(Arc::new(model))
}

#[cfg(not(feature = "torch"))]
fn load_torchscript(source: &ArtifactSource) -> Result<Arc<dyn Predictor>, LoadError> {
    Err(LoadError::corrupt(
        &source.path,
        "unsupported artifact format: TorchScript models need the `torch` feature",
    ))
}
