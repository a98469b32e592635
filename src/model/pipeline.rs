//! JSON pipeline artifact: column encoders followed by one regressor.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use super::encoding::{encode_row, validate_columns, ColumnEncoder};
use super::tree::Tree;
use super::Predictor;
use crate::error::{ArtifactError, ModelError};
use crate::row::FeatureRow;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// `base_score + learning_rate * sum(trees)`
    GradientBoosting {
        base_score: f64,
        learning_rate: f64,
        trees: Vec<Tree>,
    },
    /// Mean over trees.
    RandomForest { trees: Vec<Tree> },
}

impl Regressor {
    pub fn kind(&self) -> &'static str {
        match self {
            Regressor::Linear { .. } => "linear",
            Regressor::GradientBoosting { .. } => "gradient_boosting",
            Regressor::RandomForest { .. } => "random_forest",
        }
    }

    fn validate(&self, width: usize) -> Result<(), ArtifactError> {
        match self {
            Regressor::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != width {
                    return Err(ArtifactError::Invalid(format!(
                        "linear regressor has {} coefficients, encoders produce {width} features",
                        coefficients.len()
                    )));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ArtifactError::Invalid(
                        "linear regressor has non-finite weights".into(),
                    ));
                }
                Ok(())
            }
            Regressor::GradientBoosting {
                base_score,
                learning_rate,
                trees,
            } => {
                if !base_score.is_finite() || !learning_rate.is_finite() {
                    return Err(ArtifactError::Invalid(
                        "gradient boosting needs a finite base_score and learning_rate".into(),
                    ));
                }
                validate_trees(trees, width)
            }
            Regressor::RandomForest { trees } => validate_trees(trees, width),
        }
    }

    fn predict(&self, x: &[f64]) -> f64 {
        match self {
            Regressor::Linear {
                coefficients,
                intercept,
            } => intercept + coefficients.iter().zip(x).map(|(w, v)| w * v).sum::<f64>(),
            Regressor::GradientBoosting {
                base_score,
                learning_rate,
                trees,
            } => base_score + learning_rate * trees.iter().map(|t| t.evaluate(x)).sum::<f64>(),
            Regressor::RandomForest { trees } => {
                trees.iter().map(|t| t.evaluate(x)).sum::<f64>() / trees.len() as f64
            }
        }
    }
}

fn validate_trees(trees: &[Tree], width: usize) -> Result<(), ArtifactError> {
    if trees.is_empty() {
        return Err(ArtifactError::Invalid("tree ensemble has no trees".into()));
    }
    for (i, tree) in trees.iter().enumerate() {
        tree.validate(width)
            .map_err(|e| ArtifactError::Invalid(format!("tree {i}: {e}")))?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub version: u32,
    pub columns: Vec<ColumnEncoder>,
    pub regressor: Regressor,
}

/// A validated pipeline, ready to score rows.
#[derive(Debug, Clone)]
pub struct PipelineModel {
    columns: Vec<ColumnEncoder>,
    regressor: Regressor,
    width: usize,
}

impl PipelineModel {
    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self, ArtifactError> {
        if artifact.version != FORMAT_VERSION {
            return Err(ArtifactError::Version(artifact.version));
        }
        let width = validate_columns(&artifact.columns)?;
        artifact.regressor.validate(width)?;
        Ok(Self {
            columns: artifact.columns,
            regressor: artifact.regressor,
            width,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let artifact: PipelineArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Encoded feature count.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn columns(&self) -> &[ColumnEncoder] {
        &self.columns
    }
}

impl Predictor for PipelineModel {
    fn predict_row(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        let x = encode_row(&self.columns, row)?;
        if x.len() != self.width {
            return Err(ModelError::Width {
                got: x.len(),
                expected: self.width,
            });
        }
        Ok(self.regressor.predict(&x))
    }

    fn describe(&self) -> String {
        format!(
            "{} pipeline, {} columns, {} features",
            self.regressor.kind(),
            self.columns.len(),
            self.width
        )
    }
}
