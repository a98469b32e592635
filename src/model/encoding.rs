//! Column encoders: turn a [`FeatureRow`] into the dense vector a regressor
//! consumes. Columns are looked up by name and emitted in encoder order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ArtifactError, ModelError};
use crate::row::{Cell, FeatureRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    #[default]
    Error,
    Ignore,
}

fn unit_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnEncoder {
    /// One-hot over `categories`.
    Categorical {
        name: String,
        categories: Vec<String>,
        #[serde(default)]
        handle_unknown: UnknownPolicy,
    },
    /// 1.0 / 0.0
    Boolean { name: String },
    /// `(x - mean) / scale`; booleans count as 0/1.
    Numeric {
        name: String,
        #[serde(default)]
        mean: f64,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
}

impl ColumnEncoder {
    pub fn name(&self) -> &str {
        match self {
            ColumnEncoder::Categorical { name, .. }
            | ColumnEncoder::Boolean { name }
            | ColumnEncoder::Numeric { name, .. } => name,
        }
    }

    /// Number of output features this column produces.
    pub fn width(&self) -> usize {
        match self {
            ColumnEncoder::Categorical { categories, .. } => categories.len(),
            ColumnEncoder::Boolean { .. } | ColumnEncoder::Numeric { .. } => 1,
        }
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            ColumnEncoder::Categorical {
                name, categories, ..
            } => {
                if categories.is_empty() {
                    return Err(ArtifactError::Invalid(format!(
                        "categorical column '{name}' has no categories"
                    )));
                }
                let unique: HashSet<&String> = categories.iter().collect();
                if unique.len() != categories.len() {
                    return Err(ArtifactError::Invalid(format!(
                        "categorical column '{name}' has duplicate categories"
                    )));
                }
            }
            ColumnEncoder::Numeric { name, mean, scale } => {
                if !mean.is_finite() || !scale.is_finite() || *scale == 0.0 {
                    return Err(ArtifactError::Invalid(format!(
                        "numeric column '{name}' needs a finite mean and a finite non-zero scale"
                    )));
                }
            }
            ColumnEncoder::Boolean { .. } => {}
        }
        Ok(())
    }

    fn encode(&self, cell: &Cell, out: &mut Vec<f64>) -> Result<(), ModelError> {
        match (self, cell) {
            (
                ColumnEncoder::Categorical {
                    name,
                    categories,
                    handle_unknown,
                },
                Cell::Text(value),
            ) => {
                let hit = categories.iter().position(|c| c == value);
                if hit.is_none() && *handle_unknown == UnknownPolicy::Error {
                    return Err(ModelError::UnknownCategory {
                        column: name.clone(),
                        value: value.clone(),
                    });
                }
                out.extend((0..categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
            }
            (ColumnEncoder::Boolean { .. }, Cell::Bool(b)) => out.push(bool_value(*b)),
            (ColumnEncoder::Numeric { mean, scale, .. }, Cell::Number(x)) => {
                out.push((x - mean) / scale)
            }
            (ColumnEncoder::Numeric { mean, scale, .. }, Cell::Bool(b)) => {
                out.push((bool_value(*b) - mean) / scale)
            }
            (enc, _) => {
                return Err(ModelError::CellType {
                    column: enc.name().to_string(),
                    expected: match enc {
                        ColumnEncoder::Categorical { .. } => "text",
                        ColumnEncoder::Boolean { .. } => "boolean",
                        ColumnEncoder::Numeric { .. } => "numeric",
                    },
                })
            }
        }
        Ok(())
    }
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Checks every encoder and returns the total encoded width.
pub fn validate_columns(columns: &[ColumnEncoder]) -> Result<usize, ArtifactError> {
    if columns.is_empty() {
        return Err(ArtifactError::Invalid("artifact declares no columns".into()));
    }
    let mut seen = HashSet::new();
    for col in columns {
        if !seen.insert(col.name()) {
            return Err(ArtifactError::Invalid(format!(
                "column '{}' is declared twice",
                col.name()
            )));
        }
        col.validate()?;
    }
    Ok(columns.iter().map(ColumnEncoder::width).sum())
}

/// Encodes `row`; columns the encoders do not mention are dropped.
pub fn encode_row(columns: &[ColumnEncoder], row: &FeatureRow) -> Result<Vec<f64>, ModelError> {
    let mut out = Vec::with_capacity(columns.iter().map(ColumnEncoder::width).sum());
    for col in columns {
        let cell = row
            .get(col.name())
            .ok_or_else(|| ModelError::MissingColumn(col.name().to_string()))?;
        col.encode(cell, &mut out)?;
    }
    Ok(out)
}
