//! Reward points prediction service: loads a regression artifact once and
//! serves `POST /predict` over axum.

pub mod config;
pub mod error;
pub mod model;
pub mod predict;
pub mod row;
pub mod server;
pub mod types;

pub use error::{LoadError, ModelError, PredictError};
pub use model::{ArtifactSource, Predictor};
pub use predict::{RewardPredictor, SignPolicy};
pub use types::{PredictionRequest, PredictionResult};
