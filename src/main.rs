use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use reward_predictor::{
    config::ServiceConfig,
    model,
    server::{self, AppState},
    PredictionRequest, RewardPredictor,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServiceConfig::load().context("failed to load service configuration")?;
    let addr = cfg.bind_addr()?;
    let artifact = cfg.artifact();
    tracing::info!("loading model from {}", artifact.path.display());

    // Missing or unreadable artifacts end the process here, before binding
    let mdl = model::load(&artifact)?;
    let predictor = Arc::new(RewardPredictor::new(mdl, cfg.sign_policy));
    tracing::info!("sign policy: {}", predictor.policy());

    // Warmup on the reference payload; failure here usually means the
    // artifact was trained on different columns
    match predictor.predict(&PredictionRequest::sample()) {
        Ok(r) => tracing::info!("warmup prediction ok: reward_points={:.4}", r.reward_points),
        Err(e) => tracing::warn!("warmup prediction failed: {e}"),
    }

    let state = AppState::new(predictor).with_prediction_logging(cfg.log_predictions);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    server::serve(listener, state).await
}
