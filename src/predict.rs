//! The prediction handler: validate, build the row, score, normalize.
//!
//! Everything here is synchronous so it can be hosted by a blocking worker
//! pool or an async runtime alike.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};

use crate::error::PredictError;
use crate::model::Predictor;
use crate::row::FeatureRow;
use crate::types::{PredictionRequest, PredictionResult};

/// How a raw model output is forced non-negative. The two policies only
/// differ for negative outputs: `Absolute` maps -5 to 5, `ClampZero` to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignPolicy {
    #[default]
    Absolute,
    ClampZero,
}

impl SignPolicy {
    pub fn apply(self, raw: f64) -> f64 {
        match self {
            SignPolicy::Absolute => raw.abs(),
            SignPolicy::ClampZero => {
                if raw > 0.0 {
                    raw
                } else {
                    0.0
                }
            }
        }
    }
}

impl FromStr for SignPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absolute" | "abs" => Ok(SignPolicy::Absolute),
            "clamp_zero" | "clamp" | "max" => Ok(SignPolicy::ClampZero),
            other => Err(format!(
                "unknown sign policy '{other}' (expected 'absolute' or 'clamp_zero')"
            )),
        }
    }
}

impl fmt::Display for SignPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignPolicy::Absolute => "absolute",
            SignPolicy::ClampZero => "clamp_zero",
        })
    }
}

/// Raw and normalized score for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub raw: f64,
    pub result: PredictionResult,
}

pub struct RewardPredictor {
    model: Arc<dyn Predictor>,
    policy: SignPolicy,
}

impl RewardPredictor {
    pub fn new(model: Arc<dyn Predictor>, policy: SignPolicy) -> Self {
        Self { model, policy }
    }

    pub fn policy(&self) -> SignPolicy {
        self.policy
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictError> {
        self.score(request).map(|s| s.result)
    }

    /// Like [`RewardPredictor::predict`] but also returns the raw model output.
    pub fn score(&self, request: &PredictionRequest) -> Result<Scored, PredictError> {
        let valid = request.validate()?;
        let row = FeatureRow::from_request(&valid);

        let raw = self.model.predict_row(&row)?;
        if !raw.is_finite() {
            return Err(PredictError::PredictionFailure(format!(
                "model produced a non-finite value ({raw})"
            )));
        }

        Ok(Scored {
            raw,
            result: PredictionResult {
                reward_points: self.policy.apply(raw),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::row::Cell;

    struct Fixed(f64);

    impl Predictor for Fixed {
        fn predict_row(&self, _row: &FeatureRow) -> Result<f64, ModelError> {
            Ok(self.0)
        }

        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    struct Broken;

    impl Predictor for Broken {
        fn predict_row(&self, _row: &FeatureRow) -> Result<f64, ModelError> {
            Err(ModelError::Backend("shape mismatch".into()))
        }

        fn describe(&self) -> String {
            "broken".into()
        }
    }

    /// Echoes `item_price` so tests can see the row that reached the model.
    struct Echo;

    impl Predictor for Echo {
        fn predict_row(&self, row: &FeatureRow) -> Result<f64, ModelError> {
            match row.get("item_price") {
                Some(Cell::Number(p)) => Ok(*p),
                _ => Err(ModelError::MissingColumn("item_price".into())),
            }
        }

        fn describe(&self) -> String {
            "echo".into()
        }
    }

    fn request(price: f64) -> PredictionRequest {
        PredictionRequest {
            item_price: price,
            ..PredictionRequest::sample()
        }
    }

    #[test]
    fn policies_differ_only_for_negatives() {
        assert_eq!(SignPolicy::Absolute.apply(-5.0), 5.0);
        assert_eq!(SignPolicy::ClampZero.apply(-5.0), 0.0);
        assert_eq!(SignPolicy::Absolute.apply(3.5), 3.5);
        assert_eq!(SignPolicy::ClampZero.apply(3.5), 3.5);
        assert!(SignPolicy::ClampZero.apply(-0.0).is_sign_positive());
    }

    #[test]
    fn policy_parses_aliases() {
        assert_eq!("abs".parse::<SignPolicy>().unwrap(), SignPolicy::Absolute);
        assert_eq!(" Clamp ".parse::<SignPolicy>().unwrap(), SignPolicy::ClampZero);
        assert_eq!("clamp_zero".parse::<SignPolicy>().unwrap(), SignPolicy::ClampZero);
        assert!("round".parse::<SignPolicy>().is_err());
        assert_eq!(SignPolicy::default().to_string(), "absolute");
    }

    #[test]
    fn negative_output_is_normalized() {
        let abs = RewardPredictor::new(Arc::new(Fixed(-7.25)), SignPolicy::Absolute);
        assert_eq!(abs.predict(&request(1.0)).unwrap().reward_points, 7.25);

        let clamp = RewardPredictor::new(Arc::new(Fixed(-7.25)), SignPolicy::ClampZero);
        let scored = clamp.score(&request(1.0)).unwrap();
        assert_eq!(scored.raw, -7.25);
        assert_eq!(scored.result.reward_points, 0.0);
    }

    #[test]
    fn results_are_never_negative() {
        for policy in [SignPolicy::Absolute, SignPolicy::ClampZero] {
            let p = RewardPredictor::new(Arc::new(Echo), policy);
            for price in [-1e9, -3.0, -0.5, 0.0, 0.25, 120.5, 1e12] {
                assert!(p.predict(&request(price)).unwrap().reward_points >= 0.0);
            }
        }
    }

    #[test]
    fn model_failure_becomes_prediction_failure() {
        let p = RewardPredictor::new(Arc::new(Broken), SignPolicy::Absolute);
        assert_eq!(
            p.predict(&request(1.0)).unwrap_err(),
            PredictError::PredictionFailure("shape mismatch".into())
        );
    }

    #[test]
    fn non_finite_output_is_rejected() {
        let p = RewardPredictor::new(Arc::new(Fixed(f64::NAN)), SignPolicy::ClampZero);
        assert!(matches!(
            p.predict(&request(1.0)),
            Err(PredictError::PredictionFailure(_))
        ));
    }

    #[test]
    fn validation_runs_before_the_model() {
        let p = RewardPredictor::new(Arc::new(Broken), SignPolicy::Absolute);
        let bad = PredictionRequest {
            material: "silk".into(),
            ..PredictionRequest::sample()
        };
        assert!(matches!(p.predict(&bad), Err(PredictError::InvalidInput(_))));
    }

    #[test]
    fn identical_payloads_give_identical_results() {
        let p = RewardPredictor::new(Arc::new(Echo), SignPolicy::Absolute);
        let a = p.predict(&request(-42.5)).unwrap();
        let b = p.predict(&request(-42.5)).unwrap();
        assert_eq!(a, b);
    }
}
