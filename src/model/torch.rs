use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};
use tch::{kind::Kind, CModule, Device, Tensor};

use super::encoding::{encode_row, validate_columns, ColumnEncoder};
use super::Predictor;
use crate::error::ModelError;
use crate::row::FeatureRow;

#[derive(Deserialize)]
struct MetaJson {
    columns: Vec<ColumnEncoder>,
}

/// TorchScript regressor fed by the same column encoders as the JSON
/// pipeline. The module takes `[1, width]` floats and returns a tensor whose
/// first element is the prediction.
pub struct TorchModel {
    model: CModule,
    device: Device,
    columns: Vec<ColumnEncoder>,
    width: usize,
}

impl TorchModel {
    pub fn load(model_path: &Path, meta_path: &Path) -> Result<Self> {
        let device = Device::Cpu;

        let meta_txt = fs::read_to_string(meta_path)
            .with_context(|| format!("failed to read meta at {}", meta_path.display()))?;
        let meta: MetaJson =
            serde_json::from_str(&meta_txt).with_context(|| "failed to parse meta json")?;
        let width = validate_columns(&meta.columns)?;

        let model = CModule::load_on_device(model_path, device)
            .with_context(|| format!("failed to load TorchScript {}", model_path.display()))?;

        // Probe with a dummy forward so shape problems surface at startup
        let dummy = Tensor::zeros([1, width as i64], (Kind::Float, device));
        let t = model.forward_ts(&[dummy])?;
        if t.numel() == 0 {
            bail!("model returned an empty tensor for a [1, {width}] input");
        }

        Ok(Self {
            model,
            device,
            columns: meta.columns,
            width,
        })
    }

    fn forward(&self, x: &[f64]) -> Result<f64> {
        let x: Vec<f32> = x.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_slice(&x)
            .reshape([1, self.width as i64])
            .to_device(self.device);

        let out = self.model.forward_ts(&[input])?.reshape([-1]);
        if out.numel() == 0 {
            bail!("model returned an empty tensor");
        }
        Ok(out.double_value(&[0]))
    }
}

impl Predictor for TorchModel {
    fn predict_row(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        let x = encode_row(&self.columns, row)?;
        if x.len() != self.width {
            return Err(ModelError::Width {
                got: x.len(),
                expected: self.width,
            });
        }
        self.forward(&x)
            .map_err(|e| ModelError::Backend(format!("{e:#}")))
    }

    fn describe(&self) -> String {
        format!(
            "torchscript model, {} columns, {} features",
            self.columns.len(),
            self.width
        )
    }
}
