//! Model weights document
//!
//! ```json
//! {
//!   "config": {"d_model": 32, "num_heads": 4, "num_layers": 2, "d_ff": 64, "max_len": 256},
//!   "tensors": {"embedding.weight": {"shape": [32], "data": [...]}, ...}
//! }
//! ```
//!
//! Linear weights are stored `[out, in]`. Binding is strict: every expected
//! tensor must be present with the expected shape and no others may appear.

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Transformer hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub d_model: usize,
    pub num_heads: usize,
    pub num_layers: usize,
    pub d_ff: usize,
    /// Longest input sequence the positional table covers
    pub max_len: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            d_model: 32,
            num_heads: 4,
            num_layers: 2,
            d_ff: 64,
            max_len: 256,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("d_model", self.d_model),
            ("num_heads", self.num_heads),
            ("num_layers", self.num_layers),
            ("d_ff", self.d_ff),
            ("max_len", self.max_len),
        ] {
            if value == 0 {
                return Err(ForecastError::ModelLoadFailure(format!(
                    "config.{name} must be positive"
                )));
            }
        }
        if self.d_model % self.num_heads != 0 {
            return Err(ForecastError::ModelLoadFailure(format!(
                "d_model {} is not divisible by num_heads {}",
                self.d_model, self.num_heads
            )));
        }
        Ok(())
    }

    /// Every tensor the architecture binds, with its shape
    pub fn expected_shapes(&self) -> BTreeMap<String, Vec<usize>> {
        let d = self.d_model;
        let mut shapes = BTreeMap::new();
        shapes.insert("embedding.weight".to_string(), vec![d]);
        shapes.insert("embedding.bias".to_string(), vec![d]);
        for layer in 0..self.num_layers {
            let p = format!("layers.{layer}");
            shapes.insert(format!("{p}.attn.in_proj.weight"), vec![3 * d, d]);
            shapes.insert(format!("{p}.attn.in_proj.bias"), vec![3 * d]);
            shapes.insert(format!("{p}.attn.out_proj.weight"), vec![d, d]);
            shapes.insert(format!("{p}.attn.out_proj.bias"), vec![d]);
            shapes.insert(format!("{p}.ff.linear1.weight"), vec![self.d_ff, d]);
            shapes.insert(format!("{p}.ff.linear1.bias"), vec![self.d_ff]);
            shapes.insert(format!("{p}.ff.linear2.weight"), vec![d, self.d_ff]);
            shapes.insert(format!("{p}.ff.linear2.bias"), vec![d]);
            for norm in ["norm1", "norm2"] {
                shapes.insert(format!("{p}.{norm}.weight"), vec![d]);
                shapes.insert(format!("{p}.{norm}.bias"), vec![d]);
            }
        }
        shapes.insert("decoder.weight".to_string(), vec![1, d]);
        shapes.insert("decoder.bias".to_string(), vec![1]);
        shapes
    }
}

/// One named tensor, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorData {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

/// Config plus named tensors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelWeights {
    pub config: ModelConfig,
    pub tensors: BTreeMap<String, TensorData>,
}

impl ModelWeights {
    /// Parse and validate a weights document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let weights: Self = serde_json::from_str(json)
            .map_err(|e| ForecastError::ModelLoadFailure(format!("malformed weights: {e}")))?;
        weights.validate()?;
        Ok(weights)
    }

    /// Read and validate a weights file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::ModelLoadFailure(format!(
                "cannot read weights {}: {e}",
                path.display()
            ))
        })?;
        let weights = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            tensors = weights.tensors.len(),
            d_model = weights.config.d_model,
            num_layers = weights.config.num_layers,
            "Loaded model weights"
        );
        Ok(weights)
    }

    /// Write the document as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Shape-correct weights drawn from a seeded generator
    ///
    /// Linear and embedding weights are uniform in `±1/sqrt(fan_in)`,
    /// LayerNorm scales are 1 and biases 0. Not trained; for local runs and
    /// tests only.
    pub fn seeded(config: ModelConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let tensors = config
            .expected_shapes()
            .into_iter()
            .map(|(name, shape)| {
                let len = shape.iter().product();
                let data = if name.contains(".norm") {
                    let fill = if name.ends_with(".weight") { 1.0 } else { 0.0 };
                    vec![fill; len]
                } else {
                    let fan_in = if shape.len() == 2 { shape[1] } else { 1 };
                    let bound = 1.0 / (fan_in as f64).sqrt();
                    (0..len).map(|_| rng.gen_range(-bound..bound)).collect()
                };
                (name, TensorData { shape, data })
            })
            .collect();
        Ok(Self { config, tensors })
    }

    /// Check the tensors against the architecture the config describes
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        let expected = self.config.expected_shapes();

        if let Some(unknown) = self.tensors.keys().find(|k| !expected.contains_key(*k)) {
            return Err(ForecastError::ModelLoadFailure(format!(
                "unexpected tensor '{unknown}'"
            )));
        }

        for (name, shape) in &expected {
            let tensor = self.tensors.get(name).ok_or_else(|| {
                ForecastError::ModelLoadFailure(format!("missing tensor '{name}'"))
            })?;
            if &tensor.shape != shape {
                return Err(ForecastError::ModelLoadFailure(format!(
                    "tensor '{name}' has shape {:?}, expected {shape:?}",
                    tensor.shape
                )));
            }
            let len: usize = shape.iter().product();
            if tensor.data.len() != len {
                return Err(ForecastError::ModelLoadFailure(format!(
                    "tensor '{name}' has {} values, shape {shape:?} needs {len}",
                    tensor.data.len()
                )));
            }
            if tensor.data.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::ModelLoadFailure(format!(
                    "tensor '{name}' contains non-finite values"
                )));
            }
        }
        Ok(())
    }

    fn tensor(&self, name: &str) -> Result<&TensorData> {
        self.tensors
            .get(name)
            .ok_or_else(|| ForecastError::ModelLoadFailure(format!("missing tensor '{name}'")))
    }

    pub(crate) fn vector(&self, name: &str) -> Result<Array1<f64>> {
        let tensor = self.tensor(name)?;
        if tensor.shape.len() != 1 {
            return Err(ForecastError::ModelLoadFailure(format!(
                "tensor '{name}' is not a vector"
            )));
        }
        Ok(Array1::from(tensor.data.clone()))
    }

    pub(crate) fn matrix(&self, name: &str) -> Result<Array2<f64>> {
        let tensor = self.tensor(name)?;
        match tensor.shape.as_slice() {
            [rows, cols] => Array2::from_shape_vec((*rows, *cols), tensor.data.clone())
                .map_err(|e| ForecastError::ModelLoadFailure(format!("tensor '{name}': {e}"))),
            _ => Err(ForecastError::ModelLoadFailure(format!(
                "tensor '{name}' is not a matrix"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ModelConfig {
        ModelConfig {
            d_model: 8,
            num_heads: 2,
            num_layers: 1,
            d_ff: 16,
            max_len: 64,
        }
    }

    fn expect_load_failure(result: Result<impl std::fmt::Debug>, needle: &str) {
        match result {
            Err(ForecastError::ModelLoadFailure(msg)) => {
                assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}");
            }
            other => panic!("Expected ModelLoadFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_seeded_is_valid_and_reproducible() {
        let a = ModelWeights::seeded(small_config(), 7).unwrap();
        let b = ModelWeights::seeded(small_config(), 7).unwrap();
        let c = ModelWeights::seeded(small_config(), 8).unwrap();
        a.validate().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.tensors["layers.0.norm1.weight"].data, vec![1.0; 8]);
    }

    #[test]
    fn test_shape_mismatch() {
        let mut weights = ModelWeights::seeded(small_config(), 1).unwrap();
        weights.tensors.insert(
            "decoder.weight".to_string(),
            TensorData {
                shape: vec![1, 4],
                data: vec![0.0; 4],
            },
        );
        expect_load_failure(weights.validate(), "decoder.weight");
    }

    #[test]
    fn test_missing_and_unknown_tensors() {
        let mut weights = ModelWeights::seeded(small_config(), 1).unwrap();
        weights.tensors.remove("embedding.bias");
        expect_load_failure(weights.validate(), "missing tensor 'embedding.bias'");

        let mut weights = ModelWeights::seeded(small_config(), 1).unwrap();
        weights.tensors.insert(
            "layers.1.norm1.weight".to_string(),
            TensorData {
                shape: vec![8],
                data: vec![1.0; 8],
            },
        );
        expect_load_failure(weights.validate(), "unexpected tensor");
    }

    #[test]
    fn test_data_length_and_finiteness() {
        let mut weights = ModelWeights::seeded(small_config(), 1).unwrap();
        if let Some(t) = weights.tensors.get_mut("embedding.weight") {
            t.data.pop();
        }
        expect_load_failure(weights.validate(), "values");

        let mut weights = ModelWeights::seeded(small_config(), 1).unwrap();
        if let Some(t) = weights.tensors.get_mut("embedding.weight") {
            t.data[0] = f64::NAN;
        }
        expect_load_failure(weights.validate(), "non-finite");
    }

    #[test]
    fn test_invalid_config() {
        let config = ModelConfig {
            d_model: 10,
            num_heads: 3,
            ..small_config()
        };
        expect_load_failure(ModelWeights::seeded(config, 1), "divisible");

        let config = ModelConfig {
            num_layers: 0,
            ..small_config()
        };
        expect_load_failure(ModelWeights::seeded(config, 1), "num_layers");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_state.json");
        let weights = ModelWeights::seeded(small_config(), 3).unwrap();
        weights.save(&path).unwrap();

        let loaded = ModelWeights::from_path(&path).unwrap();
        assert_eq!(loaded.config, weights.config);
        assert_eq!(loaded.tensors.len(), weights.tensors.len());
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        expect_load_failure(
            ModelWeights::from_path(dir.path().join("absent.json")),
            "cannot read weights",
        );

        let path = dir.path().join("garbage.json");
        std::fs::write(&path, "{not json").unwrap();
        expect_load_failure(ModelWeights::from_path(&path), "malformed");
    }
}
