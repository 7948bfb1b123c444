//! Sequence models
//!
//! [`TransAm`] is a transformer encoder for univariate series: each scalar
//! is embedded as `x·w + b`, a sinusoidal position table is added, the
//! sequence passes through post-norm encoder layers with causal multi-head
//! self-attention, and a linear decoder reads the final position.

use super::device::Device;
use super::weights::{ModelConfig, ModelWeights};
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, ArrayView1, s};

/// Maps a scaled input sequence to one or more next values
#[cfg_attr(test, mockall::automock)]
pub trait SequenceModel: Send + Sync {
    /// Predict the value(s) following `input`
    fn predict_next(&self, input: &[f64]) -> Result<Vec<f64>>;

    /// Longest input the model accepts, if bounded
    fn max_input_len(&self) -> Option<usize>;

    fn name(&self) -> &str;
}

const LAYER_NORM_EPS: f64 = 1e-5;

struct Linear {
    /// `[out, in]`
    weight: Array2<f64>,
    bias: Array1<f64>,
}

impl Linear {
    fn bind(weights: &ModelWeights, prefix: &str) -> Result<Self> {
        Ok(Self {
            weight: weights.matrix(&format!("{prefix}.weight"))?,
            bias: weights.vector(&format!("{prefix}.bias"))?,
        })
    }

    fn apply(&self, x: ArrayView1<'_, f64>) -> Array1<f64> {
        self.weight.dot(&x) + &self.bias
    }
}

struct LayerNorm {
    gamma: Array1<f64>,
    beta: Array1<f64>,
}

impl LayerNorm {
    fn bind(weights: &ModelWeights, prefix: &str) -> Result<Self> {
        Ok(Self {
            gamma: weights.vector(&format!("{prefix}.weight"))?,
            beta: weights.vector(&format!("{prefix}.bias"))?,
        })
    }

    fn apply(&self, x: &Array1<f64>) -> Array1<f64> {
        let n = x.len() as f64;
        let mean = x.sum() / n;
        let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = (var + LAYER_NORM_EPS).sqrt();
        x.mapv(|v| (v - mean) / std) * &self.gamma + &self.beta
    }
}

struct EncoderLayer {
    in_proj: Linear,
    out_proj: Linear,
    linear1: Linear,
    linear2: Linear,
    norm1: LayerNorm,
    norm2: LayerNorm,
}

impl EncoderLayer {
    fn bind(weights: &ModelWeights, index: usize) -> Result<Self> {
        let p = format!("layers.{index}");
        Ok(Self {
            in_proj: Linear::bind(weights, &format!("{p}.attn.in_proj"))?,
            out_proj: Linear::bind(weights, &format!("{p}.attn.out_proj"))?,
            linear1: Linear::bind(weights, &format!("{p}.ff.linear1"))?,
            linear2: Linear::bind(weights, &format!("{p}.ff.linear2"))?,
            norm1: LayerNorm::bind(weights, &format!("{p}.norm1"))?,
            norm2: LayerNorm::bind(weights, &format!("{p}.norm2"))?,
        })
    }

    fn forward(&self, x: &Array2<f64>, config: &ModelConfig, device: Device) -> Result<Array2<f64>> {
        let (seq_len, d) = x.dim();
        let qkv = rows_to_array(
            device.map_rows(seq_len, |i| self.in_proj.apply(x.row(i)).to_vec()),
            3 * d,
        )?;

        let rows = device.map_rows(seq_len, |i| {
            let attended = causal_attention(&qkv, i, config.num_heads, d);
            let h = self.norm1.apply(&(&x.row(i) + &self.out_proj.apply(attended.view())));
            let ff = self
                .linear2
                .apply(self.linear1.apply(h.view()).mapv(|v| v.max(0.0)).view());
            self.norm2.apply(&(h + ff)).to_vec()
        });
        rows_to_array(rows, d)
    }
}

/// Multi-head attention output for query position `i` over positions `0..=i`
fn causal_attention(qkv: &Array2<f64>, i: usize, num_heads: usize, d: usize) -> Array1<f64> {
    let head_dim = d / num_heads;
    let scale = 1.0 / (head_dim as f64).sqrt();
    let mut out = Array1::zeros(d);

    for h in 0..num_heads {
        let q_range = h * head_dim..(h + 1) * head_dim;
        let k_range = d + h * head_dim..d + (h + 1) * head_dim;
        let v_range = 2 * d + h * head_dim..2 * d + (h + 1) * head_dim;

        let q = qkv.slice(s![i, q_range]);
        let scores: Vec<f64> = (0..=i)
            .map(|j| q.dot(&qkv.slice(s![j, k_range.clone()])) * scale)
            .collect();
        let weights = softmax(&scores);

        let mut head = out.slice_mut(s![h * head_dim..(h + 1) * head_dim]);
        for (j, w) in weights.iter().enumerate() {
            head.scaled_add(*w, &qkv.slice(s![j, v_range.clone()]));
        }
    }
    out
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

fn rows_to_array(rows: Vec<Vec<f64>>, cols: usize) -> Result<Array2<f64>> {
    let n = rows.len();
    Array2::from_shape_vec((n, cols), rows.into_iter().flatten().collect())
        .map_err(|e| ForecastError::InferenceFailed(format!("row assembly: {e}")))
}

/// Sinusoidal position table `[max_len, d_model]`
fn positional_table(max_len: usize, d_model: usize) -> Array2<f64> {
    Array2::from_shape_fn((max_len, d_model), |(pos, i)| {
        let pair = (i - i % 2) as f64;
        let angle = pos as f64 / 10_000f64.powf(pair / d_model as f64);
        if i % 2 == 0 { angle.sin() } else { angle.cos() }
    })
}

/// Transformer encoder forecaster for univariate series
pub struct TransAm {
    config: ModelConfig,
    embed_weight: Array1<f64>,
    embed_bias: Array1<f64>,
    positions: Array2<f64>,
    layers: Vec<EncoderLayer>,
    decoder_weight: Array1<f64>,
    decoder_bias: f64,
    device: Device,
}

impl TransAm {
    /// Bind validated weights to the architecture
    pub fn from_weights(weights: &ModelWeights, device: Device) -> Result<Self> {
        weights.validate()?;
        let config = weights.config;

        let layers = (0..config.num_layers)
            .map(|i| EncoderLayer::bind(weights, i))
            .collect::<Result<Vec<_>>>()?;

        let decoder = weights.matrix("decoder.weight")?;
        let decoder_bias = weights
            .vector("decoder.bias")?
            .get(0)
            .copied()
            .ok_or_else(|| ForecastError::ModelLoadFailure("empty decoder.bias".to_string()))?;

        Ok(Self {
            config,
            embed_weight: weights.vector("embedding.weight")?,
            embed_bias: weights.vector("embedding.bias")?,
            positions: positional_table(config.max_len, config.d_model),
            layers,
            decoder_weight: decoder.row(0).to_owned(),
            decoder_bias,
            device,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn device(&self) -> Device {
        self.device
    }

    fn embed(&self, input: &[f64]) -> Array2<f64> {
        Array2::from_shape_fn((input.len(), self.config.d_model), |(t, i)| {
            input[t] * self.embed_weight[i] + self.embed_bias[i] + self.positions[[t, i]]
        })
    }

    /// Hidden states `[len, d_model]` after the encoder stack
    fn encode(&self, input: &[f64]) -> Result<Array2<f64>> {
        let mut hidden = self.embed(input);
        for layer in &self.layers {
            hidden = layer.forward(&hidden, &self.config, self.device)?;
        }
        Ok(hidden)
    }
}

impl SequenceModel for TransAm {
    fn predict_next(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.is_empty() || input.len() > self.config.max_len {
            return Err(ForecastError::InvalidInput(format!(
                "input length {} outside 1..={}",
                input.len(),
                self.config.max_len
            )));
        }

        let hidden = self.encode(input)?;
        let last = hidden.row(input.len() - 1);
        let value = self.decoder_weight.dot(&last) + self.decoder_bias;
        if !value.is_finite() {
            return Err(ForecastError::InferenceFailed(format!(
                "decoder produced {value}"
            )));
        }
        Ok(vec![value])
    }

    fn max_input_len(&self) -> Option<usize> {
        Some(self.config.max_len)
    }

    fn name(&self) -> &str {
        "transam"
    }
}
