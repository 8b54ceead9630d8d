//! Native toxicity model with pure Rust inference.
//!
//! Loads weights directly from a safetensors file and runs a small
//! byte-level classifier with ndarray.
//!
//! ## Architecture
//!
//! ```text
//! Input bytes → Embedding [vocab, hidden] → mean pool
//!             ↓
//! Hidden: Linear(hidden, hidden) → SiLU → residual   (optional)
//!             ↓
//! LayerNorm [hidden]
//!             ↓
//! Head: Linear(hidden, 2) → softmax → [NON_VIOLATING, VIOLATING]
//! ```
//!
//! ## Tensor names
//!
//! | Name                          | Shape            | Required |
//! |-------------------------------|------------------|----------|
//! | `embed.weight`                | `[vocab, hidden]`| yes      |
//! | `hidden.weight`/`hidden.bias` | `[hidden, hidden]`| no      |
//! | `norm.weight`/`norm.bias`     | `[hidden]`       | yes      |
//! | `head.weight`                 | `[2, hidden]`    | yes      |
//! | `head.bias`                   | `[2]`            | no       |

use std::path::Path;

use ndarray::{Array1, Array2};
use safetensors::{Dtype, SafeTensors};
use tracing::debug;

use super::{TextClassifier, DEFAULT_MAX_INPUT_LEN};
use crate::error::{ModerationError, Result};

/// Token id used when the input is empty
const PAD_TOKEN: u32 = 0;

/// Linear layer (dense)
#[derive(Debug, Clone)]
pub struct Linear {
    weight: Array2<f32>, // [out_features, in_features]
    bias: Option<Array1<f32>>,
}

impl Linear {
    /// Create from weight `[out, in]` and optional bias `[out]`
    pub fn new(weight: Array2<f32>, bias: Option<Array1<f32>>) -> Self {
        Self { weight, bias }
    }

    fn forward(&self, x: &Array1<f32>) -> Array1<f32> {
        // y = Wx + b
        let mut y = self.weight.dot(x);
        if let Some(ref b) = self.bias {
            y += b;
        }
        y
    }

    fn check_bias(&self, name: &str) -> Result<()> {
        match self.bias {
            Some(ref b) if b.len() != self.out_features() => {
                Err(ModerationError::ClassifierUnavailable(format!(
                    "{name} bias must have {} features, got {}",
                    self.out_features(),
                    b.len()
                )))
            },
            _ => Ok(()),
        }
    }

    fn out_features(&self) -> usize {
        self.weight.shape()[0]
    }

    fn in_features(&self) -> usize {
        self.weight.shape()[1]
    }
}

/// Layer normalization
#[derive(Debug, Clone)]
pub struct LayerNorm {
    weight: Array1<f32>,
    bias: Array1<f32>,
    eps: f32,
}

impl LayerNorm {
    /// Create with the default epsilon
    pub fn new(weight: Array1<f32>, bias: Array1<f32>) -> Self {
        Self {
            weight,
            bias,
            eps: 1e-5,
        }
    }

    fn forward(&self, x: &Array1<f32>) -> Array1<f32> {
        let mean = x.mean().unwrap_or(0.0);
        let var = x.mapv(|v| (v - mean).powi(2)).mean().unwrap_or(1.0);
        let std = (var + self.eps).sqrt();

        x.mapv(|v| (v - mean) / std) * &self.weight + &self.bias
    }
}

/// SiLU activation: x * sigmoid(x)
fn silu(x: f32) -> f32 {
    x * (1.0 / (1.0 + (-x).exp()))
}

/// Softmax over array
fn softmax(x: &Array1<f32>) -> Array1<f32> {
    let max = x.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp = x.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Byte-level toxicity network
#[derive(Debug, Clone)]
pub struct ToxicityNet {
    embed: Array2<f32>,
    hidden: Option<Linear>,
    norm: LayerNorm,
    head: Linear,
}

impl ToxicityNet {
    /// Assemble a network from already-loaded parts.
    ///
    /// Fails if the shapes do not line up.
    pub fn from_parts(
        embed: Array2<f32>,
        hidden: Option<Linear>,
        norm: LayerNorm,
        head: Linear,
    ) -> Result<Self> {
        let hidden_size = embed.shape()[1];

        if embed.shape()[0] == 0 || hidden_size == 0 {
            return Err(ModerationError::ClassifierUnavailable(
                "embedding table is empty".to_string(),
            ));
        }
        if let Some(ref layer) = hidden {
            if layer.in_features() != hidden_size || layer.out_features() != hidden_size {
                return Err(ModerationError::ClassifierUnavailable(format!(
                    "hidden layer must be [{hidden_size}, {hidden_size}], got {:?}",
                    layer.weight.shape()
                )));
            }
            layer.check_bias("hidden")?;
        }
        if norm.weight.len() != hidden_size || norm.bias.len() != hidden_size {
            return Err(ModerationError::ClassifierUnavailable(format!(
                "norm must have {hidden_size} features"
            )));
        }
        if head.in_features() != hidden_size || head.out_features() < 2 {
            return Err(ModerationError::ClassifierUnavailable(format!(
                "head must be [>=2, {hidden_size}], got {:?}",
                head.weight.shape()
            )));
        }
        head.check_bias("head")?;

        Ok(Self {
            embed,
            hidden,
            norm,
            head,
        })
    }

    /// Load model from safetensors file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let data = std::fs::read(path).map_err(|e| {
            ModerationError::ClassifierUnavailable(format!(
                "Failed to read model file {}: {e}",
                path.display()
            ))
        })?;

        let tensors = SafeTensors::deserialize(&data).map_err(|e| {
            ModerationError::ClassifierUnavailable(format!("Failed to parse safetensors: {e}"))
        })?;

        let embed = load_tensor_2d(&tensors, "embed.weight")?;

        let hidden = if has_tensor(&tensors, "hidden.weight") {
            Some(load_linear_with_bias(&tensors, "hidden")?)
        } else {
            None
        };

        let norm_weight = load_tensor_1d(&tensors, "norm.weight")?;
        let norm_bias = load_tensor_1d(&tensors, "norm.bias")?;
        let norm = LayerNorm::new(norm_weight, norm_bias);

        let head = load_linear_with_bias(&tensors, "head")?;

        Self::from_parts(embed, hidden, norm, head)
    }

    /// Vocabulary size
    pub fn vocab_size(&self) -> usize {
        self.embed.shape()[0]
    }

    /// Hidden dimension
    pub fn hidden_size(&self) -> usize {
        self.embed.shape()[1]
    }

    /// Map text to token ids (one per byte, clamped to the vocabulary)
    pub fn tokenize(&self, text: &str) -> Vec<u32> {
        let last = (self.vocab_size() - 1) as u32;
        let ids: Vec<u32> = text.bytes().map(|b| (b as u32).min(last)).collect();
        if ids.is_empty() {
            vec![PAD_TOKEN]
        } else {
            ids
        }
    }

    /// Forward pass, returning class probabilities
    pub fn predict(&self, token_ids: &[u32]) -> Array1<f32> {
        // 1. Token embeddings - mean pool
        let mut pooled: Array1<f32> = Array1::zeros(self.hidden_size());
        for &token_id in token_ids {
            let idx = (token_id as usize).min(self.vocab_size() - 1);
            pooled += &self.embed.row(idx);
        }
        if !token_ids.is_empty() {
            pooled /= token_ids.len() as f32;
        }

        // 2. Optional hidden layer with residual
        let mut hidden = pooled;
        if let Some(ref layer) = self.hidden {
            hidden = layer.forward(&hidden).mapv(silu) + &hidden;
        }

        // 3. Final normalization
        hidden = self.norm.forward(&hidden);

        // 4. Classification head
        softmax(&self.head.forward(&hidden))
    }
}

/// [`TextClassifier`] backed by a [`ToxicityNet`]
#[derive(Debug, Clone)]
pub struct NativeClassifier {
    model: ToxicityNet,
    max_input_len: usize,
}

impl NativeClassifier {
    /// Wrap an in-memory network
    pub fn new(model: ToxicityNet) -> Self {
        Self {
            model,
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }

    /// Load from a safetensors file, or a directory containing `model.safetensors`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = if path.is_dir() {
            path.join("model.safetensors")
        } else {
            path.to_path_buf()
        };

        let model = ToxicityNet::load(&file)?;
        debug!(
            path = %file.display(),
            vocab = model.vocab_size(),
            hidden = model.hidden_size(),
            "Loaded native toxicity model"
        );

        Ok(Self::new(model))
    }

    /// Set the maximum input length (characters)
    pub fn with_max_input_len(mut self, max_input_len: usize) -> Self {
        self.max_input_len = max_input_len.max(1);
        self
    }
}

impl TextClassifier for NativeClassifier {
    fn classify(&self, text: &str) -> Result<Vec<f64>> {
        let tokens = self.model.tokenize(text);
        let probs = self.model.predict(&tokens);
        Ok(probs.iter().map(|&p| f64::from(p)).collect())
    }

    fn name(&self) -> &str {
        "native"
    }

    fn max_input_len(&self) -> usize {
        self.max_input_len
    }
}

// Helper functions for loading tensors

fn tensor_view<'data>(
    tensors: &SafeTensors<'data>,
    name: &str,
    rank: usize,
) -> Result<safetensors::tensor::TensorView<'data>> {
    let view = tensors.tensor(name).map_err(|e| {
        ModerationError::ClassifierUnavailable(format!("Tensor '{name}' not found: {e}"))
    })?;

    if view.dtype() != Dtype::F32 {
        return Err(ModerationError::ClassifierUnavailable(format!(
            "Expected F32 tensor for '{name}', got {:?}",
            view.dtype()
        )));
    }
    if view.shape().len() != rank {
        return Err(ModerationError::ClassifierUnavailable(format!(
            "Expected {rank}D tensor for '{name}', got {:?}",
            view.shape()
        )));
    }

    Ok(view)
}

fn f32_values(data: &[u8]) -> Vec<f32> {
    data.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn load_tensor_1d(tensors: &SafeTensors, name: &str) -> Result<Array1<f32>> {
    let view = tensor_view(tensors, name, 1)?;
    Ok(Array1::from_vec(f32_values(view.data())))
}

fn load_tensor_2d(tensors: &SafeTensors, name: &str) -> Result<Array2<f32>> {
    let view = tensor_view(tensors, name, 2)?;
    let shape = view.shape();

    Array2::from_shape_vec((shape[0], shape[1]), f32_values(view.data())).map_err(|e| {
        ModerationError::ClassifierUnavailable(format!("Shape mismatch for '{name}': {e}"))
    })
}

fn has_tensor(tensors: &SafeTensors, name: &str) -> bool {
    tensors.names().iter().any(|n| n.as_str() == name)
}

/// Bias is optional, but a present bias must load cleanly
fn load_linear_with_bias(tensors: &SafeTensors, prefix: &str) -> Result<Linear> {
    let weight = load_tensor_2d(tensors, &format!("{prefix}.weight"))?;
    let bias_name = format!("{prefix}.bias");
    let bias = if has_tensor(tensors, &bias_name) {
        Some(load_tensor_1d(tensors, &bias_name)?)
    } else {
        None
    };
    Ok(Linear::new(weight, bias))
}
