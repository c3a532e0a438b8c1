//! Model collaborator contract.
//!
//! A model is a coordinate-to-color mapping conditioned on a latent. Capabilities are explicit:
//! every model is [`Generative`]; models whose mapping can be optimized also implement
//! [`Trainable`] and expose it through [`Generative::as_trainable`].

pub mod inr;
pub mod loss;
pub mod optim;
pub mod trainable;

use std::ops::Range;

use crate::codec::metadata::Metadata;
use crate::foundation::core::{Frame, OutputShape, Pan, Zoom};
use crate::foundation::error::{InrError, InrResult};
use crate::latent::LatentState;

pub use inr::{ActivationMode, InrConfig, InrFactory, MapConfig, RandomInr, WeightInit};
pub use loss::{LossWeights, WeightedLoss};
pub use optim::{AdamW, AdamWConfig, CosineWarmRestarts, WarmRestartConfig};
pub use trainable::TrainableInr;

/// Output nonlinearity of a mapping, which decides how values become bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FinalActivation {
    #[default]
    Sigmoid,
    Tanh,
    Other(String),
}

impl FinalActivation {
    pub fn from_name(name: &str) -> Self {
        match name {
            "sigmoid" => Self::Sigmoid,
            "tanh" => Self::Tanh,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
            Self::Other(s) => s,
        }
    }

    /// Map one activation-space value onto `0..=255` (truncating, saturating).
    pub fn denormalize(&self, v: f32) -> u8 {
        match self {
            Self::Tanh => ((v + 1.0) * 127.5) as u8,
            Self::Sigmoid | Self::Other(_) => (v * 255.0) as u8,
        }
    }

    /// Inverse of [`denormalize`](Self::denormalize), used to bring target images into the
    /// activation's range.
    pub fn normalize(&self, b: u8) -> f32 {
        match self {
            Self::Tanh => f32::from(b) / 127.5 - 1.0,
            Self::Sigmoid | Self::Other(_) => f32::from(b) / 255.0,
        }
    }

    /// Turn `x_dim * y_dim * c_dim` activation values into an 8-bit frame.
    pub fn to_frame(&self, values: &[f32], shape: OutputShape) -> InrResult<Frame> {
        if values.len() != shape.values() {
            return Err(InrError::precondition(format!(
                "model produced {} values, expected {} for {shape}",
                values.len(),
                shape.values()
            )));
        }
        let data = values.iter().map(|&v| self.denormalize(v)).collect();
        Frame::new(shape.x_dim, shape.y_dim, shape.c_dim, data)
    }
}

impl From<String> for FinalActivation {
    fn from(s: String) -> Self {
        Self::from_name(&s)
    }
}

impl From<FinalActivation> for String {
    fn from(a: FinalActivation) -> Self {
        a.name().to_owned()
    }
}

/// Per-pixel input features for one output resolution, row-major over `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordGrid {
    shape: OutputShape,
    feat_dim: usize,
    features: Vec<f32>,
}

impl CoordGrid {
    pub fn new(shape: OutputShape, feat_dim: usize, features: Vec<f32>) -> InrResult<Self> {
        if features.len() != shape.points() * feat_dim {
            return Err(InrError::precondition(format!(
                "coordinate grid has {} values, expected {} points x {feat_dim} features",
                features.len(),
                shape.points()
            )));
        }
        Ok(Self {
            shape,
            feat_dim,
            features,
        })
    }

    pub fn shape(&self) -> OutputShape {
        self.shape
    }

    pub fn feat_dim(&self) -> usize {
        self.feat_dim
    }

    pub fn points(&self) -> usize {
        self.shape.points()
    }

    /// Features of point `p`.
    pub fn point(&self, p: usize) -> &[f32] {
        &self.features[p * self.feat_dim..(p + 1) * self.feat_dim]
    }
}

/// Split `n` points into `splits` contiguous ranges, earlier ranges taking the remainder.
///
/// Ranges are in order and cover `0..n` exactly once; empty ranges are dropped.
pub fn split_ranges(n: usize, splits: usize) -> InrResult<Vec<Range<usize>>> {
    if splits == 0 {
        return Err(InrError::precondition("splits must be >= 1"));
    }
    let base = n / splits;
    let rem = n % splits;
    let mut out = Vec::with_capacity(splits);
    let mut start = 0;
    for i in 0..splits {
        let len = base + usize::from(i < rem);
        if len == 0 {
            continue;
        }
        out.push(start..start + len);
        start += len;
    }
    Ok(out)
}

/// Arguments of [`Generative::init_latent_inputs`].
#[derive(Clone, Debug, Default)]
pub struct LatentRequest {
    /// Latent to reuse; a fresh one is sampled when `None`.
    pub latents: Option<LatentState>,
    pub zoom: Zoom,
    pub pan: Pan,
    /// Grid resolution; the model's own shape when `None`.
    pub output_shape: Option<OutputShape>,
}

/// Result of [`Generative::init_latent_inputs`].
#[derive(Clone, Debug)]
pub struct LatentInputs {
    /// Latent fed to `generate`.
    pub latents: LatentState,
    /// Coordinate grid fed to `generate`.
    pub inputs: CoordGrid,
    /// Latent recorded in metadata; replaying it reproduces the frame.
    pub meta_latents: LatentState,
}

/// Capability: produce frames from latents.
pub trait Generative {
    fn shape(&self) -> OutputShape;
    fn latent_dim(&self) -> usize;
    fn latent_scale(&self) -> f64;
    fn seed(&self) -> u64;
    fn final_activation(&self) -> &FinalActivation;

    /// Prepare a latent and a coordinate grid for one generation.
    fn init_latent_inputs(&mut self, req: LatentRequest) -> InrResult<LatentInputs>;

    /// Evaluate the mapping over `inputs`, `splits` sequential chunks at a time.
    ///
    /// Returns `points * c_dim` activation-space values. The result must not depend on `splits`.
    fn generate(
        &self,
        latents: &LatentState,
        inputs: &CoordGrid,
        splits: usize,
    ) -> InrResult<Vec<f32>>;

    /// Full reproducibility record for a generation that used `meta_latents`.
    fn metadata(&self, meta_latents: &LatentState) -> Metadata;

    /// The trainable view of this model, if its mapping supports optimization.
    fn as_trainable(&mut self) -> Option<&mut dyn Trainable> {
        None
    }
}

/// One `fit` call: `iters` optimizer steps against `target`.
pub struct FitStep<'a> {
    pub iters: usize,
    /// Target in activation space, laid out like the model's output.
    pub target: &'a [f32],
    pub loss: &'a WeightedLoss,
    pub optimizer: &'a mut AdamW,
    pub scheduler: &'a mut CosineWarmRestarts,
    pub inputs: (&'a LatentState, &'a CoordGrid),
    /// Held out: rendered for monitoring, never used for updates.
    pub test_inputs: (&'a LatentState, &'a CoordGrid),
}

/// Frames and loss after a [`FitStep`].
#[derive(Clone, Debug)]
pub struct FitOutcome {
    pub frame: Frame,
    pub test_frame: Frame,
    pub loss: f32,
}

/// Capability: gradient-based optimization of the mapping.
pub trait Trainable: Generative {
    /// Number of scalars the optimizer updates.
    fn num_trainable_params(&self) -> usize;

    fn fit(&mut self, step: FitStep<'_>) -> InrResult<FitOutcome>;
}

/// Rebuilds a model from decoded metadata at a (possibly new) output shape.
pub trait ModelFactory {
    fn build(&mut self, metadata: &Metadata, shape: OutputShape)
    -> InrResult<Box<dyn Generative>>;
}

#[cfg(test)]
#[path = "../../tests/unit/model/contract.rs"]
mod tests;
