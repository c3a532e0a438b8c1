use crate::foundation::error::{InrError, InrResult};

/// One latent vector (or batch of vectors) together with its shape descriptor.
///
/// `sample` is stored flat in row-major order; `sample_shape` describes how it nests. The last
/// axis is the latent dimension.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LatentState {
    sample: Vec<f32>,
    sample_shape: Vec<usize>,
}

impl LatentState {
    pub fn new(sample: Vec<f32>, sample_shape: Vec<usize>) -> InrResult<Self> {
        let expected: usize = sample_shape.iter().product();
        if sample_shape.is_empty() || expected != sample.len() {
            return Err(InrError::precondition(format!(
                "latent sample has {} values but shape {:?} describes {expected}",
                sample.len(),
                sample_shape
            )));
        }
        Ok(Self {
            sample,
            sample_shape,
        })
    }

    /// A single `(1, dim)` latent row.
    pub fn row(sample: Vec<f32>) -> Self {
        let dim = sample.len();
        Self {
            sample,
            sample_shape: vec![1, dim],
        }
    }

    pub fn sample(&self) -> &[f32] {
        &self.sample
    }

    pub fn sample_shape(&self) -> &[usize] {
        &self.sample_shape
    }

    /// Size of the last axis.
    pub fn dim(&self) -> usize {
        self.sample_shape.last().copied().unwrap_or(0)
    }

    pub fn into_sample(self) -> Vec<f32> {
        self.sample
    }

    /// Same shape, new values. Used by trajectory schemes to keep `sample_shape` unchanged.
    pub(crate) fn with_sample(&self, sample: Vec<f32>) -> Self {
        debug_assert_eq!(sample.len(), self.sample.len());
        Self {
            sample,
            sample_shape: self.sample_shape.clone(),
        }
    }

    pub(crate) fn rows(&self) -> std::slice::ChunksExact<'_, f32> {
        self.sample.chunks_exact(self.dim().max(1))
    }
}

/// Ordered, finite, restartable sequence of latent states.
pub type Trajectory = Vec<LatentState>;
