use crate::codec::metadata::Metadata;
use crate::foundation::core::{Frame, OutputShape};
use crate::foundation::error::{InrError, InrResult};
use crate::latent::LatentState;
use crate::model::inr::{InrConfig, MapConfig, RandomInr};
use crate::model::{
    CoordGrid, FinalActivation, FitOutcome, FitStep, Generative, LatentInputs, LatentRequest,
    Trainable,
};

/// [`RandomInr`] whose output head is optimized against a target image.
///
/// The hidden layers stay frozen at their seeded values, so the hidden features of a grid are
/// computed once per `fit` call.
#[derive(Clone, Debug)]
pub struct TrainableInr {
    inner: RandomInr,
}

impl TrainableInr {
    pub fn new(cfg: InrConfig, map: MapConfig) -> InrResult<Self> {
        Ok(Self::from_inr(RandomInr::new(cfg, map)?))
    }

    pub fn from_inr(inner: RandomInr) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &RandomInr {
        &self.inner
    }

    fn render(&self, latents: &LatentState, inputs: &CoordGrid) -> InrResult<Frame> {
        let values = self.inner.generate(latents, inputs, 1)?;
        self.final_activation().to_frame(&values, inputs.shape())
    }
}

impl Generative for TrainableInr {
    fn shape(&self) -> OutputShape {
        self.inner.shape()
    }

    fn latent_dim(&self) -> usize {
        self.inner.latent_dim()
    }

    fn latent_scale(&self) -> f64 {
        self.inner.latent_scale()
    }

    fn seed(&self) -> u64 {
        self.inner.seed()
    }

    fn final_activation(&self) -> &FinalActivation {
        self.inner.final_activation()
    }

    fn init_latent_inputs(&mut self, req: LatentRequest) -> InrResult<LatentInputs> {
        self.inner.init_latent_inputs(req)
    }

    fn generate(
        &self,
        latents: &LatentState,
        inputs: &CoordGrid,
        splits: usize,
    ) -> InrResult<Vec<f32>> {
        self.inner.generate(latents, inputs, splits)
    }

    fn metadata(&self, meta_latents: &LatentState) -> Metadata {
        self.inner.metadata(meta_latents)
    }

    fn as_trainable(&mut self) -> Option<&mut dyn Trainable> {
        Some(self)
    }
}

impl Trainable for TrainableInr {
    fn num_trainable_params(&self) -> usize {
        self.inner.head.params.len()
    }

    fn fit(&mut self, step: FitStep<'_>) -> InrResult<FitOutcome> {
        let (latents, inputs) = step.inputs;
        let c = self.inner.head.out;
        let width = self.inner.head.inp;
        if step.target.len() != inputs.points() * c {
            return Err(InrError::precondition(format!(
                "target has {} values, expected {} for {}",
                step.target.len(),
                inputs.points() * c,
                inputs.shape()
            )));
        }

        let hidden = self.inner.hidden_features(latents, inputs, 1)?;
        let n_params = self.num_trainable_params();
        let mut grad_out = vec![0.0f32; step.target.len()];
        let mut grads = vec![0.0f32; n_params];
        let mut loss = f32::NAN;

        for _ in 0..step.iters {
            let lr = step.scheduler.lr();
            let pred = self.inner.head_forward(&hidden);
            loss = step.loss.eval(&pred, step.target, &mut grad_out);

            grads.iter_mut().for_each(|g| *g = 0.0);
            let act = self.inner.head.act;
            let (gw, gb) = grads.split_at_mut(c * width);
            for (p, h) in hidden.chunks_exact(width).enumerate() {
                for o in 0..c {
                    let y = pred[p * c + o];
                    let delta = grad_out[p * c + o] * act.grad_from_output(y).unwrap_or(1.0);
                    if delta == 0.0 {
                        continue;
                    }
                    gb[o] += delta;
                    for (g, hv) in gw[o * width..(o + 1) * width].iter_mut().zip(h) {
                        *g += delta * hv;
                    }
                }
            }

            step
                .optimizer
                .step(&mut self.inner.head.params, &grads, lr)?;
            step.scheduler.step();
        }

        let frame = self.render(latents, inputs)?;
        let (test_latents, test_inputs) = step.test_inputs;
        let test_frame = self.render(test_latents, test_inputs)?;
        tracing::debug!(iters = step.iters, loss, "fit step finished");
        Ok(FitOutcome {
            frame,
            test_frame,
            loss,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/trainable.rs"]
mod tests;
