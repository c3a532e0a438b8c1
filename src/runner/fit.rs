use std::path::{Path, PathBuf};

use crate::codec::{OutputSuffix, PreviewFormat, decode_raster, encode_preview, write_image};
use crate::foundation::core::{Frame, OutputShape};
use crate::foundation::error::{InrError, InrResult};
use crate::io::OutputStore;
use crate::model::{
    AdamW, AdamWConfig, CosineWarmRestarts, FitStep, LatentRequest, LossWeights,
    WarmRestartConfig, WeightedLoss,
};
use crate::runner::Runner;

/// Options for [`Runner::fit`].
#[derive(Clone, Debug)]
pub struct FitOpts {
    /// Target image at the model's training resolution.
    pub target: Frame,
    /// Resolution of the held-out rendering written every epoch.
    pub test_shape: OutputShape,
    pub loss_weights: LossWeights,
    pub num_epochs: usize,
    pub num_iters_per_epoch: usize,
    pub lr: f32,
    pub weight_decay: f32,
    pub schedule: WarmRestartConfig,
}

impl FitOpts {
    pub fn new(target: Frame, test_shape: OutputShape, loss_weights: LossWeights) -> Self {
        let adam = AdamWConfig::default();
        Self {
            target,
            test_shape,
            loss_weights,
            num_epochs: 50,
            num_iters_per_epoch: 100,
            lr: adam.lr,
            weight_decay: adam.weight_decay,
            schedule: WarmRestartConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FitReport {
    /// One loss per epoch, in order.
    pub losses: Vec<f32>,
    pub written: Vec<PathBuf>,
}

/// Load a fitting target from any raster format, checked against `shape`.
///
/// A JPEG copy is written to `{output_dir}/target.jpg`.
pub fn load_target(
    store: &mut dyn OutputStore,
    path: &Path,
    output_dir: &Path,
    shape: OutputShape,
) -> InrResult<Frame> {
    let bytes = store
        .read(path)
        .map_err(|e| InrError::path(format!("cannot read target '{}': {e}", path.display())))?;
    let frame = decode_raster(&bytes, shape.c_dim)?;
    if (frame.height, frame.width) != (shape.x_dim, shape.y_dim) {
        return Err(InrError::precondition(format!(
            "target is {}x{}, model trains at {}x{}",
            frame.height, frame.width, shape.x_dim, shape.y_dim
        )));
    }
    store.write(
        &output_dir.join("target.jpg"),
        &encode_preview(&frame, PreviewFormat::Jpeg)?,
    )?;
    Ok(frame)
}

impl<S: OutputStore> Runner<S> {
    /// Fit the bound model to `opts.target`, writing training and held-out renders every epoch.
    ///
    /// Fails with `UnsupportedOperation` when the bound model is not trainable.
    #[tracing::instrument(skip_all, fields(epochs = opts.num_epochs))]
    pub fn fit(&mut self, opts: FitOpts) -> InrResult<FitReport> {
        let span = self.span.clone();
        let _guard = span.enter();

        let Self {
            model,
            store,
            opts: runner_opts,
            ..
        } = self;
        let trainable = model
            .as_mut()
            .ok_or_else(|| InrError::precondition("no model bound to the runner"))?
            .as_trainable()
            .ok_or_else(|| InrError::unsupported("the bound model is not trainable"))?;

        if opts.target.shape() != trainable.shape() {
            return Err(InrError::precondition(format!(
                "target shape {} does not match model shape {}",
                opts.target.shape(),
                trainable.shape()
            )));
        }
        if opts.num_iters_per_epoch == 0 {
            return Err(InrError::validation("num_iters_per_epoch must be >= 1"));
        }

        let loss = WeightedLoss::new(opts.loss_weights)?;
        let mut optimizer = AdamW::new(
            AdamWConfig {
                lr: opts.lr,
                weight_decay: opts.weight_decay,
                ..AdamWConfig::default()
            },
            trainable.num_trainable_params(),
        )?;
        let mut scheduler = CosineWarmRestarts::new(opts.lr, opts.schedule)?;

        let train = trainable.init_latent_inputs(LatentRequest::default())?;
        let test = trainable.init_latent_inputs(LatentRequest {
            latents: Some(train.latents.clone()),
            output_shape: Some(opts.test_shape),
            ..LatentRequest::default()
        })?;
        let activation = trainable.final_activation().clone();
        let target: Vec<f32> = opts
            .target
            .data
            .iter()
            .map(|&b| activation.normalize(b))
            .collect();

        tracing::info!(
            params = trainable.num_trainable_params(),
            iters = opts.num_iters_per_epoch,
            "fitting model"
        );
        let mut report = FitReport::default();
        for epoch in 0..opts.num_epochs {
            let outcome = trainable.fit(FitStep {
                iters: opts.num_iters_per_epoch,
                target: &target,
                loss: &loss,
                optimizer: &mut optimizer,
                scheduler: &mut scheduler,
                inputs: (&train.latents, &train.inputs),
                test_inputs: (&test.latents, &test.inputs),
            })?;
            tracing::info!(epoch, loss = outcome.loss, "epoch finished");
            report.losses.push(outcome.loss);

            for (name, frame) in [
                (format!("fit_{epoch}"), &outcome.frame),
                (format!("fit_{epoch}_test"), &outcome.test_frame),
            ] {
                let base = runner_opts.output_dir.join(name);
                for suffix in [
                    OutputSuffix::Preview(runner_opts.preview_format),
                    OutputSuffix::Archive,
                ] {
                    report.written.extend(write_image(
                        &mut *store,
                        &base,
                        frame,
                        suffix,
                        None,
                        &[],
                    )?);
                }
            }
        }
        tracing::info!("finished fitting model");
        Ok(report)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runner/fit.rs"]
mod tests;
