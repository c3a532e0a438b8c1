use std::path::PathBuf;

use rand::Rng;

use crate::codec::Metadata;
use crate::foundation::core::{Frame, Pan, Zoom};
use crate::foundation::error::{InrError, InrResult};
use crate::io::OutputStore;
use crate::latent::LatentState;
use crate::model::LatentRequest;
use crate::runner::{RUN_ID_BOUND, Runner, persist_frame};

/// Options for [`Runner::run_frames`].
#[derive(Clone, Debug)]
pub struct RunFramesOpts {
    /// Latent reused for every sample; each sample draws a fresh one when `None`.
    pub latents: Option<LatentState>,
    pub num_samples: usize,
    /// Per-sample zoom; must cover `num_samples` entries when present.
    pub zoom_schedule: Option<Vec<Zoom>>,
    pub pan_schedule: Option<Vec<Pan>>,
    pub splits: usize,
    pub autosave: bool,
}

impl Default for RunFramesOpts {
    fn default() -> Self {
        Self {
            latents: None,
            num_samples: 1,
            zoom_schedule: None,
            pan_schedule: None,
            splits: 1,
            autosave: true,
        }
    }
}

/// Retained frames of one [`Runner::run_frames`] call, index-aligned with their metadata.
#[derive(Clone, Debug)]
pub struct SynthesisOutput {
    pub run_id: u64,
    pub frames: Vec<Frame>,
    pub metadata: Vec<Metadata>,
    /// Samples dropped as blank.
    pub rejected: usize,
    /// Files written by autosave.
    pub written: Vec<PathBuf>,
}

fn check_schedule<T>(name: &str, schedule: Option<&[T]>, num_samples: usize) -> InrResult<()> {
    match schedule {
        Some(s) if s.len() < num_samples => Err(InrError::precondition(format!(
            "{name} schedule has {} entries, need {num_samples}",
            s.len()
        ))),
        _ => Ok(()),
    }
}

impl<S: OutputStore> Runner<S> {
    /// Render `num_samples` frames from the bound model.
    ///
    /// Blank frames are dropped from both returned lists. A rejected sample still consumes its
    /// index, so schedules stay aligned with sample indices and at most `num_samples` frames come
    /// back.
    pub fn run_frames(&mut self, opts: RunFramesOpts) -> InrResult<SynthesisOutput> {
        let span = self.span.clone();
        let _guard = span.enter();

        check_schedule("zoom", opts.zoom_schedule.as_deref(), opts.num_samples)?;
        check_schedule("pan", opts.pan_schedule.as_deref(), opts.num_samples)?;
        let prefix = self.save_prefix();

        let Self {
            model,
            store,
            opts: runner_opts,
            rng,
            ..
        } = self;
        let model = model
            .as_mut()
            .ok_or_else(|| InrError::precondition("no model bound to the runner"))?;

        let run_id = rng.gen_range(0..RUN_ID_BOUND);
        span.record("run_id", run_id);
        tracing::info!(
            num_samples = opts.num_samples,
            splits = opts.splits,
            "generating frames"
        );

        let mut out = SynthesisOutput {
            run_id,
            frames: Vec::with_capacity(opts.num_samples),
            metadata: Vec::with_capacity(opts.num_samples),
            rejected: 0,
            written: Vec::new(),
        };
        for i in 0..opts.num_samples {
            let zoom = opts.zoom_schedule.as_ref().map_or_else(Zoom::default, |s| s[i]);
            let pan = opts.pan_schedule.as_ref().map_or_else(Pan::default, |s| s[i]);
            let li = model.init_latent_inputs(LatentRequest {
                latents: opts.latents.clone(),
                zoom,
                pan,
                output_shape: None,
            })?;
            let values = model.generate(&li.latents, &li.inputs, opts.splits)?;
            let frame = model
                .final_activation()
                .to_frame(&values, li.inputs.shape())?;

            let span_v = frame.value_span();
            if runner_opts.skip_blank_generations && span_v < runner_opts.blank_threshold {
                tracing::info!(index = i, value_span = span_v, "skipping blank output");
                out.rejected += 1;
                continue;
            }

            let md = model.metadata(&li.meta_latents);
            if opts.autosave {
                let base = runner_opts
                    .output_dir
                    .join(format!("{prefix}_{run_id}_{i}"));
                if runner_opts.save_verbose {
                    tracing::debug!(path = %base.display(), shape = %frame.shape(), "saving frame");
                }
                out.written
                    .extend(persist_frame(&mut *store, runner_opts, &base, &frame, Some(&md))?);
            }
            out.frames.push(frame);
            out.metadata.push(md);
        }

        tracing::info!(
            kept = out.frames.len(),
            rejected = out.rejected,
            "frame generation finished"
        );
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runner/synth.rs"]
mod tests;
