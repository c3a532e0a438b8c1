//! Orchestration of a bound model: frame synthesis, reproduction from archives, and fitting.
//!
//! A [`Runner`] owns its output port, its random source for run identifiers, and its logging
//! span. Nothing here touches the filesystem or global state directly.

pub mod fit;
pub mod reproduce;
pub mod synth;

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::codec::{Colormap, Metadata, OutputSuffix, PreviewFormat, write_image};
use crate::encode::VIDEO_FPS;
use crate::foundation::core::Frame;
use crate::foundation::error::InrResult;
use crate::io::OutputStore;
use crate::model::Generative;

pub use fit::{FitOpts, FitReport, load_target};
pub use reproduce::{RegenEntry, RegenOpts, RegenReport, RegenStatus};
pub use synth::{RunFramesOpts, SynthesisOutput};

/// Frames whose `max - min` falls below this are treated as blank.
pub const DEFAULT_BLANK_THRESHOLD: u8 = 15;
/// Run identifiers are drawn from `0..RUN_ID_BOUND`.
pub const RUN_ID_BOUND: u64 = 99_999_999;

#[derive(Clone, Debug)]
pub struct RunnerOpts {
    pub output_dir: PathBuf,
    /// Name outputs after the model identity instead of `gen_image`.
    pub save_verbose: bool,
    pub skip_blank_generations: bool,
    pub blank_threshold: u8,
    /// Extra preview variants; empty writes a single preview per frame.
    pub colormaps: Vec<Colormap>,
    pub preview_format: PreviewFormat,
    pub video_fps: u32,
}

impl Default for RunnerOpts {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            save_verbose: false,
            skip_blank_generations: true,
            blank_threshold: DEFAULT_BLANK_THRESHOLD,
            colormaps: Vec::new(),
            preview_format: PreviewFormat::Png,
            video_fps: VIDEO_FPS,
        }
    }
}

pub struct Runner<S: OutputStore> {
    model: Option<Box<dyn Generative>>,
    store: S,
    opts: RunnerOpts,
    rng: StdRng,
    span: tracing::Span,
}

impl<S: OutputStore> Runner<S> {
    /// Runner whose run identifiers come from OS entropy.
    pub fn new(store: S, opts: RunnerOpts) -> Self {
        Self::with_rng(store, opts, StdRng::from_entropy())
    }

    /// Runner with an injected random source, for reproducible run identifiers.
    pub fn with_rng(store: S, opts: RunnerOpts, rng: StdRng) -> Self {
        let span = tracing::info_span!(
            "runner",
            output_dir = %opts.output_dir.display(),
            run_id = tracing::field::Empty,
        );
        Self {
            model: None,
            store,
            opts,
            rng,
            span,
        }
    }

    pub fn with_model(mut self, model: Box<dyn Generative>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn set_model(&mut self, model: Box<dyn Generative>) {
        self.model = Some(model);
    }

    pub fn model(&self) -> Option<&dyn Generative> {
        self.model.as_deref()
    }

    pub fn opts(&self) -> &RunnerOpts {
        &self.opts
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Filename prefix of fresh generations.
    pub fn save_prefix(&self) -> String {
        match (&self.model, self.opts.save_verbose) {
            (Some(m), true) => format!(
                "z-{}_scale-{}-{}",
                m.latent_dim(),
                fmt_scale(m.latent_scale()),
                m.seed()
            ),
            _ => "gen_image".to_owned(),
        }
    }
}

/// `1.0` rather than `1`, so verbose names stay stable across integral scales.
fn fmt_scale(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

/// Write the preview set and the archive for one frame at `base`.
fn persist_frame(
    store: &mut dyn OutputStore,
    opts: &RunnerOpts,
    base: &Path,
    frame: &Frame,
    metadata: Option<&Metadata>,
) -> InrResult<Vec<PathBuf>> {
    let mut written = write_image(
        store,
        base,
        frame,
        OutputSuffix::Preview(opts.preview_format),
        None,
        &opts.colormaps,
    )?;
    written.extend(write_image(
        store,
        base,
        frame,
        OutputSuffix::Archive,
        metadata,
        &[],
    )?);
    Ok(written)
}
