use std::path::{Path, PathBuf};

use crate::codec::{first_preview_path, load};
use crate::foundation::core::{OutputShape, Pan, Zoom};
use crate::foundation::error::{InrError, InrResult};
use crate::io::OutputStore;
use crate::model::ModelFactory;
use crate::runner::{RunFramesOpts, Runner, persist_frame};

const REPRODUCE_TAG: &str = "_reproduce";

/// Options for [`Runner::regen_frames`].
#[derive(Clone, Debug)]
pub struct RegenOpts {
    /// Resolution of the rebuilt model; may differ from the archived one.
    pub output_shape: OutputShape,
    pub num_samples: usize,
    pub splits: usize,
    pub zoom_schedule: Option<Vec<Zoom>>,
    pub pan_schedule: Option<Vec<Pan>>,
    pub save_video: bool,
}

impl RegenOpts {
    pub fn new(output_shape: OutputShape) -> Self {
        Self {
            output_shape,
            num_samples: 1,
            splits: 1,
            zoom_schedule: None,
            pan_schedule: None,
            save_video: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RegenStatus {
    /// Output for this archive already exists.
    Skipped { existing: PathBuf },
    Regenerated {
        frames: usize,
        written: Vec<PathBuf>,
        video: Option<PathBuf>,
    },
    /// Every regenerated frame was rejected as blank.
    NoFrames,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegenEntry {
    pub source: PathBuf,
    /// `{output_dir}/{stem}_reproduce`, the base of every output for this source.
    pub output_base: PathBuf,
    pub status: RegenStatus,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegenReport {
    pub entries: Vec<RegenEntry>,
}

impl RegenReport {
    pub fn count(&self, pred: impl Fn(&RegenStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.status)).count()
    }

    pub fn regenerated(&self) -> usize {
        self.count(|s| matches!(s, RegenStatus::Regenerated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, RegenStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, RegenStatus::Failed(_)))
    }
}

/// Stem of an archive with any `_reproduce...` tail removed, so reprocessing does not stack
/// suffixes.
pub(crate) fn reproduce_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.find(REPRODUCE_TAG) {
        Some(idx) => stem[..idx].to_owned(),
        None => stem,
    }
}

impl<S: OutputStore> Runner<S> {
    /// Rebuild models from archives at `path` (one file, or every archive in a directory) and
    /// regenerate their frames at `opts.output_shape`.
    ///
    /// Sources whose first output already exists are skipped before any decoding or model
    /// construction. A failing source is reported and the batch continues. The existence check is
    /// not atomic: concurrent invocations against one output directory may race.
    #[tracing::instrument(skip(self, factory, path, opts), fields(path = %path.display()))]
    pub fn regen_frames(
        &mut self,
        factory: &mut dyn ModelFactory,
        path: &Path,
        opts: RegenOpts,
    ) -> InrResult<RegenReport> {
        let sources = if self.store.is_dir(path) {
            self.store.list_archives(path)?
        } else if self.store.is_file(path) {
            vec![path.to_path_buf()]
        } else {
            return Err(InrError::path(format!(
                "'{}' is neither a file nor a directory",
                path.display()
            )));
        };

        let mut report = RegenReport::default();
        for source in sources {
            let stem = reproduce_stem(&source);
            let output_base = self.opts.output_dir.join(format!("{stem}{REPRODUCE_TAG}"));
            let status = self.regen_one(factory, &source, &stem, &output_base, &opts);
            match &status {
                RegenStatus::Failed(msg) => {
                    tracing::warn!(source = %source.display(), "reproduction failed: {msg}")
                }
                RegenStatus::NoFrames => {
                    tracing::info!(source = %source.display(), "no usable frames generated")
                }
                _ => {}
            }
            report.entries.push(RegenEntry {
                source,
                output_base,
                status,
            });
        }
        Ok(report)
    }

    fn regen_one(
        &mut self,
        factory: &mut dyn ModelFactory,
        source: &Path,
        stem: &str,
        output_base: &Path,
        opts: &RegenOpts,
    ) -> RegenStatus {
        let first = first_preview_path(
            &indexed(output_base, 0),
            opts.output_shape.c_dim,
            self.opts.preview_format,
            &self.opts.colormaps,
        );
        if self.store.exists(&first) {
            tracing::info!(existing = %first.display(), "found existing output");
            return RegenStatus::Skipped { existing: first };
        }
        tracing::info!(
            source = %source.display(),
            output = %output_base.display(),
            "running reproduction"
        );

        match self.regen_checked(factory, source, stem, output_base, opts) {
            Ok(status) => status,
            Err(e) => RegenStatus::Failed(e.to_string()),
        }
    }

    fn regen_checked(
        &mut self,
        factory: &mut dyn ModelFactory,
        source: &Path,
        stem: &str,
        output_base: &Path,
        opts: &RegenOpts,
    ) -> InrResult<RegenStatus> {
        let decoded = load(&self.store, source)?;
        let metadata = decoded.metadata;
        let latents = metadata.latents.clone();
        if latents.is_none() {
            tracing::warn!(
                source = %source.display(),
                "archive carries no latents; sampling a fresh one"
            );
        }
        self.set_model(factory.build(&metadata, opts.output_shape)?);

        let synth = self.run_frames(RunFramesOpts {
            latents,
            num_samples: opts.num_samples,
            zoom_schedule: opts.zoom_schedule.clone(),
            pan_schedule: opts.pan_schedule.clone(),
            splits: opts.splits,
            autosave: false,
        })?;
        if synth.frames.is_empty() {
            return Ok(RegenStatus::NoFrames);
        }

        tracing::info!(
            frames = synth.frames.len(),
            shape = %opts.output_shape,
            "saving reproduced frames"
        );
        let mut written = Vec::new();
        for (i, (frame, md)) in synth.frames.iter().zip(&synth.metadata).enumerate() {
            written.extend(persist_frame(
                &mut self.store,
                &self.opts,
                &indexed(output_base, i),
                frame,
                Some(md),
            )?);
        }

        let video = if opts.save_video {
            let path = self
                .opts
                .output_dir
                .join(format!("{stem}{REPRODUCE_TAG}.mp4"));
            self.store
                .write_video(&path, &synth.frames, self.opts.video_fps)?;
            Some(path)
        } else {
            None
        };

        Ok(RegenStatus::Regenerated {
            frames: synth.frames.len(),
            written,
            video,
        })
    }
}

fn indexed(base: &Path, i: usize) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(format!("_{i}"));
    PathBuf::from(s)
}
