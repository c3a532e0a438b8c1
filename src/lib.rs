//! inrcanvas renders images from implicit neural representations and reproduces them later.
//!
//! A coordinate-to-color mapping conditioned on a latent vector produces each frame. Every frame
//! is archived together with the metadata that generated it, so it can be rebuilt at any
//! resolution from the archive alone.
//!
//! - Interpolate latents with [`lerp`], [`slerp`], [`rspline`], or [`lemniscate`]
//! - Bind a model to a [`Runner`] and render with [`Runner::run_frames`]
//! - Rebuild archives with [`Runner::regen_frames`], or optimize with [`Runner::fit`]
#![forbid(unsafe_code)]

pub(crate) mod foundation;

/// Image codecs and the metadata-bearing archive.
pub mod codec;
/// Video sinks.
pub mod encode;
/// Filesystem port.
pub mod io;
/// Latent states and trajectories.
pub mod latent;
/// Model collaborator contract and reference models.
pub mod model;
/// Synthesis, reproduction, and fitting.
pub mod runner;

pub use crate::foundation::core::{Frame, OutputShape, Pan, Zoom};
pub use crate::foundation::error::{InrError, InrResult, MetadataDecodeError};

pub use crate::codec::{Colormap, DecodedArchive, Metadata, OutputSuffix, PreviewFormat};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::io::{FsStore, MemoryStore, OutputStore};
pub use crate::latent::{
    LatentState, PlanarAxis, PlanarState, Trajectory, lemniscate, lerp, planar_axis, rspline,
    slerp,
};
pub use crate::model::{
    Generative, InrFactory, LossWeights, ModelFactory, RandomInr, Trainable, TrainableInr,
};
pub use crate::runner::{
    FitOpts, FitReport, RegenOpts, RegenReport, RegenStatus, RunFramesOpts, Runner, RunnerOpts,
    SynthesisOutput,
};
