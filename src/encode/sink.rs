use crate::foundation::core::Frame;
use crate::foundation::error::{InrError, InrResult};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Integer frames per second.
    pub fps: u32,
}

impl SinkConfig {
    /// Config matching the first frame of a sequence.
    pub fn for_frames(frames: &[Frame], fps: u32) -> InrResult<Self> {
        let first = frames
            .first()
            .ok_or_else(|| InrError::precondition("cannot assemble a video from zero frames"))?;
        Ok(Self {
            width: first.width,
            height: first.height,
            fps,
        })
    }
}

/// Consumer of an ordered frame sequence.
///
/// Ordering contract: `push_frame` is called in sequence order between one `begin` and one `end`.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> InrResult<()>;
    /// Push the next frame.
    fn push_frame(&mut self, frame: &Frame) -> InrResult<()>;
    /// Called once after the last frame.
    fn end(&mut self) -> InrResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<Frame>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> InrResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> InrResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| InrError::encode("in-memory sink not started"))?;
        check_frame_size(&cfg, frame)?;
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> InrResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Stream `frames` through `sink` in order.
pub fn write_all(sink: &mut dyn FrameSink, frames: &[Frame], fps: u32) -> InrResult<()> {
    sink.begin(SinkConfig::for_frames(frames, fps)?)?;
    for frame in frames {
        sink.push_frame(frame)?;
    }
    sink.end()
}

pub(crate) fn check_frame_size(cfg: &SinkConfig, frame: &Frame) -> InrResult<()> {
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(InrError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    Ok(())
}
