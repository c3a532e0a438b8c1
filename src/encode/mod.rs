//! Video assembly.
//!
//! Sinks consume frames in sequence order; `ffmpeg` turns them into a single MP4.

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;

/// Frame rate used for assembled videos.
pub const VIDEO_FPS: u32 = 10;
