use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir};
use crate::encode::sink::write_all;
use crate::foundation::core::Frame;
use crate::foundation::error::InrResult;
use crate::io::{OutputStore, is_archive_path};

/// [`OutputStore`] backed by the real filesystem. Writes are synchronous.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }
}

impl OutputStore for FsStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_archives(&self, dir: &Path) -> InrResult<Vec<PathBuf>> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("list directory '{}'", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && is_archive_path(&path) {
                out.push(path);
            }
        }
        out.sort();
        Ok(out)
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&mut self, path: &Path, bytes: &[u8]) -> InrResult<()> {
        ensure_parent_dir(path)?;
        std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
        Ok(())
    }

    fn write_video(&mut self, path: &Path, frames: &[Frame], fps: u32) -> InrResult<()> {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(path));
        write_all(&mut sink, frames, fps)
    }
}
