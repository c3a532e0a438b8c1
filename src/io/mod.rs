//! Filesystem port.
//!
//! The runner never touches the filesystem directly. Every existence check, listing, read, and
//! write goes through an [`OutputStore`], so skip-if-exists, rejection, and reassembly logic can be
//! tested against [`MemoryStore`].

pub mod fs;
pub mod memory;

use std::path::{Path, PathBuf};

use crate::foundation::core::Frame;
use crate::foundation::error::InrResult;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// Storage operations used by the synthesis pipeline and the reproduction orchestrator.
pub trait OutputStore {
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// Archival files (`*.tif`, `*.tiff`) directly inside `dir`, sorted by path.
    fn list_archives(&self, dir: &Path) -> InrResult<Vec<PathBuf>>;
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
    /// Write `bytes` to `path`, creating parent directories as needed.
    fn write(&mut self, path: &Path, bytes: &[u8]) -> InrResult<()>;
    /// Assemble `frames` into a single video at `path`.
    fn write_video(&mut self, path: &Path, frames: &[Frame], fps: u32) -> InrResult<()>;
}

pub(crate) fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
}
