use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::encode::sink::{InMemorySink, write_all};
use crate::foundation::core::Frame;
use crate::foundation::error::InrResult;
use crate::io::{OutputStore, is_archive_path};

/// In-memory [`OutputStore`] for tests.
///
/// Directories exist implicitly once something is written below them, or explicitly via
/// [`MemoryStore::create_dir`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    videos: Vec<(PathBuf, Vec<Frame>)>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_dir(&mut self, path: impl Into<PathBuf>) {
        self.dirs.insert(path.into());
    }

    /// Insert a file without counting it as a pipeline write.
    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }

    pub fn get(&self, path: &Path) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Number of successful `write` calls.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Videos assembled so far, with the frames they received.
    pub fn videos(&self) -> &[(PathBuf, Vec<Frame>)] {
        &self.videos
    }
}

impl OutputStore for MemoryStore {
    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path) || self.files.keys().any(|p| p.starts_with(path) && p != path)
    }

    fn list_archives(&self, dir: &Path) -> InrResult<Vec<PathBuf>> {
        Ok(self
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir) && is_archive_path(p))
            .cloned()
            .collect())
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("'{}' not found", path.display()),
            )
        })
    }

    fn write(&mut self, path: &Path, bytes: &[u8]) -> InrResult<()> {
        self.files.insert(path.to_path_buf(), bytes.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn write_video(&mut self, path: &Path, frames: &[Frame], fps: u32) -> InrResult<()> {
        let mut sink = InMemorySink::new();
        write_all(&mut sink, frames, fps)?;
        self.videos.push((path.to_path_buf(), sink.frames().to_vec()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/io/memory.rs"]
mod tests;
