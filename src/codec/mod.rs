//! Image codecs: lossy/lossless previews, colormap fan-out, and the metadata-bearing archive.

pub mod archive;
pub mod colormap;
pub mod metadata;
pub mod preview;

use std::path::{Path, PathBuf};

use crate::foundation::core::Frame;
use crate::foundation::error::{InrError, InrResult};
use crate::io::OutputStore;

pub use archive::{ARCHIVE_EXT, DecodedArchive, decode_archive, encode_archive, load, load_soft};
pub use colormap::{Colormap, apply_colormaps};
pub use metadata::{DecodedMetadata, Metadata};
pub use preview::{PreviewFormat, decode_raster, encode_preview};

/// Output suffix accepted by [`write_image`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputSuffix {
    Preview(PreviewFormat),
    Archive,
}

impl std::str::FromStr for OutputSuffix {
    type Err = InrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Preview(PreviewFormat::Png)),
            "jpg" | "jpeg" => Ok(Self::Preview(PreviewFormat::Jpeg)),
            "bmp" => Ok(Self::Preview(PreviewFormat::Bmp)),
            "tif" | "tiff" => Ok(Self::Archive),
            other => Err(InrError::format(format!(
                "unsupported output suffix '{other}'"
            ))),
        }
    }
}

/// Append `.{ext}` to a suffix-less base path.
pub(crate) fn with_ext(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Append `_{tag}.{ext}` to a suffix-less base path.
pub(crate) fn with_tag_ext(base: &Path, tag: &str, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push("_");
    s.push(tag);
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Path of the first preview [`write_image`] produces for `base`.
pub fn first_preview_path(
    base: &Path,
    channels: u32,
    format: PreviewFormat,
    colormaps: &[Colormap],
) -> PathBuf {
    if colormaps.is_empty() {
        with_ext(base, format.ext())
    } else {
        with_tag_ext(base, Colormap::identity_for(channels).name(), format.ext())
    }
}

/// Write `frame` next to `base` (a path without extension) and return the written paths.
///
/// Previews with colormaps fan out to `{base}_{map}.{ext}`; otherwise `{base}.{ext}`. Archives are
/// written to `{base}.tif` with `metadata` embedded.
pub fn write_image(
    store: &mut dyn OutputStore,
    base: &Path,
    frame: &Frame,
    suffix: OutputSuffix,
    metadata: Option<&Metadata>,
    colormaps: &[Colormap],
) -> InrResult<Vec<PathBuf>> {
    match suffix {
        OutputSuffix::Preview(format) => {
            if colormaps.is_empty() {
                let path = with_ext(base, format.ext());
                store.write(&path, &encode_preview(frame, format)?)?;
                return Ok(vec![path]);
            }
            let mut written = Vec::new();
            for (map, view) in apply_colormaps(frame, colormaps)? {
                let path = with_tag_ext(base, map.name(), format.ext());
                store.write(&path, &encode_preview(&view, format)?)?;
                written.push(path);
            }
            Ok(written)
        }
        OutputSuffix::Archive => {
            let path = with_ext(base, ARCHIVE_EXT);
            store.write(&path, &encode_archive(frame, metadata)?)?;
            Ok(vec![path])
        }
    }
}
