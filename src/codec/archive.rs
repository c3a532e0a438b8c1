//! Lossless archival encoding: baseline TIFF with the metadata block as JSON in
//! `ImageDescription`.

use std::io::Cursor;
use std::path::Path;

use serde_json::Value;
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;

use crate::codec::metadata::Metadata;
use crate::foundation::core::Frame;
use crate::foundation::error::{InrError, InrResult, MetadataDecodeError};
use crate::io::OutputStore;

/// File extension of archival files.
pub const ARCHIVE_EXT: &str = "tif";

/// Pixels and metadata recovered from an archival file.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedArchive {
    pub frame: Frame,
    pub metadata: Metadata,
    /// Fallbacks applied to fields missing from older files.
    pub warnings: Vec<String>,
}

/// Encode `frame` as TIFF, embedding `metadata` when given.
///
/// Without metadata the file is still valid but can never be regenerated.
pub fn encode_archive(frame: &Frame, metadata: Option<&Metadata>) -> InrResult<Vec<u8>> {
    let description = match metadata {
        Some(md) => {
            let mut obj = md.to_json();
            obj.insert(
                "shape".into(),
                Value::from(vec![frame.height, frame.width, frame.channels]),
            );
            Some(ascii_json(&Value::Object(obj)))
        }
        None => {
            tracing::warn!("no metadata provided for archival image, it will not be reproducible");
            None
        }
    };

    let mut buf = Cursor::new(Vec::new());
    {
        let mut enc = TiffEncoder::new(&mut buf).map_err(tiff_err)?;
        match frame.channels {
            1 => {
                let mut img = enc
                    .new_image::<colortype::Gray8>(frame.width, frame.height)
                    .map_err(tiff_err)?;
                if let Some(d) = description.as_deref() {
                    img.encoder()
                        .write_tag(Tag::ImageDescription, d)
                        .map_err(tiff_err)?;
                }
                img.write_data(&frame.data).map_err(tiff_err)?;
            }
            3 => {
                let mut img = enc
                    .new_image::<colortype::RGB8>(frame.width, frame.height)
                    .map_err(tiff_err)?;
                if let Some(d) = description.as_deref() {
                    img.encoder()
                        .write_tag(Tag::ImageDescription, d)
                        .map_err(tiff_err)?;
                }
                img.write_data(&frame.data).map_err(tiff_err)?;
            }
            c => {
                return Err(InrError::format(format!(
                    "archival encoding supports 1 or 3 channels, got {c}"
                )));
            }
        }
    }
    Ok(buf.into_inner())
}

/// Decode pixels and metadata from archival bytes.
pub fn decode_archive(bytes: &[u8]) -> Result<DecodedArchive, MetadataDecodeError> {
    let unreadable = |e: tiff::TiffError| MetadataDecodeError::Unreadable(e.to_string());

    let mut dec = Decoder::new(Cursor::new(bytes)).map_err(unreadable)?;
    let (width, height) = dec.dimensions().map_err(unreadable)?;
    let channels = match dec.colortype().map_err(unreadable)? {
        ColorType::Gray(8) => 1,
        ColorType::RGB(8) => 3,
        other => {
            return Err(MetadataDecodeError::Unreadable(format!(
                "unsupported archival color type {other:?}"
            )));
        }
    };

    let description = dec
        .find_tag(Tag::ImageDescription)
        .map_err(unreadable)?
        .ok_or(MetadataDecodeError::MissingBlock)?
        .into_string()
        .map_err(|e| MetadataDecodeError::Malformed(e.to_string()))?;

    let data = match dec.read_image().map_err(unreadable)? {
        DecodingResult::U8(data) => data,
        _ => {
            return Err(MetadataDecodeError::Unreadable(
                "archival pixels are not 8-bit".to_owned(),
            ));
        }
    };
    let frame = Frame::new(height, width, channels, data)
        .map_err(|e| MetadataDecodeError::Unreadable(e.to_string()))?;

    let value: Value = serde_json::from_str(description.trim_end_matches('\0'))
        .map_err(|e| MetadataDecodeError::Malformed(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(MetadataDecodeError::Malformed(
            "metadata block is not a JSON object".to_owned(),
        ));
    };
    let decoded = Metadata::from_json(&obj)?;

    Ok(DecodedArchive {
        frame,
        metadata: decoded.metadata,
        warnings: decoded.warnings,
    })
}

/// Read and decode an archival file through `store`.
pub fn load(store: &dyn OutputStore, path: &Path) -> Result<DecodedArchive, MetadataDecodeError> {
    let bytes = store.read(path).map_err(|e| {
        MetadataDecodeError::Unreadable(format!("cannot read '{}': {e}", path.display()))
    })?;
    decode_archive(&bytes)
}

/// Like [`load`], but logs the failure and returns `None` instead of an error.
pub fn load_soft(store: &dyn OutputStore, path: &Path) -> Option<DecodedArchive> {
    match load(store, path) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!(path = %path.display(), "could not load metadata: {e}");
            None
        }
    }
}

/// Serialize with every non-ASCII character escaped; TIFF ASCII tags must stay 7-bit.
fn ascii_json(value: &Value) -> String {
    let raw = value.to_string();
    if raw.is_ascii() {
        return raw;
    }
    let mut out = String::with_capacity(raw.len() + 16);
    for ch in raw.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for u in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", u));
            }
        }
    }
    out
}

fn tiff_err(e: tiff::TiffError) -> InrError {
    InrError::encode(format!("tiff: {e}"))
}

#[cfg(test)]
#[path = "../../tests/unit/codec/archive.rs"]
mod tests;
