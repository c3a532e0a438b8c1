use std::io::Cursor;

use crate::foundation::core::Frame;
use crate::foundation::error::{InrError, InrResult};

/// Raster formats used for previews.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PreviewFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
}

impl PreviewFormat {
    pub fn ext(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
        }
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Bmp => image::ImageFormat::Bmp,
        }
    }
}

/// Encode `frame` in a preview raster format.
pub fn encode_preview(frame: &Frame, format: PreviewFormat) -> InrResult<Vec<u8>> {
    let color = match frame.channels {
        1 => image::ColorType::L8,
        3 => image::ColorType::Rgb8,
        c => {
            return Err(InrError::format(format!(
                "preview encoding supports 1 or 3 channels, got {c}"
            )));
        }
    };
    let mut buf = Cursor::new(Vec::new());
    image::write_buffer_with_format(
        &mut buf,
        &frame.data,
        frame.width,
        frame.height,
        color,
        format.image_format(),
    )
    .map_err(|e| InrError::encode(format!("{} preview: {e}", format.ext())))?;
    Ok(buf.into_inner())
}

/// Decode any raster the `image` crate understands into a frame with `channels` channels.
pub fn decode_raster(bytes: &[u8], channels: u32) -> InrResult<Frame> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| InrError::format(format!("cannot decode image: {e}")))?;
    let (width, height) = (img.width(), img.height());
    let data = match channels {
        1 => img.into_luma8().into_raw(),
        3 => img.into_rgb8().into_raw(),
        c => {
            return Err(InrError::precondition(format!(
                "images can be loaded as 1 or 3 channels, got {c}"
            )));
        }
    };
    Frame::new(height, width, channels, data)
}
