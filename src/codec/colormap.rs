//! Color-space fan-out for preview images (8-bit conventions: hue is stored as `degrees / 2`).

use crate::foundation::core::Frame;
use crate::foundation::error::{InrError, InrResult};

/// A derived view of a frame written next to the identity preview.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    Rgb,
    Gray,
    Hsv,
    Hls,
}

impl Colormap {
    pub fn name(self) -> &'static str {
        match self {
            Self::Rgb => "rgb",
            Self::Gray => "gray",
            Self::Hsv => "hsv",
            Self::Hls => "hls",
        }
    }

    /// The map that leaves a frame with `channels` unchanged.
    pub fn identity_for(channels: u32) -> Self {
        if channels == 1 { Self::Gray } else { Self::Rgb }
    }
}

impl std::str::FromStr for Colormap {
    type Err = InrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(Self::Rgb),
            "gray" | "grey" => Ok(Self::Gray),
            "hsv" => Ok(Self::Hsv),
            "hls" => Ok(Self::Hls),
            other => Err(InrError::validation(format!("unknown colormap '{other}'"))),
        }
    }
}

/// Identity view first, then each requested map once, in request order.
pub fn apply_colormaps(frame: &Frame, maps: &[Colormap]) -> InrResult<Vec<(Colormap, Frame)>> {
    let identity = Colormap::identity_for(frame.channels);
    let mut out = vec![(identity, frame.clone())];
    for &map in maps {
        if out.iter().any(|(m, _)| *m == map) {
            continue;
        }
        out.push((map, convert(frame, map)?));
    }
    Ok(out)
}

fn convert(frame: &Frame, map: Colormap) -> InrResult<Frame> {
    let rgb = to_rgb(frame)?;
    let data: Vec<u8> = match map {
        Colormap::Rgb => rgb,
        Colormap::Gray => rgb
            .chunks_exact(3)
            .map(|p| luma(p[0], p[1], p[2]))
            .collect(),
        Colormap::Hsv => rgb
            .chunks_exact(3)
            .flat_map(|p| rgb_to_hsv(p[0], p[1], p[2]))
            .collect(),
        Colormap::Hls => rgb
            .chunks_exact(3)
            .flat_map(|p| rgb_to_hls(p[0], p[1], p[2]))
            .collect(),
    };
    let channels = if map == Colormap::Gray { 1 } else { 3 };
    Frame::new(frame.height, frame.width, channels, data)
}

fn to_rgb(frame: &Frame) -> InrResult<Vec<u8>> {
    match frame.channels {
        3 => Ok(frame.data.clone()),
        1 => Ok(frame.data.iter().flat_map(|&g| [g, g, g]).collect()),
        c => Err(InrError::format(format!(
            "colormaps support 1 or 3 channels, got {c}"
        ))),
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)).round() as u8
}

fn hue_deg(r: f64, g: f64, b: f64, max: f64, delta: f64) -> f64 {
    if delta == 0.0 {
        return 0.0;
    }
    let h = if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 { h + 360.0 } else { h }
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let s = if max == 0.0 { 0.0 } else { delta / max };
    [
        (hue_deg(r, g, b, max, delta) / 2.0).round().min(179.0) as u8,
        (s * 255.0).round() as u8,
        max as u8,
    ]
}

fn rgb_to_hls(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (f64::from(r) / 255.0, f64::from(g) / 255.0, f64::from(b) / 255.0);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;
    let l = (max + min) / 2.0;
    let s = if delta == 0.0 {
        0.0
    } else if l < 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };
    [
        (hue_deg(rf, gf, bf, max, delta) / 2.0).round().min(179.0) as u8,
        (l * 255.0).round() as u8,
        (s * 255.0).round() as u8,
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/codec/colormap.rs"]
mod tests;
