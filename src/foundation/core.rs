use crate::foundation::error::{InrError, InrResult};

/// Output resolution of a model: `x_dim` rows, `y_dim` columns, `c_dim` channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OutputShape {
    /// Rows (frame height).
    pub x_dim: u32,
    /// Columns (frame width).
    pub y_dim: u32,
    /// Channels, 1 (gray) or 3 (rgb).
    pub c_dim: u32,
}

impl OutputShape {
    /// Create a validated shape.
    pub fn new(x_dim: u32, y_dim: u32, c_dim: u32) -> InrResult<Self> {
        if x_dim == 0 || y_dim == 0 {
            return Err(InrError::precondition(
                "output shape x_dim/y_dim must be non-zero",
            ));
        }
        if c_dim != 1 && c_dim != 3 {
            return Err(InrError::precondition(format!(
                "output shape c_dim must be 1 or 3, got {c_dim}"
            )));
        }
        Ok(Self {
            x_dim,
            y_dim,
            c_dim,
        })
    }

    /// Build a shape from a slice that must have exactly three entries.
    pub fn from_dims(dims: &[u32]) -> InrResult<Self> {
        let [x, y, c] = dims else {
            return Err(InrError::precondition(format!(
                "output shape must have 3 dims (x, y, c), got {}",
                dims.len()
            )));
        };
        Self::new(*x, *y, *c)
    }

    /// Number of coordinate points (pixels).
    pub fn points(self) -> usize {
        self.x_dim as usize * self.y_dim as usize
    }

    /// Number of scalar values in a frame of this shape.
    pub fn values(self) -> usize {
        self.points() * self.c_dim as usize
    }
}

impl std::str::FromStr for OutputShape {
    type Err = InrError;

    /// Parse `XxYxC`, e.g. `512x512x3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dims = s
            .split(['x', 'X', ','])
            .map(|p| {
                p.trim().parse::<u32>().map_err(|_| {
                    InrError::precondition(format!("invalid output shape component '{p}'"))
                })
            })
            .collect::<InrResult<Vec<_>>>()?;
        Self::from_dims(&dims)
    }
}

impl std::fmt::Display for OutputShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.x_dim, self.y_dim, self.c_dim)
    }
}

/// Per-axis scale of the coordinate grid. Larger values zoom in.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Zoom(pub f64, pub f64);

impl Default for Zoom {
    fn default() -> Self {
        Self(0.5, 0.5)
    }
}

/// Per-axis offset of the coordinate grid.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pan(pub f64, pub f64);

impl Default for Pan {
    fn default() -> Self {
        Self(2.0, 2.0)
    }
}

/// 8-bit frame, `height x width x channels`, row-major and interleaved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Rows (`x_dim`).
    pub height: u32,
    /// Columns (`y_dim`).
    pub width: u32,
    /// 1 or 3.
    pub channels: u32,
    /// `height * width * channels` bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap raw bytes, checking the length against the dimensions.
    pub fn new(height: u32, width: u32, channels: u32, data: Vec<u8>) -> InrResult<Self> {
        let expected = height as usize * width as usize * channels as usize;
        if data.len() != expected {
            return Err(InrError::precondition(format!(
                "frame data has {} bytes, expected {expected} for {height}x{width}x{channels}",
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    /// Shape of this frame as an [`OutputShape`].
    pub fn shape(&self) -> OutputShape {
        OutputShape {
            x_dim: self.height,
            y_dim: self.width,
            c_dim: self.channels,
        }
    }

    /// `max - min` over every byte; 0 for an empty frame.
    pub fn value_span(&self) -> u8 {
        let Some(&first) = self.data.first() else {
            return 0;
        };
        let (lo, hi) = self
            .data
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        hi - lo
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
