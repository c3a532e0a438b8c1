/// Crate-wide result alias.
pub type InrResult<T> = Result<T, InrError>;

/// Crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum InrError {
    /// A structural precondition was not met (no bound model, malformed shape, ...).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The bound model does not support the requested capability.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// An input path is neither a file nor a directory.
    #[error("path error: {0}")]
    Path(String),

    /// An archival file could not be decoded.
    #[error(transparent)]
    MetadataDecode(#[from] MetadataDecodeError),

    /// Unrecognized output suffix or image format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// An option value is out of range or otherwise invalid.
    #[error("validation error: {0}")]
    Validation(String),

    /// An encoder (image codec, ffmpeg) failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InrError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    pub fn path(msg: impl Into<String>) -> Self {
        Self::Path(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

/// Why an archival file could not be turned back into pixels + metadata.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataDecodeError {
    /// The bytes are missing or are not a readable archival image.
    #[error("archive unreadable: {0}")]
    Unreadable(String),

    /// The image decoded but carries no metadata block.
    #[error("archive has no metadata block")]
    MissingBlock,

    /// The metadata block exists but cannot be parsed, or a required field is missing.
    #[error("metadata block malformed: {0}")]
    Malformed(String),
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
