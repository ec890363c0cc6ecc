//! Error types for cover extraction.

use std::fmt;

use thiserror::Error;

/// Why a document produced no cover.
///
/// Every variant carries a human-readable detail. Use [`ExtractionError::kind`]
/// when only the category matters (diagnostics, reports, tests).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid document structure: {0}")]
    Format(String),

    #[error("corrupt container: {0}")]
    ContainerCorrupt(String),

    #[error("corrupt package manifest: {0}")]
    ManifestCorrupt(String),

    #[error("document is encrypted: {0}")]
    Encrypted(String),

    #[error("text is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("no cover image found: {0}")]
    NoCoverFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("extraction timed out after {0} ms")]
    Timeout(u128),
}

impl ExtractionError {
    /// The failure category, without detail.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::Format(_) => ErrorKind::FormatError,
            Self::ContainerCorrupt(_) => ErrorKind::ContainerCorrupt,
            Self::ManifestCorrupt(_) => ErrorKind::ManifestCorrupt,
            Self::Encrypted(_) => ErrorKind::EncryptedDocument,
            Self::Encoding(_) => ErrorKind::EncodingError,
            Self::NoCoverFound(_) => ErrorKind::NoCoverFound,
            Self::Internal(_) => ErrorKind::InternalError,
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

/// Failure categories, as reported on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub enum ErrorKind {
    UnsupportedFormat,
    FormatError,
    ContainerCorrupt,
    ManifestCorrupt,
    EncryptedDocument,
    EncodingError,
    NoCoverFound,
    InternalError,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "UnsupportedFormat",
            Self::FormatError => "FormatError",
            Self::ContainerCorrupt => "ContainerCorrupt",
            Self::ManifestCorrupt => "ManifestCorrupt",
            Self::EncryptedDocument => "EncryptedDocument",
            Self::EncodingError => "EncodingError",
            Self::NoCoverFound => "NoCoverFound",
            Self::InternalError => "InternalError",
            Self::Timeout => "Timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected engine configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PDF render DPI {0} is outside the supported range 72-600")]
    DpiOutOfRange(u16),

    #[error("canvas dimensions must be non-zero (got {width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },

    #[error("padding {padding} leaves no drawable area on a {width}x{height} canvas")]
    PaddingTooLarge { padding: u32, width: u32, height: u32 },

    #[error("wrap width must be at least one column")]
    ZeroWrapWidth,

    #[error("max lines must be at least one")]
    ZeroMaxLines,
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
