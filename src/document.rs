//! Inputs and results of a cover extraction.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ExtractionError;
use crate::format::FormatHint;
use crate::media::ImageEncoding;

/// One uploaded book: its bytes plus whatever the uploader told us about it.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    data: Vec<u8>,
    hint: Option<FormatHint>,
    name: Option<String>,
}

impl SourceDocument {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            hint: None,
            name: None,
        }
    }

    /// Read a file from disk, taking the hint from its extension and the
    /// display name from its file name.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mut doc = Self::new(data);
        doc.hint = FormatHint::from_path(path);
        doc.name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(doc)
    }

    pub fn with_hint(mut self, hint: FormatHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn hint(&self) -> Option<FormatHint> {
        self.hint
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for a persisted cover: the display name with its extension
    /// replaced by the encoding's (`book.epub` -> `book.jpg`).
    pub fn artifact_name(&self, encoding: ImageEncoding) -> Option<String> {
        let name = self.name.as_deref()?;
        artifact_path(Path::new(name), encoding)
            .to_str()
            .map(str::to_owned)
    }
}

/// Which step produced a cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "kebab-case"))]
pub enum Strategy {
    /// First PDF page, rasterized.
    PdfFirstPage,
    /// EPUB2 `<meta name="cover" content="..."/>`.
    MetaCover,
    /// EPUB3 manifest item with `properties="cover-image"`.
    CoverImageProperty,
    /// Manifest image whose id or href mentions "cover".
    IdHrefHeuristic,
    /// First image in the manifest.
    FirstImage,
    /// Placeholder drawn from the text itself.
    TxtRender,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PdfFirstPage => "pdf-first-page",
            Self::MetaCover => "meta-cover",
            Self::CoverImageProperty => "cover-image-property",
            Self::IdHrefHeuristic => "id-href-heuristic",
            Self::FirstImage => "first-image",
            Self::TxtRender => "txt-render",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successfully derived cover.
#[derive(Clone, PartialEq, Eq)]
pub struct CoverCandidate {
    pub data: Vec<u8>,
    pub encoding: ImageEncoding,
    pub strategy: Strategy,
}

impl CoverCandidate {
    pub fn new(data: Vec<u8>, encoding: ImageEncoding, strategy: Strategy) -> Self {
        Self {
            data,
            encoding,
            strategy,
        }
    }

    /// Write the image next to `source`, named by [`artifact_path`].
    ///
    /// Fails with [`io::ErrorKind::AlreadyExists`] instead of writing when
    /// the target would be `source` itself (`notes.png` holding text).
    pub fn write_beside<P: AsRef<Path>>(&self, source: P) -> io::Result<PathBuf> {
        let source = source.as_ref();
        let target = artifact_path(source, self.encoding);
        let same_extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.encoding.extension()));
        if same_extension {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("cover would overwrite its source {}", source.display()),
            ));
        }
        std::fs::write(&target, &self.data)?;
        Ok(target)
    }
}

impl fmt::Debug for CoverCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoverCandidate")
            .field("bytes", &self.data.len())
            .field("encoding", &self.encoding)
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Exactly one cover or exactly one error per document.
pub type ExtractionOutcome = std::result::Result<CoverCandidate, ExtractionError>;

/// Sibling path for a cover: same directory and stem, the encoding's extension.
pub fn artifact_path(source: &Path, encoding: ImageEncoding) -> PathBuf {
    source.with_extension(encoding.extension())
}
