//! Format sniffing.
//!
//! Classifies a buffer by its signature bytes. A declared format (usually
//! the upload's file extension) is consulted only when the bytes are
//! inconclusive; when the two disagree the bytes win.

use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};
use zip::{CompressionMethod, ZipArchive};

use crate::util::strip_bom;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const EPUB_MIMETYPE: &[u8] = b"application/epub+zip";

/// Leading bytes inspected by the text test.
const TEXT_SNIFF_WINDOW: usize = 64 * 1024;

/// Minimum share of printable ASCII/whitespace bytes for a buffer to count
/// as text.
pub const PRINTABLE_THRESHOLD: f64 = 0.8;

/// What the bytes turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectedFormat {
    Pdf,
    Epub,
    Txt,
    Unknown,
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pdf => "pdf",
            Self::Epub => "epub",
            Self::Txt => "txt",
            Self::Unknown => "unknown",
        })
    }
}

/// What the uploader claimed the file was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatHint {
    Pdf,
    Epub,
    Txt,
}

impl FormatHint {
    /// Hint from a path's extension, if it is one we handle.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    fn detected(self) -> DetectedFormat {
        match self {
            Self::Pdf => DetectedFormat::Pdf,
            Self::Epub => DetectedFormat::Epub,
            Self::Txt => DetectedFormat::Txt,
        }
    }
}

impl FromStr for FormatHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ext = s.trim().trim_start_matches('.');
        if ext.eq_ignore_ascii_case("pdf") {
            Ok(Self::Pdf)
        } else if ext.eq_ignore_ascii_case("epub") {
            Ok(Self::Epub)
        } else if ext.eq_ignore_ascii_case("txt") {
            Ok(Self::Txt)
        } else {
            Err(format!("unknown format hint '{s}' (expected pdf, epub or txt)"))
        }
    }
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.detected().fmt(f)
    }
}

/// Classify `data` by its signature bytes.
///
/// A conclusive signature always wins over `hint`. Where the signature is
/// inconclusive the hint can turn the result into a format: an `Epub` hint
/// accepts a ZIP archive lacking the OCF `mimetype` entry, and a `Txt` hint
/// accepts printable text that is not UTF-8. Empty input is `Unknown`
/// whatever the hint.
pub fn detect(data: &[u8], hint: Option<FormatHint>) -> DetectedFormat {
    let detected = sniff(data, hint);

    if let Some(hint) = hint
        && detected != DetectedFormat::Unknown
        && detected != hint.detected()
    {
        warn!(%hint, %detected, "declared format disagrees with file signature; using signature");
    }

    detected
}

fn sniff(data: &[u8], hint: Option<FormatHint>) -> DetectedFormat {
    if data.is_empty() {
        return DetectedFormat::Unknown;
    }

    if data.starts_with(PDF_MAGIC) {
        return DetectedFormat::Pdf;
    }

    if data.starts_with(ZIP_MAGIC) {
        if is_ocf_container(data) {
            return DetectedFormat::Epub;
        }
        if hint == Some(FormatHint::Epub) {
            debug!("zip archive without a leading stored mimetype entry; honoring epub hint");
            return DetectedFormat::Epub;
        }
    }

    match classify_text(data) {
        TextVerdict::Utf8 => DetectedFormat::Txt,
        TextVerdict::NotUtf8 if hint == Some(FormatHint::Txt) => {
            debug!("printable but not UTF-8; honoring txt hint");
            DetectedFormat::Txt
        }
        TextVerdict::NotUtf8 | TextVerdict::Binary => DetectedFormat::Unknown,
    }
}

/// OCF rule: the first entry is `mimetype`, stored, holding the EPUB media type.
fn is_ocf_container(data: &[u8]) -> bool {
    let Ok(mut archive) = ZipArchive::new(Cursor::new(data)) else {
        return false;
    };
    let Ok(first) = archive.by_index_raw(0) else {
        return false;
    };
    if first.name() != "mimetype" || first.compression() != CompressionMethod::Stored {
        return false;
    }

    let mut contents = Vec::with_capacity(EPUB_MIMETYPE.len());
    if first.take(64).read_to_end(&mut contents).is_err() {
        return false;
    }
    contents.trim_ascii() == EPUB_MIMETYPE
}

#[derive(Debug, PartialEq, Eq)]
enum TextVerdict {
    Utf8,
    /// Looks like text but is not UTF-8.
    NotUtf8,
    Binary,
}

fn classify_text(data: &[u8]) -> TextVerdict {
    let window = &data[..data.len().min(TEXT_SNIFF_WINDOW)];
    let body = strip_bom(window);

    if body.is_empty() || memchr::memchr(0, body).is_some() {
        return TextVerdict::Binary;
    }

    let printable = body.iter().filter(|&&b| is_printable(b)).count();
    if printable as f64 / body.len() as f64 <= PRINTABLE_THRESHOLD {
        return TextVerdict::Binary;
    }

    match std::str::from_utf8(window) {
        Ok(_) => TextVerdict::Utf8,
        // A multi-byte sequence cut by the window edge is still valid text.
        Err(e) if e.error_len().is_none() && window.len() < data.len() => TextVerdict::Utf8,
        Err(_) => TextVerdict::NotUtf8,
    }
}

fn is_printable(b: u8) -> bool {
    matches!(b, 0x20..=0x7E | b'\t' | b'\n' | b'\r' | 0x0C)
}
