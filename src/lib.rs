//! # coverx
//!
//! Derives a representative cover image from an uploaded PDF, EPUB or plain
//! text document.
//!
//! ## Features
//!
//! - Format detection from signature bytes, with the file extension as a hint
//! - PDF: the first page rasterized to PNG through a pluggable [`RasterBackend`]
//! - EPUB: the embedded cover, located by a four-step cascade over the OPF
//!   manifest
//! - TXT: a placeholder PNG drawn from the opening lines
//! - Batches with per-document failure isolation and optional timeouts
//!
//! ## Quick Start
//!
//! ```no_run
//! use coverx::{CoverEngine, ExtractConfig, SourceDocument};
//!
//! let engine = CoverEngine::new(ExtractConfig::default()).unwrap();
//! let doc = SourceDocument::open("book.epub").unwrap();
//! match engine.extract(&doc) {
//!     Ok(cover) => {
//!         cover.write_beside("book.epub").unwrap();
//!     }
//!     Err(e) => eprintln!("{}: {e}", e.kind()),
//! }
//! ```
//!
//! ## Custom raster backends
//!
//! PDF rendering goes through the [`RasterBackend`] trait. The default
//! backend binds a pdfium shared library (feature `pdfium`); anything else
//! that can turn a page into an RGBA bitmap can be injected with
//! [`CoverEngine::with_raster_backend`].

pub mod batch;
pub mod config;
pub mod document;
pub mod engine;
pub mod epub;
pub mod error;
pub mod format;
pub mod media;
pub mod pdf;
pub mod txt;
pub(crate) mod util;

pub use batch::BatchRunner;
pub use config::ExtractConfig;
pub use document::{CoverCandidate, ExtractionOutcome, SourceDocument, Strategy, artifact_path};
pub use engine::CoverEngine;
pub use epub::EpubCoverExtractor;
pub use error::{ConfigError, ErrorKind, ExtractionError};
pub use format::{DetectedFormat, FormatHint, detect};
pub use media::ImageEncoding;
pub use pdf::{PdfCoverExtractor, RasterBackend, RasterError, RenderedPage};
pub use txt::TxtCoverRenderer;

#[cfg(feature = "pdfium")]
pub use pdf::PdfiumBackend;
