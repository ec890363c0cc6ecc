//! PDF cover extraction: rasterize the first page.

mod backend;
mod extractor;
#[cfg(feature = "pdfium")]
mod pdfium;

pub use backend::{RasterBackend, RasterError, RenderedPage, points_to_pixels};
pub use extractor::PdfCoverExtractor;
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumBackend;
