use std::sync::Arc;

use image::ExtendedColorType;
use tracing::debug;

use super::backend::{RasterBackend, RasterError, points_to_pixels};
use crate::document::{CoverCandidate, ExtractionOutcome, Strategy};
use crate::error::ExtractionError;
use crate::media::{ImageEncoding, encode_png};

/// Renders the first page of a PDF as a PNG cover.
#[derive(Clone)]
pub struct PdfCoverExtractor {
    backend: Arc<dyn RasterBackend>,
    dpi: u16,
}

impl PdfCoverExtractor {
    pub fn new(backend: Arc<dyn RasterBackend>, dpi: u16) -> Self {
        Self { backend, dpi }
    }

    pub fn dpi(&self) -> u16 {
        self.dpi
    }

    pub fn extract(&self, data: &[u8]) -> ExtractionOutcome {
        let page = self
            .backend
            .render_page(data, 0, self.dpi)
            .map_err(|e| match e {
                RasterError::NoPages => ExtractionError::Format("document has no pages".into()),
                RasterError::Malformed(msg) => ExtractionError::Format(msg),
                RasterError::Encrypted(msg) => ExtractionError::Encrypted(msg),
                RasterError::Backend(msg) => {
                    ExtractionError::Internal(format!("{}: {msg}", self.backend.name()))
                }
            })?;

        let (width, height) = page.image.dimensions();
        if width == 0 || height == 0 {
            return Err(ExtractionError::Format("first page has an empty media box".into()));
        }

        debug!(
            backend = self.backend.name(),
            dpi = self.dpi,
            page_pt = %format_args!("{}x{}", page.width_pt, page.height_pt),
            expected_px = %format_args!(
                "{}x{}",
                points_to_pixels(page.width_pt, self.dpi),
                points_to_pixels(page.height_pt, self.dpi)
            ),
            rendered_px = %format_args!("{width}x{height}"),
            "rasterized first page"
        );

        let png = encode_png(page.image.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| ExtractionError::Internal(format!("PNG encoding failed: {e}")))?;

        Ok(CoverCandidate::new(png, ImageEncoding::Png, Strategy::PdfFirstPage))
    }
}
