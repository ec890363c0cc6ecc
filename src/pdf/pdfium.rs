//! Raster backend on top of a pdfium shared library.

use std::path::PathBuf;

use image::RgbaImage;
use pdfium_render::prelude::*;
use tracing::debug;

use super::backend::{RasterBackend, RasterError, RenderedPage};

/// Renders pages with pdfium, bound at call time.
///
/// Each call binds the library, loads the document, renders and drops all
/// handles before returning, so no pdfium state outlives a call.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library_dir: Option<PathBuf>,
}

impl PdfiumBackend {
    /// Use the pdfium library found on the system library path.
    pub fn system() -> Self {
        Self::default()
    }

    /// Use the pdfium library in `dir`.
    pub fn with_library_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: Some(dir.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, RasterError> {
        let bindings = match &self.library_dir {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| RasterError::Backend(format!("cannot load pdfium: {e}")))?;

        Ok(Pdfium::new(bindings))
    }
}

impl RasterBackend for PdfiumBackend {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn render_page(
        &self,
        document: &[u8],
        page_index: u16,
        dpi: u16,
    ) -> Result<RenderedPage, RasterError> {
        let pdfium = self.bind()?;
        let doc = pdfium
            .load_pdf_from_byte_slice(document, None)
            .map_err(load_error)?;

        // Opened without a user password, but the owner password may still
        // forbid pulling page content out.
        match doc.permissions().can_extract_text_and_graphics() {
            Ok(true) => {}
            Ok(false) => {
                return Err(RasterError::Encrypted(
                    "document permissions forbid content extraction".into(),
                ));
            }
            Err(e) => debug!(error = %e, "cannot read document permissions"),
        }

        let pages = doc.pages();
        if pages.len() == 0 {
            return Err(RasterError::NoPages);
        }

        let page = pages
            .get(page_index.into())
            .map_err(|e| RasterError::Malformed(format!("page {page_index}: {e}")))?;
        let width_pt = page.width().value;
        let height_pt = page.height().value;

        let config = PdfRenderConfig::new().scale_page_by_factor(f32::from(dpi) / 72.0);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| RasterError::Backend(format!("render failed: {e}")))?;

        let width = u32::try_from(bitmap.width()).unwrap_or(0);
        let height = u32::try_from(bitmap.height()).unwrap_or(0);
        let image = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(|| {
            RasterError::Backend(format!("bitmap buffer does not match {width}x{height}"))
        })?;

        Ok(RenderedPage {
            width_pt,
            height_pt,
            image,
        })
    }
}

fn load_error(e: PdfiumError) -> RasterError {
    match e {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            RasterError::Encrypted("a password is required to open the document".into())
        }
        PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::FormatError | PdfiumInternalError::FileError,
        ) => RasterError::Malformed(e.to_string()),
        e => RasterError::Backend(e.to_string()),
    }
}
