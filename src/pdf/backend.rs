use image::RgbaImage;
use thiserror::Error;

/// One rasterized page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Page width as declared by the document, in PostScript points.
    pub width_pt: f32,
    /// Page height as declared by the document, in PostScript points.
    pub height_pt: f32,
    pub image: RgbaImage,
}

/// Failures a raster backend can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("document has no pages")]
    NoPages,

    #[error("password protected: {0}")]
    Encrypted(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("{0}")]
    Backend(String),
}

/// Something that can rasterize a page of a paged document.
///
/// Implementations acquire whatever native handles they need inside
/// [`render_page`](RasterBackend::render_page) and release them before it
/// returns, on every path.
pub trait RasterBackend: Send + Sync {
    /// Short identifier for diagnostics.
    fn name(&self) -> &str;

    /// Render page `page_index` of `document` at `dpi` dots per inch.
    fn render_page(
        &self,
        document: &[u8],
        page_index: u16,
        dpi: u16,
    ) -> Result<RenderedPage, RasterError>;
}

/// Pixel length of `points` at `dpi`, rounded, at least one pixel.
pub fn points_to_pixels(points: f32, dpi: u16) -> u32 {
    ((points * f32::from(dpi) / 72.0).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_to_pixels() {
        // US Letter at 150 DPI
        assert_eq!(points_to_pixels(612.0, 150), 1275);
        assert_eq!(points_to_pixels(792.0, 150), 1650);
        assert_eq!(points_to_pixels(72.0, 72), 72);
        assert_eq!(points_to_pixels(0.0, 300), 1);
    }
}
