//! Engine configuration.

use crate::error::ConfigError;

/// Lowest accepted PDF render resolution.
pub const MIN_DPI: u16 = 72;
/// Highest accepted PDF render resolution.
pub const MAX_DPI: u16 = 600;

/// Tunables shared by all extractors.
///
/// ```
/// use coverx::ExtractConfig;
///
/// let config = ExtractConfig::default().with_dpi(300).with_wrap_width(40);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Resolution used to rasterize the first PDF page.
    pub pdf_dpi: u16,
    /// Text cover canvas width in pixels.
    pub canvas_width: u32,
    /// Text cover canvas height in pixels.
    pub canvas_height: u32,
    /// Uniform margin around the text block, in pixels.
    pub padding: u32,
    /// Wrap column for text covers.
    pub wrap_width: usize,
    /// Number of source lines read from a text file.
    pub max_lines: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            pdf_dpi: 150,
            canvas_width: 800,
            canvas_height: 600,
            padding: 24,
            wrap_width: 50,
            max_lines: 20,
        }
    }
}

impl ExtractConfig {
    pub fn with_dpi(mut self, dpi: u16) -> Self {
        self.pdf_dpi = dpi;
        self
    }

    pub fn with_canvas(mut self, width: u32, height: u32) -> Self {
        self.canvas_width = width;
        self.canvas_height = height;
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_wrap_width(mut self, columns: usize) -> Self {
        self.wrap_width = columns;
        self
    }

    pub fn with_max_lines(mut self, lines: usize) -> Self {
        self.max_lines = lines;
        self
    }

    /// Check every field against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.pdf_dpi) {
            return Err(ConfigError::DpiOutOfRange(self.pdf_dpi));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ConfigError::EmptyCanvas {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }
        if self.padding.saturating_mul(2) >= self.canvas_width.min(self.canvas_height) {
            return Err(ConfigError::PaddingTooLarge {
                padding: self.padding,
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }
        if self.wrap_width == 0 {
            return Err(ConfigError::ZeroWrapWidth);
        }
        if self.max_lines == 0 {
            return Err(ConfigError::ZeroMaxLines);
        }
        Ok(())
    }
}
