//! Placeholder covers for plain text.
//!
//! The first lines of the file are word-wrapped and drawn in an 8x8 bitmap
//! font, scaled to fill the wrap width, on a white canvas.

mod glyph;
mod wrap;

pub use glyph::{Font8x8, GlyphSource};
pub use wrap::wrap_line;

use std::borrow::Cow;
use std::sync::Arc;

use encoding_rs::{Encoding, UTF_8};
use image::{ExtendedColorType, Rgb, RgbImage};
use tracing::debug;

use crate::config::ExtractConfig;
use crate::document::{CoverCandidate, ExtractionOutcome, Strategy};
use crate::error::{ExtractionError, Result};
use crate::media::{ImageEncoding, encode_png};
use crate::util::strip_bom;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([24, 24, 24]);

/// Largest glyph cell, in pixels, however wide the canvas.
const MAX_CELL: u32 = 32;

/// Renders text files to PNG placeholder covers.
#[derive(Clone)]
pub struct TxtCoverRenderer {
    config: ExtractConfig,
    glyphs: Arc<dyn GlyphSource>,
}

impl TxtCoverRenderer {
    pub fn new(config: ExtractConfig) -> Self {
        Self::with_glyphs(config, Arc::new(Font8x8))
    }

    pub fn with_glyphs(config: ExtractConfig, glyphs: Arc<dyn GlyphSource>) -> Self {
        Self { config, glyphs }
    }

    /// Render `data`, which must be UTF-8 (a leading BOM is ignored).
    pub fn render(&self, data: &[u8]) -> ExtractionOutcome {
        let text = decode_utf8(data)?;
        let rows = layout(&text, self.config.wrap_width, self.config.max_lines);
        let canvas = self.draw(&rows);

        debug!(
            rows = rows.len(),
            width = canvas.width(),
            height = canvas.height(),
            "rendered text cover"
        );

        let png = encode_png(canvas.as_raw(), canvas.width(), canvas.height(), ExtendedColorType::Rgb8)
            .map_err(|e| ExtractionError::Internal(format!("PNG encoding failed: {e}")))?;
        Ok(CoverCandidate::new(png, ImageEncoding::Png, Strategy::TxtRender))
    }

    fn draw(&self, rows: &[String]) -> RgbImage {
        let ExtractConfig {
            canvas_width: width,
            canvas_height: height,
            padding,
            wrap_width,
            ..
        } = self.config;

        let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
        let right = width.saturating_sub(padding);
        let bottom = height.saturating_sub(padding);
        let columns = u32::try_from(wrap_width).unwrap_or(u32::MAX).max(1);
        let cell = (right.saturating_sub(padding) / columns).clamp(1, MAX_CELL);
        let line_height = cell + cell / 3;

        for (row, text) in rows.iter().enumerate() {
            let top = u32::try_from(row)
                .ok()
                .and_then(|r| r.checked_mul(line_height))
                .and_then(|y| y.checked_add(padding));
            let Some(top) = top.filter(|&y| y.saturating_add(cell) <= bottom) else {
                break;
            };

            for (col, c) in (0u32..).zip(text.chars()) {
                let left = padding.saturating_add(col.saturating_mul(cell));
                if left.saturating_add(cell) > right {
                    break;
                }
                self.draw_glyph(&mut canvas, left, top, cell, c);
            }
        }
        canvas
    }

    fn draw_glyph(&self, canvas: &mut RgbImage, left: u32, top: u32, cell: u32, c: char) {
        let bitmap = self.glyphs.glyph(c);
        for py in 0..cell {
            let bits = bitmap[(py * 8 / cell) as usize];
            if bits == 0 {
                continue;
            }
            for px in 0..cell {
                if bits >> (px * 8 / cell) & 1 == 1 {
                    canvas.put_pixel(left + px, top + py, INK);
                }
            }
        }
    }
}

fn decode_utf8(data: &[u8]) -> Result<Cow<'_, str>> {
    let body = strip_bom(data);
    UTF_8
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| {
            let offset = Encoding::utf8_valid_up_to(body) + (data.len() - body.len());
            ExtractionError::Encoding(format!("invalid byte sequence at offset {offset}"))
        })
}

/// Wrapped display rows for the first `max_lines` lines of `text`.
fn layout(text: &str, wrap_width: usize, max_lines: usize) -> Vec<String> {
    text.lines()
        .take(max_lines)
        .map(|line| {
            line.chars()
                .map(|c| match c {
                    '\t' => ' ',
                    c if c.is_control() => '?',
                    c => c,
                })
                .collect::<String>()
        })
        .flat_map(|line| wrap_line(&line, wrap_width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn small() -> ExtractConfig {
        ExtractConfig::default().with_canvas(200, 100).with_padding(10).with_wrap_width(10)
    }

    fn ink_pixels(png: &[u8]) -> usize {
        let img = image::load_from_memory(png).unwrap().to_rgb8();
        img.pixels().filter(|p| **p != BACKGROUND).count()
    }

    #[test]
    fn test_layout_limits_source_lines() {
        let text = "one\ntwo\nthree\nfour";
        assert_eq!(layout(text, 50, 2), vec!["one", "two"]);
    }

    #[test]
    fn test_layout_wraps_and_sanitizes() {
        assert_eq!(layout("a\tb\x07c", 50, 20), vec!["a b?c"]);
        assert_eq!(layout("aaaa bbbb", 4, 20), vec!["aaaa", "bbbb"]);
        assert_eq!(layout("x\r\n\r\ny", 10, 20), vec!["x", "", "y"]);
    }

    #[test]
    fn test_render_canvas_size() {
        let renderer = TxtCoverRenderer::new(small());
        let cover = renderer.render(b"Hello, world").unwrap();
        assert_eq!(cover.strategy, Strategy::TxtRender);
        assert_eq!(cover.encoding, ImageEncoding::Png);
        let img = image::load_from_memory(&cover.data).unwrap();
        assert_eq!((img.width(), img.height()), (200, 100));
        assert!(ink_pixels(&cover.data) > 0);
    }

    #[test]
    fn test_empty_text_is_blank_canvas() {
        let cover = TxtCoverRenderer::new(small()).render(b"").unwrap();
        assert_eq!(ink_pixels(&cover.data), 0);
    }

    #[test]
    fn test_bom_is_ignored() {
        let renderer = TxtCoverRenderer::new(small());
        let plain = renderer.render(b"abc").unwrap();
        let bom = renderer.render(b"\xEF\xBB\xBFabc").unwrap();
        assert_eq!(plain.data, bom.data);
    }

    #[test]
    fn test_invalid_utf8() {
        let err = TxtCoverRenderer::new(small()).render(b"abc\xFFdef").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodingError);
        assert!(err.to_string().contains("offset 3"));
    }

    #[test]
    fn test_overflow_is_clipped() {
        let text = "line\n".repeat(200);
        let config = small().with_max_lines(200);
        let cover = TxtCoverRenderer::new(config).render(text.as_bytes()).unwrap();
        let img = image::load_from_memory(&cover.data).unwrap();
        assert_eq!((img.width(), img.height()), (200, 100));
    }

    #[test]
    fn test_deterministic() {
        let renderer = TxtCoverRenderer::new(ExtractConfig::default());
        let a = renderer.render(b"The same words twice.").unwrap();
        let b = renderer.render(b"The same words twice.").unwrap();
        assert_eq!(a.data, b.data);
    }
}
