use font8x8::legacy::{BASIC_LEGACY, LATIN_LEGACY};

/// Source of 8x8 monochrome glyph bitmaps.
///
/// Each glyph is eight rows, top to bottom; bit 0 of a row is its leftmost
/// pixel.
pub trait GlyphSource: Send + Sync {
    fn glyph(&self, c: char) -> [u8; 8];
}

/// The public-domain font8x8 tables: ASCII plus Latin-1.
///
/// Characters outside both tables draw as `?`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Font8x8;

impl Font8x8 {
    pub fn covers(c: char) -> bool {
        matches!(c as u32, 0x20..=0x7E | 0xA0..=0xFF)
    }
}

impl GlyphSource for Font8x8 {
    fn glyph(&self, c: char) -> [u8; 8] {
        match c as u32 {
            cp @ 0x00..=0x7F => BASIC_LEGACY[cp as usize],
            cp @ 0xA0..=0xFF => LATIN_LEGACY[(cp - 0xA0) as usize],
            _ => BASIC_LEGACY[b'?' as usize],
        }
    }
}
