//! Image encodings: sniffing, validation and PNG output.

use std::fmt;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use memchr::memmem;
use tracing::debug;

/// How many leading bytes are searched for an `<svg` root element.
const SVG_SNIFF_LEN: usize = 4096;

/// Encoding of a cover image's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum ImageEncoding {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Tiff,
    /// Vector image, returned as-is; the caller decides whether to rasterize.
    Svg,
}

impl ImageEncoding {
    /// File extension used for artifacts, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Svg => "svg",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Map a manifest media-type (parameters and case ignored).
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            "image/bmp" | "image/x-ms-bmp" => Some(Self::Bmp),
            "image/tiff" => Some(Self::Tiff),
            "image/svg+xml" | "image/svg" => Some(Self::Svg),
            _ => None,
        }
    }

    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::Webp),
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::Tiff => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Whether this build can fully decode the encoding.
    fn decodable(self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Gif | Self::Webp)
    }

    fn image_format(self) -> Option<ImageFormat> {
        match self {
            Self::Png => Some(ImageFormat::Png),
            Self::Jpeg => Some(ImageFormat::Jpeg),
            Self::Gif => Some(ImageFormat::Gif),
            Self::Webp => Some(ImageFormat::WebP),
            Self::Bmp => Some(ImageFormat::Bmp),
            Self::Tiff => Some(ImageFormat::Tiff),
            Self::Svg => None,
        }
    }
}

impl fmt::Display for ImageEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())
    }
}

/// Check that `data` is a complete image and report its real encoding.
///
/// The bytes decide the encoding; `declared` (from the manifest) only shapes
/// diagnostics. SVG has no magic number and is recognized by its root element.
/// Raster formats this build can decode are decoded in full so truncated
/// files are rejected.
pub fn validate_image(data: &[u8], declared: Option<ImageEncoding>) -> Result<ImageEncoding, String> {
    if data.is_empty() {
        return Err("image entry is empty".into());
    }

    let encoding = match image::guess_format(data) {
        Ok(format) => ImageEncoding::from_image_format(format)
            .ok_or_else(|| format!("unsupported image format {format:?}"))?,
        Err(_) if looks_like_svg(data) => return Ok(ImageEncoding::Svg),
        Err(_) => {
            return Err(match declared {
                Some(enc) => format!("bytes are not a valid {enc} image"),
                None => "bytes are not a recognized image".into(),
            });
        }
    };

    if let Some(declared) = declared
        && declared != encoding
    {
        debug!("declared {declared} but bytes are {encoding}; trusting bytes");
    }

    if encoding.decodable()
        && let Some(format) = encoding.image_format()
    {
        image::load_from_memory_with_format(data, format)
            .map_err(|e| format!("corrupt {encoding} image: {e}"))?;
    }

    Ok(encoding)
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(SVG_SNIFF_LEN)];
    memmem::find(head, b"<svg").is_some()
}

/// Encode an 8-bit RGBA or RGB raster as PNG.
pub(crate) fn encode_png(
    raw: &[u8],
    width: u32,
    height: u32,
    color: ExtendedColorType,
) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(raw, width, height, color)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        encode_png(&[255, 0, 0, 255], 1, 1, ExtendedColorType::Rgba8).unwrap()
    }

    #[test]
    fn test_from_media_type() {
        assert_eq!(ImageEncoding::from_media_type("image/jpeg"), Some(ImageEncoding::Jpeg));
        assert_eq!(ImageEncoding::from_media_type("IMAGE/JPG"), Some(ImageEncoding::Jpeg));
        assert_eq!(
            ImageEncoding::from_media_type("image/svg+xml; charset=utf-8"),
            Some(ImageEncoding::Svg)
        );
        assert_eq!(ImageEncoding::from_media_type("application/xhtml+xml"), None);
    }

    #[test]
    fn test_validate_png() {
        assert_eq!(validate_image(&tiny_png(), None), Ok(ImageEncoding::Png));
    }

    #[test]
    fn test_bytes_override_declared_type() {
        assert_eq!(
            validate_image(&tiny_png(), Some(ImageEncoding::Jpeg)),
            Ok(ImageEncoding::Png)
        );
    }

    #[test]
    fn test_truncated_png_rejected() {
        let png = tiny_png();
        let truncated = &png[..png.len() / 2];
        assert!(validate_image(truncated, Some(ImageEncoding::Png)).is_err());
    }

    #[test]
    fn test_svg_passthrough() {
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"/>"#;
        assert_eq!(validate_image(svg, Some(ImageEncoding::Svg)), Ok(ImageEncoding::Svg));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(validate_image(b"definitely not an image", None).is_err());
        assert!(validate_image(&[], Some(ImageEncoding::Png)).is_err());
    }
}
