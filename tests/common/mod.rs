//! Shared fixtures: in-memory EPUBs, tiny images and fake raster backends.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::thread;
use std::time::Duration;

use coverx::{RasterBackend, RasterError, RenderedPage};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageEncoder, RgbaImage};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// A 2x2 PNG; `shade` varies the pixels so different images differ.
pub fn png(shade: u8) -> Vec<u8> {
    let img = RgbaImage::from_pixel(2, 2, image::Rgba([shade, 0, 255 - shade, 255]));
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), 2, 2, image::ExtendedColorType::Rgba8)
        .unwrap();
    out
}

/// An 8x8 grey JPEG.
pub fn jpeg() -> Vec<u8> {
    let pixels = vec![128u8; 8 * 8 * 3];
    let mut out = Vec::new();
    JpegEncoder::new(&mut out)
        .write_image(&pixels, 8, 8, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Builds EPUB archives entry by entry.
pub struct EpubBuilder {
    entries: Vec<(String, Vec<u8>)>,
    ocf_mimetype: bool,
}

impl EpubBuilder {
    pub fn new() -> Self {
        Self {
            entries: vec![("META-INF/container.xml".into(), CONTAINER_XML.as_bytes().to_vec())],
            ocf_mimetype: true,
        }
    }

    /// Omit the leading stored `mimetype` entry.
    pub fn without_mimetype(mut self) -> Self {
        self.ocf_mimetype = false;
        self
    }

    pub fn file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.entries.push((path.into(), data.into()));
        self
    }

    /// Add `OEBPS/content.opf` with the given metadata and manifest bodies.
    pub fn opf(self, metadata: &str, manifest: &str) -> Self {
        let opf = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Test</dc:title>
    {metadata}
  </metadata>
  <manifest>
    {manifest}
  </manifest>
  <spine/>
</package>"#
        );
        self.file("OEBPS/content.opf", opf)
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        if self.ocf_mimetype {
            let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file("mimetype", stored).unwrap();
            zip.write_all(b"application/epub+zip").unwrap();
        }
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (path, data) in self.entries {
            zip.start_file(path, deflated).unwrap();
            zip.write_all(&data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

/// Renders a blank page of the given size in points.
///
/// Markers in the document bytes select failures: `/Encrypt` needs a user
/// password, `/NoExtract` opens but forbids extraction, `/Count 0 /` has no
/// pages.
pub struct FakeBackend {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl FakeBackend {
    pub fn letter() -> Self {
        Self {
            width_pt: 612.0,
            height_pt: 792.0,
        }
    }
}

impl RasterBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn render_page(&self, document: &[u8], _page: u16, dpi: u16) -> Result<RenderedPage, RasterError> {
        if document.windows(8).any(|w| w == b"/Encrypt") {
            return Err(RasterError::Encrypted("password required".into()));
        }
        if document.windows(10).any(|w| w == b"/NoExtract") {
            return Err(RasterError::Encrypted(
                "document permissions forbid content extraction".into(),
            ));
        }
        if document.windows(10).any(|w| w == b"/Count 0 /") {
            return Err(RasterError::NoPages);
        }
        let w = coverx::pdf::points_to_pixels(self.width_pt, dpi);
        let h = coverx::pdf::points_to_pixels(self.height_pt, dpi);
        Ok(RenderedPage {
            width_pt: self.width_pt,
            height_pt: self.height_pt,
            image: RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255])),
        })
    }
}

/// Sleeps before rendering, to exercise timeouts.
pub struct SlowBackend(pub Duration);

impl RasterBackend for SlowBackend {
    fn name(&self) -> &str {
        "slow"
    }

    fn render_page(&self, document: &[u8], page: u16, dpi: u16) -> Result<RenderedPage, RasterError> {
        thread::sleep(self.0);
        FakeBackend::letter().render_page(document, page, dpi)
    }
}

/// A minimal one-page PDF header; the fake backends only look at markers.
pub fn pdf(extra: &str) -> Vec<u8> {
    format!("%PDF-1.7\n1 0 obj << /Type /Catalog {extra}>> endobj\n%%EOF\n").into_bytes()
}
