//! Benchmarks for cover extraction.
//!
//! Run with: cargo bench

use std::io::{Cursor, Write};

use criterion::{Criterion, criterion_group, criterion_main};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use coverx::{
    DetectedFormat, EpubCoverExtractor, ExtractConfig, TxtCoverRenderer, detect,
};

const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#;

/// A book with `chapters` XHTML files and a 600x900 PNG cover found only by
/// the first-image fallback, so every strategy runs.
fn sample_epub(chapters: usize) -> Vec<u8> {
    let cover = {
        let img = RgbImage::from_fn(600, 900, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(img.as_raw(), 600, 900, ExtendedColorType::Rgb8)
            .unwrap();
        png
    };

    let mut manifest = String::new();
    for i in 0..chapters {
        manifest.push_str(&format!(
            r#"<item id="ch{i}" href="text/ch{i}.xhtml" media-type="application/xhtml+xml"/>"#
        ));
    }
    manifest.push_str(r#"<item id="art" href="images/art.png" media-type="image/png"/>"#);
    let opf = format!(
        r#"<?xml version="1.0"?><package xmlns="http://www.idpf.org/2007/opf" version="3.0">
<metadata/><manifest>{manifest}</manifest><spine/></package>"#
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    zip.start_file("META-INF/container.xml", deflated).unwrap();
    zip.write_all(CONTAINER_XML.as_bytes()).unwrap();
    zip.start_file("OEBPS/content.opf", deflated).unwrap();
    zip.write_all(opf.as_bytes()).unwrap();
    for i in 0..chapters {
        zip.start_file(format!("OEBPS/text/ch{i}.xhtml"), deflated).unwrap();
        zip.write_all(format!("<html><body><p>Chapter {i}</p></body></html>").as_bytes())
            .unwrap();
    }
    zip.start_file("OEBPS/images/art.png", stored).unwrap();
    zip.write_all(&cover).unwrap();
    zip.finish().unwrap().into_inner()
}

fn sample_text() -> String {
    "It was the best of times, it was the worst of times, it was the age of wisdom.\n".repeat(40)
}

// ============================================================================
// Sniffing
// ============================================================================

fn bench_detect(c: &mut Criterion) {
    let epub = sample_epub(50);
    let text = sample_text();

    c.bench_function("detect_epub", |b| {
        b.iter(|| assert_eq!(detect(&epub, None), DetectedFormat::Epub));
    });
    c.bench_function("detect_txt", |b| {
        b.iter(|| assert_eq!(detect(text.as_bytes(), None), DetectedFormat::Txt));
    });
}

// ============================================================================
// Extraction
// ============================================================================

fn bench_epub_cascade(c: &mut Criterion) {
    let epub = sample_epub(200);
    let extractor = EpubCoverExtractor::new();

    c.bench_function("epub_first_image_cascade", |b| {
        b.iter(|| extractor.extract(&epub).unwrap());
    });
}

fn bench_txt_render(c: &mut Criterion) {
    let text = sample_text();
    let renderer = TxtCoverRenderer::new(ExtractConfig::default());

    c.bench_function("txt_render_800x600", |b| {
        b.iter(|| renderer.render(text.as_bytes()).unwrap());
    });
}

criterion_group!(benches, bench_detect, bench_epub_cascade, bench_txt_render);
criterion_main!(benches);
