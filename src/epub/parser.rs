//! EPUB parsing utilities (container.xml, OPF)

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::util::{local_name, strip_bom};

/// One `<item>` of the OPF manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: String,
    /// Path relative to the OPF's directory, as written in the manifest.
    pub href: String,
    pub media_type: String,
    /// Whitespace-separated `properties` tokens (EPUB3).
    pub properties: Vec<String>,
}

impl ManifestEntry {
    pub fn is_image(&self) -> bool {
        self.media_type
            .trim_start()
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }
}

/// The parts of an OPF package document that cover resolution needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// `content` of `<meta name="cover">` inside `<metadata>` (EPUB2).
    pub cover_id: Option<String>,
    /// Manifest items in document order.
    pub manifest: Vec<ManifestEntry>,
}

impl Package {
    pub fn entry(&self, id: &str) -> Option<&ManifestEntry> {
        self.manifest.iter().find(|entry| entry.id == id)
    }
}

/// Parse META-INF/container.xml to find the OPF path.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String, String> {
    let content = std::str::from_utf8(strip_bom(bytes)).map_err(|e| e.to_string())?;

    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                if let Some(path) = attribute(&e, b"full-path")
                    && !path.is_empty()
                {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("{e} at byte {}", reader.error_position())),
            _ => {}
        }
    }

    Err("no rootfile with a full-path in container.xml".into())
}

/// Parse OPF package document.
pub fn parse_opf(content: &str) -> Result<Package, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut package = Package::default();
    let mut metadata_depth = 0usize;
    let mut saw_manifest = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("{e} at byte {}", reader.error_position()))?;

        match event {
            Event::Start(e) => {
                match local_name(e.name().as_ref()) {
                    b"metadata" => metadata_depth += 1,
                    b"manifest" => saw_manifest = true,
                    _ => {}
                }
                visit_element(&e, metadata_depth > 0, &mut package);
            }
            Event::Empty(e) => {
                if local_name(e.name().as_ref()) == b"manifest" {
                    saw_manifest = true;
                }
                visit_element(&e, metadata_depth > 0, &mut package);
            }
            Event::End(e) => {
                if local_name(e.name().as_ref()) == b"metadata" {
                    metadata_depth = metadata_depth.saturating_sub(1);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_manifest {
        return Err("package document has no <manifest>".into());
    }

    Ok(package)
}

fn visit_element(e: &BytesStart<'_>, in_metadata: bool, package: &mut Package) {
    match local_name(e.name().as_ref()) {
        b"item" => {
            let (Some(id), Some(href)) = (attribute(e, b"id"), attribute(e, b"href")) else {
                return;
            };
            if id.is_empty() || href.is_empty() {
                return;
            }
            package.manifest.push(ManifestEntry {
                id,
                href,
                media_type: attribute(e, b"media-type").unwrap_or_default(),
                properties: attribute(e, b"properties")
                    .map(|p| p.split_ascii_whitespace().map(str::to_owned).collect())
                    .unwrap_or_default(),
            });
        }
        // Handle EPUB2 cover image meta; the first one wins
        b"meta" if in_metadata && package.cover_id.is_none() => {
            let is_cover = attribute(e, b"name").is_some_and(|n| n.eq_ignore_ascii_case("cover"));
            if is_cover
                && let Some(content) = attribute(e, b"content")
                && !content.trim().is_empty()
            {
                package.cover_id = Some(content.trim().to_owned());
            }
        }
        _ => {}
    }
}

/// Unescaped value of the attribute with local name `key`.
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    let attr = e
        .attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == key)?;
    let raw = String::from_utf8_lossy(&attr.value);
    let value = match quick_xml::escape::unescape(&raw) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => raw.to_string(),
    };
    Some(value)
}
