//! Byte, text and path helpers shared by the extractors.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Extract local name from namespaced XML name (e.g., "opf:item" -> "item").
pub fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Decode an XML document to a string.
///
/// UTF-8 (with or without BOM) is tried first, then the encoding named in the
/// `<?xml encoding="..."?>` declaration, then Windows-1252.
pub fn decode_xml(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }

    if let Some(name) = extract_xml_encoding(bytes)
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Read the `encoding` pseudo-attribute from an XML declaration.
fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    // Only check the first 100 bytes for the XML declaration
    let prefix = &bytes[..bytes.len().min(100)];

    let xml_start = memchr::memmem::find(prefix, b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let quote = *after_enc.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;
    std::str::from_utf8(&after_enc[1..value_end]).ok()
}

/// Resolve a manifest href against the package document's directory.
///
/// Fragments are dropped, `.` and `..` segments collapsed, and backslashes
/// treated as separators. When `decode` is set, percent-escapes are decoded
/// (`cover%20art.jpg` -> `cover art.jpg`).
pub fn resolve_href(base_dir: &str, href: &str, decode: bool) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let href: Cow<'_, str> = if decode {
        percent_decode_str(href).decode_utf8_lossy()
    } else {
        Cow::Borrowed(href)
    };
    let href = href.replace('\\', "/");

    let mut parts: Vec<&str> = if href.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }

    parts.join("/")
}

/// Directory part of an archive path (`OEBPS/content.opf` -> `OEBPS`).
pub fn archive_dir(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

/// Last segment of an archive path.
pub fn archive_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
