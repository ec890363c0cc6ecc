use tracing::{debug, warn};

use super::cascade::CASCADE;
use super::container::{EntryError, EpubContainer};
use super::parser::ManifestEntry;
use crate::document::{CoverCandidate, ExtractionOutcome, Strategy};
use crate::error::{ExtractionError, Result};
use crate::media::{ImageEncoding, validate_image};
use crate::util::{archive_dir, resolve_href};

/// Pulls the embedded cover image out of an EPUB.
///
/// Strategies run in [`CASCADE`] order. A strategy whose entry is missing or
/// not a valid image does not stop the walk, and once the cascade is spent
/// the remaining untried images are attempted in manifest order (reported as
/// [`Strategy::FirstImage`]). If nothing succeeds, the first failure is
/// reported, or `NoCoverFound` when the manifest lists no images at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubCoverExtractor;

impl EpubCoverExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, data: &[u8]) -> ExtractionOutcome {
        let mut container = EpubContainer::open(data)?;
        let opf_path = container.rootfile_path()?;
        let opf_dir = archive_dir(&opf_path).to_owned();
        let package = container.package(&opf_path)?;

        debug!(
            opf = %opf_path,
            items = package.manifest.len(),
            cover_meta = package.cover_id.as_deref().unwrap_or("-"),
            "parsed package document"
        );

        let mut first_failure = None;
        let mut attempted: Vec<&str> = Vec::new();

        // Cascade picks first, then every other image in manifest order so a
        // broken pick never hides a usable image behind it.
        let picks = CASCADE
            .iter()
            .filter_map(|strategy| strategy.try_resolve(&package).map(|entry| (strategy.id(), entry)))
            .chain(
                package
                    .manifest
                    .iter()
                    .filter(|entry| entry.is_image())
                    .map(|entry| (Strategy::FirstImage, entry)),
            );

        for (strategy, entry) in picks {
            if attempted.contains(&entry.id.as_str()) {
                continue;
            }
            attempted.push(&entry.id);

            match load_entry(&mut container, &opf_dir, entry) {
                Ok((bytes, encoding)) => {
                    debug!(%strategy, id = %entry.id, href = %entry.href, "resolved cover");
                    return Ok(CoverCandidate::new(bytes, encoding, strategy));
                }
                Err(e) => {
                    warn!(%strategy, id = %entry.id, error = %e, "cover candidate rejected");
                    first_failure.get_or_insert(e);
                }
            }
        }

        Err(first_failure.unwrap_or_else(|| {
            ExtractionError::NoCoverFound(format!(
                "none of {} manifest items is an image",
                package.manifest.len()
            ))
        }))
    }
}

/// Read a manifest entry relative to the OPF directory and validate it.
fn load_entry(
    container: &mut EpubContainer<'_>,
    opf_dir: &str,
    entry: &ManifestEntry,
) -> Result<(Vec<u8>, ImageEncoding)> {
    let decoded = resolve_href(opf_dir, &entry.href, true);
    let raw = resolve_href(opf_dir, &entry.href, false);

    let mut candidates = vec![decoded.clone()];
    if raw != decoded {
        candidates.push(raw);
    }

    let mut bytes = None;
    for path in &candidates {
        match container.read(path) {
            Ok(data) => {
                bytes = Some(data);
                break;
            }
            Err(EntryError::Missing) => {}
            Err(EntryError::Corrupt(e)) => {
                return Err(ExtractionError::ContainerCorrupt(format!(
                    "cannot read {path}: {e}"
                )));
            }
        }
    }

    let bytes = match bytes {
        Some(bytes) => bytes,
        None => {
            let fallback = container.find_by_basename(&decoded).ok_or_else(|| {
                ExtractionError::Format(format!(
                    "manifest item '{}' points to missing file {decoded}",
                    entry.id
                ))
            })?;
            debug!(href = %entry.href, found = %fallback, "matched cover by file name");
            container.read(&fallback).map_err(|e| {
                ExtractionError::ContainerCorrupt(format!("cannot read {fallback}: {e}"))
            })?
        }
    };

    let encoding = validate_image(&bytes, ImageEncoding::from_media_type(&entry.media_type))
        .map_err(|e| ExtractionError::Format(format!("manifest item '{}': {e}", entry.id)))?;

    Ok((bytes, encoding))
}
