//! Cover resolution strategies, in priority order.
//!
//! Each strategy looks at the parsed package and names at most one manifest
//! entry. [`CASCADE`] is walked front to back; reordering or adding a
//! strategy means editing that one list.

use super::parser::{ManifestEntry, Package};
use crate::document::Strategy;

/// One way of picking a cover entry out of a package.
pub trait CoverStrategy {
    fn id(&self) -> Strategy;

    fn try_resolve<'p>(&self, package: &'p Package) -> Option<&'p ManifestEntry>;
}

/// The resolution order.
pub const CASCADE: &[&dyn CoverStrategy] = &[
    &MetaCover,
    &CoverImageProperty,
    &IdHrefHeuristic,
    &FirstImage,
];

/// EPUB2: `<meta name="cover" content="ID"/>` naming an image item.
pub struct MetaCover;

impl CoverStrategy for MetaCover {
    fn id(&self) -> Strategy {
        Strategy::MetaCover
    }

    fn try_resolve<'p>(&self, package: &'p Package) -> Option<&'p ManifestEntry> {
        let cover_id = package.cover_id.as_deref()?;
        // Some books point the meta at the cover XHTML page instead.
        package.entry(cover_id).filter(|entry| entry.is_image())
    }
}

/// EPUB3: image manifest item carrying the `cover-image` property.
pub struct CoverImageProperty;

impl CoverStrategy for CoverImageProperty {
    fn id(&self) -> Strategy {
        Strategy::CoverImageProperty
    }

    fn try_resolve<'p>(&self, package: &'p Package) -> Option<&'p ManifestEntry> {
        package
            .manifest
            .iter()
            .find(|entry| entry.is_image() && entry.has_property("cover-image"))
    }
}

/// First image whose id or href mentions "cover", any case.
///
/// Known false positive: a decorative `cover-ornament.png` listed before the
/// real cover wins here.
pub struct IdHrefHeuristic;

impl CoverStrategy for IdHrefHeuristic {
    fn id(&self) -> Strategy {
        Strategy::IdHrefHeuristic
    }

    fn try_resolve<'p>(&self, package: &'p Package) -> Option<&'p ManifestEntry> {
        package.manifest.iter().find(|entry| {
            entry.is_image()
                && (contains_cover(&entry.id) || contains_cover(&entry.href))
        })
    }
}

/// Any image at all, first in manifest order.
pub struct FirstImage;

impl CoverStrategy for FirstImage {
    fn id(&self) -> Strategy {
        Strategy::FirstImage
    }

    fn try_resolve<'p>(&self, package: &'p Package) -> Option<&'p ManifestEntry> {
        package.manifest.iter().find(|entry| entry.is_image())
    }
}

fn contains_cover(s: &str) -> bool {
    s.to_ascii_lowercase().contains("cover")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, href: &str, media_type: &str, properties: &[&str]) -> ManifestEntry {
        ManifestEntry {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            properties: properties.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// First strategy in the cascade that resolves, with its pick.
    fn resolve(package: &Package) -> Option<(Strategy, &str)> {
        CASCADE.iter().find_map(|strategy| {
            strategy
                .try_resolve(package)
                .map(|entry| (strategy.id(), entry.id.as_str()))
        })
    }

    #[test]
    fn test_cascade_order() {
        let ids: Vec<_> = CASCADE.iter().map(|s| s.id()).collect();
        assert_eq!(
            ids,
            [
                Strategy::MetaCover,
                Strategy::CoverImageProperty,
                Strategy::IdHrefHeuristic,
                Strategy::FirstImage,
            ]
        );
    }

    #[test]
    fn test_meta_cover_wins() {
        let package = Package {
            cover_id: Some("art".into()),
            manifest: vec![
                item("cover-img", "cover.jpg", "image/jpeg", &["cover-image"]),
                item("art", "art.png", "image/png", &[]),
            ],
        };
        assert_eq!(resolve(&package), Some((Strategy::MetaCover, "art")));
    }

    #[test]
    fn test_meta_cover_pointing_at_xhtml_falls_through() {
        let package = Package {
            cover_id: Some("cover-page".into()),
            manifest: vec![
                item("cover-page", "cover.xhtml", "application/xhtml+xml", &[]),
                item("img", "front.jpg", "image/jpeg", &[]),
            ],
        };
        assert_eq!(resolve(&package), Some((Strategy::FirstImage, "img")));
    }

    #[test]
    fn test_dangling_meta_cover_falls_through() {
        let package = Package {
            cover_id: Some("nope".into()),
            manifest: vec![item("c", "c.png", "image/png", &["cover-image"])],
        };
        assert_eq!(resolve(&package), Some((Strategy::CoverImageProperty, "c")));
    }

    #[test]
    fn test_cover_image_property_on_xhtml_is_ignored() {
        let package = Package {
            cover_id: None,
            manifest: vec![item(
                "cover",
                "cover.xhtml",
                "application/xhtml+xml",
                &["cover-image"],
            )],
        };
        assert_eq!(resolve(&package), None);
    }

    #[test]
    fn test_property_beats_name_heuristic() {
        let package = Package {
            cover_id: None,
            manifest: vec![
                item("cover-img", "images/cover.jpg", "image/jpeg", &[]),
                item("p1", "images/p1.png", "image/png", &["cover-image"]),
            ],
        };
        assert_eq!(resolve(&package), Some((Strategy::CoverImageProperty, "p1")));
    }

    #[test]
    fn test_heuristic_matches_href_case_insensitively() {
        let package = Package {
            cover_id: None,
            manifest: vec![
                item("map", "images/map.png", "image/png", &[]),
                item("cover-page", "Cover.xhtml", "application/xhtml+xml", &[]),
                item("i2", "images/FrontCOVER.jpg", "image/jpeg", &[]),
            ],
        };
        assert_eq!(resolve(&package), Some((Strategy::IdHrefHeuristic, "i2")));
    }

    #[test]
    fn test_first_image_then_nothing() {
        let package = Package {
            cover_id: None,
            manifest: vec![
                item("ch1", "ch1.xhtml", "application/xhtml+xml", &[]),
                item("a", "a.gif", "image/gif", &[]),
                item("b", "b.png", "image/png", &[]),
            ],
        };
        assert_eq!(resolve(&package), Some((Strategy::FirstImage, "a")));

        let text_only = Package {
            cover_id: None,
            manifest: vec![item("ch1", "ch1.xhtml", "application/xhtml+xml", &[])],
        };
        assert_eq!(resolve(&text_only), None);
    }
}
