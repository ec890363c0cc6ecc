//! EPUB cover extraction.
//!
//! [`EpubContainer`] wraps the zip archive, [`parser`] reads
//! `container.xml` and the OPF package document, and [`cascade`] holds the
//! ordered strategies that pick the cover entry.

pub mod cascade;
mod container;
mod extractor;
pub mod parser;

pub use cascade::{CASCADE, CoverStrategy};
pub use container::{EntryError, EpubContainer};
pub use extractor::EpubCoverExtractor;
pub use parser::{ManifestEntry, Package};
