//! Read access to the EPUB (OCF) zip container.

use std::fmt;
use std::io::{Cursor, Read};

use zip::ZipArchive;
use zip::result::ZipError;

use super::parser::{Package, parse_container_xml, parse_opf};
use crate::error::{ExtractionError, Result};
use crate::util::{archive_basename, decode_xml};

const CONTAINER_XML: &str = "META-INF/container.xml";

/// Entries larger than this (uncompressed) are refused.
const MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// Why an entry could not be read.
#[derive(Debug)]
pub enum EntryError {
    Missing,
    Corrupt(String),
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("entry not found"),
            Self::Corrupt(e) => f.write_str(e),
        }
    }
}

/// An open EPUB archive over a borrowed buffer.
///
/// The archive only borrows the caller's bytes; dropping the container
/// releases everything it holds.
pub struct EpubContainer<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> EpubContainer<'a> {
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| ExtractionError::ContainerCorrupt(format!("not a readable zip archive: {e}")))?;
        Ok(Self { archive })
    }

    /// Path of the OPF package document, from `META-INF/container.xml`.
    pub fn rootfile_path(&mut self) -> Result<String> {
        let container = match self.read(CONTAINER_XML) {
            Ok(bytes) => bytes,
            Err(EntryError::Missing) => {
                return Err(ExtractionError::ContainerCorrupt(format!(
                    "missing {CONTAINER_XML}"
                )));
            }
            Err(EntryError::Corrupt(e)) => {
                return Err(ExtractionError::ContainerCorrupt(format!(
                    "unreadable {CONTAINER_XML}: {e}"
                )));
            }
        };

        parse_container_xml(&container)
            .map_err(|e| ExtractionError::ContainerCorrupt(format!("invalid {CONTAINER_XML}: {e}")))
    }

    /// Read and parse the package document at `opf_path`.
    pub fn package(&mut self, opf_path: &str) -> Result<Package> {
        let bytes = self.read(opf_path).map_err(|e| match e {
            EntryError::Missing => {
                ExtractionError::ManifestCorrupt(format!("package document {opf_path} is missing"))
            }
            EntryError::Corrupt(e) => {
                ExtractionError::ManifestCorrupt(format!("package document {opf_path}: {e}"))
            }
        })?;

        parse_opf(&decode_xml(&bytes))
            .map_err(|e| ExtractionError::ManifestCorrupt(format!("{opf_path}: {e}")))
    }

    /// Read and decompress an entry by its exact archive path.
    pub fn read(&mut self, path: &str) -> std::result::Result<Vec<u8>, EntryError> {
        let file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(EntryError::Missing),
            Err(e) => return Err(EntryError::Corrupt(e.to_string())),
        };

        if file.size() > MAX_ENTRY_SIZE {
            return Err(EntryError::Corrupt(format!(
                "{path} is {} bytes uncompressed (limit {MAX_ENTRY_SIZE})",
                file.size()
            )));
        }

        let mut contents = Vec::with_capacity(file.size() as usize);
        file.take(MAX_ENTRY_SIZE)
            .read_to_end(&mut contents)
            .map_err(|e| EntryError::Corrupt(format!("{path}: {e}")))?;
        Ok(contents)
    }

    /// First entry whose file name matches `path`'s, ignoring case.
    pub fn find_by_basename(&self, path: &str) -> Option<String> {
        let wanted = archive_basename(path);
        if wanted.is_empty() {
            return None;
        }
        self.archive
            .file_names()
            .find(|name| archive_basename(name).eq_ignore_ascii_case(wanted))
            .map(str::to_owned)
    }
}
