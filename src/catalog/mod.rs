//! Catalog records and the persisted catalog document.
//!
//! The catalog is the archive's memory: an ordered, append-only list of every
//! strip mirrored so far, written back to `resource/db.json` at the end of
//! every run. Insertion order is processing order and is preserved verbatim
//! across load/persist cycles.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

/// One archived comic strip.
///
/// Fields are declared in alphabetical order so the persisted document keeps
/// a stable key ordering inside each record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Optional secondary media filename, such as a hi-res version.
    pub alternate: Option<String>,
    /// Blog text for the strip, stored with media references already
    /// localized.
    pub blogtext: String,
    /// Publication date as shown on the source page.
    pub date: String,
    /// Episode or storyline label.
    pub episode: String,
    /// Media filename relative to the comics directory. May be corrected
    /// after a format-driven rename during download.
    pub filename: String,
    /// Mouseover text attached to the strip.
    pub hovertext: String,
    /// Strip title.
    pub title: String,
    /// Canonical source page for the strip.
    pub url: String,
}

/// Ordered, append-only collection of catalog records.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-loaded record list.
    #[must_use]
    pub fn from_records(records: Vec<CatalogRecord>) -> Self {
        Self { records }
    }

    /// Appends one record. No validation, no dedupe; uniqueness of
    /// `filename` is the source adapter's responsibility.
    pub fn append(&mut self, record: CatalogRecord) {
        self.records.push(record);
    }

    /// All records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Errors from loading or persisting the catalog document.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Filesystem error reading or writing the document.
    #[error("IO error accessing {path}: {source}")]
    Io {
        /// The document path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The document exists but is not a valid record list.
    #[error("malformed catalog document {path}: {source}")]
    Malformed {
        /// The document path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// The catalog document's filename under the resource directory.
pub const CATALOG_DOCUMENT: &str = "db.json";

/// Loads and persists the catalog document.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Store for the document under `resource_dir`.
    #[must_use]
    pub fn new(resource_dir: &Path) -> Self {
        Self {
            path: resource_dir.join(CATALOG_DOCUMENT),
        }
    }

    /// The document path this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted catalog. A missing document is the first-run
    /// case and yields an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` when the document cannot be read for any
    /// reason other than absence, and `CatalogError::Malformed` when its
    /// contents do not parse.
    pub async fn load(&self) -> Result<Catalog, CatalogError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Catalog::new());
            }
            Err(error) => {
                return Err(CatalogError::Io {
                    path: self.path.clone(),
                    source: error,
                });
            }
        };

        let records: Vec<CatalogRecord> =
            serde_json::from_slice(&bytes).map_err(|error| CatalogError::Malformed {
                path: self.path.clone(),
                source: error,
            })?;
        Ok(Catalog::from_records(records))
    }

    /// Writes the full catalog, replacing any prior contents. Keys inside
    /// each record come out alphabetical with four-space indentation.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` when the write fails.
    pub async fn persist(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        catalog
            .records()
            .serialize(&mut serializer)
            .map_err(|error| CatalogError::Malformed {
                path: self.path.clone(),
                source: error,
            })?;

        tokio::fs::write(&self.path, buffer)
            .await
            .map_err(|error| CatalogError::Io {
                path: self.path.clone(),
                source: error,
            })
    }
}
