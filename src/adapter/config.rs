//! The per-archive site configuration document.
//!
//! Every archive root carries a `resource/site.json` naming the adapter that
//! walks it and the policy it walks under. The document is the one place a
//! site's quirks live: pages to skip, items to backfill, the URL prefix for
//! relative media references, and the extraction patterns for the chain
//! adapter.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogRecord;
use crate::walker::{ComicEntry, WalkPolicy};

/// The site configuration document's filename under the resource directory.
pub const SITE_CONFIG_DOCUMENT: &str = "site.json";

/// A (record, media URL) pair as written in the configuration. Used for
/// injections and extras.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfiguredEntry {
    /// The record to catalog.
    pub record: CatalogRecord,
    /// Media to fetch for it, if any.
    #[serde(default)]
    pub media_url: Option<String>,
}

impl From<ConfiguredEntry> for ComicEntry {
    fn from(configured: ConfiguredEntry) -> Self {
        Self {
            record: configured.record,
            media_url: configured.media_url,
        }
    }
}

/// Extraction options for the chain adapter.
///
/// All patterns are regular expressions applied to a page body; capture
/// group 1 is the extracted value. Optional patterns that are absent, or
/// that fail to match, yield an empty field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainOptions {
    /// Newest page of the archive; the walk starts here.
    pub first_url: String,
    /// Locates the previous-page link. The chain ends on the first page
    /// with no match.
    pub prev_url: String,
    /// Locates the strip's media URL. A page without a match yields a
    /// record with no media.
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub hovertext: Option<String>,
    #[serde(default)]
    pub blogtext: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub episode: Option<String>,
    #[serde(default)]
    pub alternate: Option<String>,
}

/// The `resource/site.json` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Registry key of the adapter implementation that walks this site.
    pub adapter: String,
    /// Base URL for resolving relative media references.
    pub url_prefix: String,
    /// Default halt page; a halt URL given on the command line wins.
    #[serde(default)]
    pub halt_url: Option<String>,
    /// Entries injected ahead of their trigger page.
    #[serde(default)]
    pub injections: HashMap<String, Vec<ConfiguredEntry>>,
    /// Pages excluded from the catalog.
    #[serde(default)]
    pub skip: Vec<String>,
    /// Entries appended after every regular item.
    #[serde(default)]
    pub extras: Vec<ConfiguredEntry>,
    /// Extra directories created under the archive root before the run.
    #[serde(default)]
    pub extra_dirs: Vec<String>,
    /// Options for the chain adapter, when selected.
    #[serde(default)]
    pub chain: Option<ChainOptions>,
}

/// Errors from loading the site configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be read.
    #[error("cannot read site configuration {path}: {source}")]
    Io {
        /// The document path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The document exists but does not parse.
    #[error("malformed site configuration {path}: {source}")]
    Malformed {
        /// The document path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl SiteConfig {
    /// Loads the document from `resource_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` when the document cannot be read and
    /// `ConfigError::Malformed` when it does not parse.
    pub fn load(resource_dir: &Path) -> Result<Self, ConfigError> {
        let path = resource_dir.join(SITE_CONFIG_DOCUMENT);
        let bytes = std::fs::read(&path).map_err(|error| ConfigError::Io {
            path: path.clone(),
            source: error,
        })?;
        serde_json::from_slice(&bytes).map_err(|error| ConfigError::Malformed {
            path,
            source: error,
        })
    }

    /// Traversal policy from this configuration. A halt URL supplied on the
    /// command line overrides the configured one.
    #[must_use]
    pub fn walk_policy(&self, halt_override: Option<&str>) -> WalkPolicy {
        WalkPolicy {
            halt_url: halt_override
                .map(str::to_string)
                .or_else(|| self.halt_url.clone()),
            injections: self
                .injections
                .iter()
                .map(|(url, entries)| {
                    (
                        url.clone(),
                        entries.iter().cloned().map(ComicEntry::from).collect(),
                    )
                })
                .collect(),
            skips: self.skip.iter().cloned().collect(),
            extras: self.extras.iter().cloned().map(ComicEntry::from).collect(),
        }
    }
}
