//! The update run.
//!
//! Drives the walker over an archive, fetches each item's media, and keeps
//! the catalog safe: whatever else happens, the catalog is written back
//! exactly once at the end of the run, so every item completed before a
//! failure survives into the next attempt.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::adapter::{SourceAdapter, SourceError};
use crate::blog::BLOG_MEDIA_DIR;
use crate::catalog::{Catalog, CatalogError, CatalogStore};
use crate::fetch::{FetchError, MediaFetcher};
use crate::walker::{ArchiveWalker, WalkPolicy};

/// Subdirectory of the archive root holding downloaded media.
pub const MEDIA_DIR: &str = "comics";

/// Subdirectory of the archive root holding the catalog and site files.
pub const RESOURCE_DIR: &str = "resource";

/// Errors from an update run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The source adapter failed while walking or scraping.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A media fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The catalog could not be loaded or persisted.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A required directory could not be created.
    #[error("cannot create {path}: {source}")]
    Setup {
        /// The directory that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Records appended during this run.
    pub appended: usize,
    /// Total records now in the catalog.
    pub total: usize,
}

/// Drives one archive update end to end.
pub struct ArchiveEngine {
    root: PathBuf,
    fetcher: MediaFetcher,
}

impl ArchiveEngine {
    /// Engine for the archive rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, fetcher: MediaFetcher) -> Self {
        Self {
            root: root.into(),
            fetcher,
        }
    }

    /// The directory downloaded media lives under.
    #[must_use]
    pub fn media_dir(&self) -> PathBuf {
        self.root.join(MEDIA_DIR)
    }

    /// The directory the catalog and site files live under.
    #[must_use]
    pub fn resource_dir(&self) -> PathBuf {
        self.root.join(RESOURCE_DIR)
    }

    /// Runs the update: walk, fetch, append, postprocess.
    ///
    /// The catalog is persisted on every exit path, including the error
    /// path, so a failed run never loses the items that preceded the
    /// failure.
    ///
    /// # Errors
    ///
    /// The first adapter or fetch error aborts the drive loop (no per-item
    /// recovery) and is returned after the catalog has been persisted. When
    /// persistence itself also fails, the drive error wins and the
    /// persistence failure is logged.
    pub async fn run(
        &self,
        adapter: &mut dyn SourceAdapter,
        policy: &WalkPolicy,
        extra_dirs: &[String],
    ) -> Result<RunSummary, RunError> {
        self.create_required_dirs(extra_dirs).await?;

        let store = CatalogStore::new(&self.resource_dir());
        let mut catalog = store.load().await?;
        let before = catalog.len();
        info!(records = before, "catalog loaded");

        let outcome = self.drive(adapter, policy, &mut catalog).await;
        if let Err(run_error) = &outcome {
            error!(error = %run_error, "update aborted");
        }

        let persisted = store.persist(&catalog).await;
        match &persisted {
            Ok(()) => info!(records = catalog.len(), "catalog persisted"),
            Err(persist_error) if outcome.is_err() => {
                warn!(error = %persist_error, "catalog persistence failed after run error");
            }
            Err(_) => {}
        }

        outcome?;
        persisted?;

        Ok(RunSummary {
            appended: catalog.len() - before,
            total: catalog.len(),
        })
    }

    /// The sequential drive loop. Items are processed strictly in walker
    /// order; each fetch completes before the next begins.
    async fn drive(
        &self,
        adapter: &mut dyn SourceAdapter,
        policy: &WalkPolicy,
        catalog: &mut Catalog,
    ) -> Result<(), RunError> {
        let media_dir = self.media_dir();

        {
            let mut walker = ArchiveWalker::new(&mut *adapter, policy);
            while let Some(mut entry) = walker.next_entry().await? {
                info!(
                    date = %entry.record.date,
                    title = %entry.record.title,
                    "getting comic"
                );
                if let Some(media_url) = entry.media_url.as_deref() {
                    let target = media_dir.join(&entry.record.filename);
                    let basename = self.fetcher.fetch(media_url, &target).await?;
                    if basename != entry.record.filename {
                        entry.record.filename = basename;
                    }
                }
                catalog.append(entry.record);
            }
        }

        adapter.postprocess().await?;
        Ok(())
    }

    /// Creates the directories a run writes into.
    async fn create_required_dirs(&self, extra_dirs: &[String]) -> Result<(), RunError> {
        let mut required = vec![
            self.media_dir(),
            self.media_dir().join(BLOG_MEDIA_DIR),
            self.resource_dir(),
        ];
        required.extend(extra_dirs.iter().map(|dir| self.root.join(dir)));

        for dir in required {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|error| RunError::Setup {
                    path: dir.clone(),
                    source: error,
                })?;
        }
        Ok(())
    }
}
