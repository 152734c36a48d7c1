//! Site adapters.
//!
//! An adapter knows where one archived site's pages come from and how a page
//! becomes a catalog entry. Traversal policy (halt, skip, injections,
//! extras) is explicit configuration consumed by the walker, not adapter
//! state; adapters stay stateless apart from their position in the chain.

mod chain;
mod config;
mod registry;

pub use chain::ChainAdapter;
pub use config::{ChainOptions, ConfigError, ConfiguredEntry, SiteConfig, SITE_CONFIG_DOCUMENT};
pub use registry::{AdapterError, build_adapter};

use async_trait::async_trait;
use thiserror::Error;

use crate::walker::ComicEntry;

/// Errors raised by a source adapter while walking or scraping a site.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A page in the chain could not be fetched.
    #[error("failed to fetch page {url}: {detail}")]
    PageFetch {
        /// The page URL.
        url: String,
        /// What went wrong.
        detail: String,
    },

    /// Localizing a page's blog text failed (an embedded image could not be
    /// fetched).
    #[error(transparent)]
    Fetch(#[from] crate::fetch::FetchError),
}

impl SourceError {
    /// Creates a page-fetch error.
    pub fn page_fetch(url: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::PageFetch {
            url: url.into(),
            detail: detail.to_string(),
        }
    }
}

/// A source of pages for one archived site.
///
/// Implementations expose the backward page chain lazily and turn one page
/// URL into one catalog entry. One implementation exists per site; the
/// registry selects it at startup from the site configuration.
#[async_trait]
pub trait SourceAdapter: Send {
    /// The next page URL in the chain, or `None` when the chain ends.
    async fn next_page_url(&mut self) -> Result<Option<String>, SourceError>;

    /// Computes the catalog entry for one page.
    async fn entry_for(&mut self, url: &str) -> Result<ComicEntry, SourceError>;

    /// Invoked once after traversal completes.
    async fn postprocess(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}
