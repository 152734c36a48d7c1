//! Adapter selection at startup.
//!
//! The site configuration names an adapter; the registry maps that name to a
//! concrete implementation. New site adapters register here.

use std::path::Path;

use thiserror::Error;

use super::{ChainAdapter, SiteConfig, SourceAdapter};
use crate::blog::BlogLocalizer;
use crate::fetch::MediaFetcher;

/// Errors building the configured adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The configuration names an adapter nobody registered.
    #[error("unknown adapter \"{name}\" in site configuration")]
    Unknown {
        /// The unrecognized adapter name.
        name: String,
    },

    /// The selected adapter needs an options block the configuration lacks.
    #[error("adapter \"{name}\" requires a \"{block}\" options block")]
    MissingOptions {
        /// The adapter name.
        name: String,
        /// The missing options block.
        block: &'static str,
    },

    /// An extraction pattern failed to compile.
    #[error("invalid {field} pattern: {source}")]
    Pattern {
        /// The configuration field holding the pattern.
        field: &'static str,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// Builds the adapter the site configuration selects.
///
/// `media_root` is the directory blog media is localized under; the adapter
/// shares the fetcher's HTTP client for page retrieval.
///
/// # Errors
///
/// Returns [`AdapterError::Unknown`] for an unregistered adapter name,
/// [`AdapterError::MissingOptions`] when the selected adapter's options
/// block is absent, and [`AdapterError::Pattern`] for an invalid extraction
/// pattern.
pub fn build_adapter(
    config: &SiteConfig,
    fetcher: &MediaFetcher,
    media_root: &Path,
) -> Result<Box<dyn SourceAdapter>, AdapterError> {
    match config.adapter.as_str() {
        "chain" => {
            let options = config.chain.as_ref().ok_or_else(|| {
                AdapterError::MissingOptions {
                    name: config.adapter.clone(),
                    block: "chain",
                }
            })?;
            let localizer =
                BlogLocalizer::new(fetcher.clone(), config.url_prefix.clone(), media_root);
            let adapter = ChainAdapter::new(
                fetcher.client().clone(),
                localizer,
                config.url_prefix.clone(),
                options,
            )?;
            Ok(Box::new(adapter))
        }
        other => Err(AdapterError::Unknown {
            name: other.to_string(),
        }),
    }
}
