//! Error taxonomy for media fetching.
//!
//! Four kinds cover every way a fetch can fail. A rename collision during
//! extension correction is deliberately not one of them: the duplicate is
//! discarded and the pre-existing file wins.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching one media resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The target path's extension is not a recognized image extension.
    #[error("unrecognized image extension for {path}")]
    UnsupportedExtension {
        /// The offending target path.
        path: PathBuf,
    },

    /// The network transfer did not complete, or produced an unreadable or
    /// empty artifact. Any partial file has been deleted.
    #[error("unable to download \"{url}\": {detail}")]
    TransferFailed {
        /// The URL that failed to transfer.
        url: String,
        /// What went wrong, for the log.
        detail: String,
    },

    /// The transfer completed but the bytes match no recognized image type.
    /// The downloaded file is left on disk.
    #[error("\"{url}\" is not a known image format")]
    UnknownFormat {
        /// The URL whose content failed verification.
        url: String,
    },

    /// Filesystem failure outside the transfer itself (creating the target,
    /// renaming to the canonical extension).
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Creates an unsupported-extension error.
    pub fn unsupported_extension(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedExtension { path: path.into() }
    }

    /// Creates a transfer-failed error.
    pub fn transfer_failed(url: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::TransferFailed {
            url: url.into(),
            detail: detail.to_string(),
        }
    }

    /// Creates an unknown-format error.
    pub fn unknown_format(url: impl Into<String>) -> Self {
        Self::UnknownFormat { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
