//! Idempotent media downloads with format verification.
//!
//! One resource, one path, one attempt. A file already on disk
//! short-circuits the network entirely, which is what makes an interrupted
//! run safe to repeat: everything fetched before the failure is simply
//! skipped the next time around.
//!
//! Servers routinely lie about image formats, so every fresh download is
//! sniffed and renamed to the extension its bytes actually call for.

mod error;

pub use error::FetchError;

use std::path::Path;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};
use url::Url;

/// Extensions accepted for a fetch target, matched case-insensitively.
pub const KNOWN_IMAGE_EXTENSIONS: [&str; 4] = [".gif", ".png", ".jpg", ".jpeg"];

/// Image types recognized by content sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageKind {
    Gif,
    Png,
    Jpeg,
}

impl ImageKind {
    /// The extension a file of this type should carry.
    fn canonical_extension(self) -> &'static str {
        match self {
            Self::Gif => ".gif",
            Self::Png => ".png",
            Self::Jpeg => ".jpg",
        }
    }
}

/// Determines the true image type from downloaded bytes.
fn detect_image_kind(bytes: &[u8]) -> Option<ImageKind> {
    let kind = infer::get(bytes)?;
    match kind.mime_type() {
        "image/gif" => Some(ImageKind::Gif),
        "image/png" => Some(ImageKind::Png),
        "image/jpeg" => Some(ImageKind::Jpeg),
        _ => None,
    }
}

/// HTTP downloader for comic media.
///
/// Cheap to clone; wraps a pooled reqwest client that is created once and
/// reused across every download in the run.
#[derive(Debug, Clone, Default)]
pub struct MediaFetcher {
    client: Client,
}

impl MediaFetcher {
    /// Creates a fetcher with a fresh HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fetcher sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches `url` into `target`, returning the final on-disk basename.
    ///
    /// An existing file at `target` is returned as-is without touching the
    /// network. A fresh download is sniffed for its true image type and, when
    /// the target's extension disagrees with the canonical one, renamed; a
    /// rename collision keeps the pre-existing file and discards the new
    /// download.
    ///
    /// # Errors
    ///
    /// - [`FetchError::UnsupportedExtension`] when `target` does not end in
    ///   one of [`KNOWN_IMAGE_EXTENSIONS`].
    /// - [`FetchError::TransferFailed`] when the transfer fails or yields an
    ///   unreadable or empty file; the partial file is deleted first.
    /// - [`FetchError::UnknownFormat`] when the bytes match no recognized
    ///   image type; the file is left on disk.
    /// - [`FetchError::Io`] on filesystem failures around the transfer.
    pub async fn fetch(&self, url: &str, target: &Path) -> Result<String, FetchError> {
        if tokio::fs::try_exists(target).await.unwrap_or(false) {
            debug!(path = %target.display(), "already downloaded");
            return Ok(basename(target));
        }

        let extension = path_extension(target);
        if !KNOWN_IMAGE_EXTENSIONS.contains(&extension.to_lowercase().as_str()) {
            return Err(FetchError::unsupported_extension(target));
        }

        self.transfer(url, target).await?;

        let bytes = match tokio::fs::read(target).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                let _ = tokio::fs::remove_file(target).await;
                return Err(FetchError::transfer_failed(url, "empty response body"));
            }
            Err(error) => {
                let _ = tokio::fs::remove_file(target).await;
                return Err(FetchError::transfer_failed(url, error));
            }
        };

        let Some(kind) = detect_image_kind(&bytes) else {
            // The unverified file stays on disk for inspection.
            return Err(FetchError::unknown_format(url));
        };

        let canonical = kind.canonical_extension();
        if extension == canonical {
            return Ok(basename(target));
        }

        let corrected = target.with_extension(&canonical[1..]);
        info!(
            from = %basename(target),
            to = %basename(&corrected),
            "correcting media extension"
        );
        if tokio::fs::try_exists(&corrected).await.unwrap_or(false) {
            // Collision means this resource was already downloaded under its
            // canonical name; discard the duplicate.
            warn!(path = %corrected.display(), "canonical file already present, discarding duplicate");
            let _ = tokio::fs::remove_file(target).await;
            return Ok(basename(&corrected));
        }
        tokio::fs::rename(target, &corrected)
            .await
            .map_err(|error| FetchError::io(target, error))?;
        Ok(basename(&corrected))
    }

    /// Performs the single streaming transfer, cleaning up the partial file
    /// on any failure mid-stream.
    async fn transfer(&self, url: &str, target: &Path) -> Result<(), FetchError> {
        debug!(url = %url, path = %target.display(), "starting transfer");

        let parsed =
            Url::parse(url).map_err(|error| FetchError::transfer_failed(url, error))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|error| FetchError::transfer_failed(url, error))?;
        if !response.status().is_success() {
            return Err(FetchError::transfer_failed(
                url,
                format!("HTTP {}", response.status().as_u16()),
            ));
        }

        let file = File::create(target)
            .await
            .map_err(|error| FetchError::io(target, error))?;

        let result = stream_to_file(file, response, url, target).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(target).await;
        }
        result
    }
}

/// Streams the response body into `file`. The caller removes the partial
/// file when this fails.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    target: &Path,
) -> Result<(), FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| FetchError::transfer_failed(url, error))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|error| FetchError::transfer_failed(url, error))?;
    }

    writer
        .flush()
        .await
        .map_err(|error| FetchError::transfer_failed(url, error))?;
    debug!(path = %target.display(), "transfer complete");
    Ok(())
}

/// The file name component of `path`, lossily decoded.
fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The extension of `path` including the leading dot, or an empty string.
fn path_extension(path: &Path) -> String {
    path.extension()
        .map(|extension| format!(".{}", extension.to_string_lossy()))
        .unwrap_or_default()
}
