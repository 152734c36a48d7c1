//! Blog text localization.
//!
//! Rewrites the HTML-ish blog fragments attached to strips so that embedded
//! and linked media point at locally fetched copies under `blogimgs/`.
//!
//! Both passes are tolerant text scans over the raw fragment, not a markup
//! parse. The archives this tool mirrors carry a decade of hand-written
//! markup in mixed case with inconsistent quoting; a strict parser rejects
//! exactly the posts worth keeping. The scanner normalizes the common case
//! variants of the tag and attribute names, then treats whatever character
//! follows `=` as the value delimiter.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::fetch::{FetchError, MediaFetcher};

/// Directory under the media root where localized blog media lands.
pub const BLOG_MEDIA_DIR: &str = "blogimgs";

/// Extensions a linked reference must carry to be localized. Anything else
/// is left untouched.
const LINKED_EXTENSIONS: [&str; 3] = [".gif", ".png", ".jpg"];

/// Rewrites blog fragments against one site's URL space.
#[derive(Debug, Clone)]
pub struct BlogLocalizer {
    fetcher: MediaFetcher,
    url_prefix: String,
    media_root: PathBuf,
}

impl BlogLocalizer {
    /// Localizer resolving relative references against `url_prefix` and
    /// storing media under `media_root`.
    pub fn new(
        fetcher: MediaFetcher,
        url_prefix: impl Into<String>,
        media_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            url_prefix: url_prefix.into(),
            media_root: media_root.into(),
        }
    }

    /// Localizes embedded images, then linked images.
    ///
    /// # Errors
    ///
    /// An embedded image that fails to fetch is fatal: the post cannot
    /// render without it. Linked images are outbound references and a broken
    /// one is logged and left as-is.
    pub async fn localize(&self, text: &str) -> Result<String, FetchError> {
        self.localize_with_ignored(text, &[]).await
    }

    /// Like [`localize`](Self::localize), leaving any embedded reference in
    /// `ignored` untouched. Site adapters use this for decorative images
    /// that should not be mirrored.
    pub async fn localize_with_ignored(
        &self,
        text: &str,
        ignored: &[&str],
    ) -> Result<String, FetchError> {
        let text = self.localize_embedded(text, ignored).await?;
        Ok(self.localize_linked(&text).await)
    }

    async fn localize_embedded(
        &self,
        text: &str,
        ignored: &[&str],
    ) -> Result<String, FetchError> {
        let mut out = text.to_string();
        for reference in embedded_refs(text) {
            if ignored.contains(&reference.as_str()) {
                continue;
            }
            let (download_url, local_path) = self.resolve(&reference);
            debug!(reference = %reference, url = %download_url, "localizing embedded image");
            self.fetcher
                .fetch(&download_url, &self.media_root.join(&local_path))
                .await?;
            out = out.replace(&reference, &local_path);
        }
        Ok(out)
    }

    async fn localize_linked(&self, text: &str) -> String {
        let mut out = text.to_string();
        for reference in linked_refs(text) {
            let (download_url, local_path) = self.resolve(&reference);
            if !LINKED_EXTENSIONS
                .iter()
                .any(|extension| local_path.ends_with(extension))
            {
                continue;
            }
            match self
                .fetcher
                .fetch(&download_url, &self.media_root.join(&local_path))
                .await
            {
                Ok(_) => {
                    out = out.replace(&reference, &local_path);
                }
                Err(error) => {
                    // Broken outbound links are common in old posts and do
                    // not break layout.
                    warn!(reference = %reference, error = %error, "leaving broken link unchanged");
                }
            }
        }
        out
    }

    /// Resolves a scanned reference to its download URL and the local
    /// relative path it will be rewritten to.
    fn resolve(&self, reference: &str) -> (String, String) {
        let mut url = reference
            .split('?')
            .next()
            .unwrap_or(reference)
            .to_string();
        if let Some(stripped) = url.strip_prefix("./") {
            url = stripped.to_string();
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            url = format!("{}{}", self.url_prefix, url);
        }
        let url = url.replace("../", "");

        let name = url.rsplit('/').next().unwrap_or(&url).replace("%20", " ");
        let local_path = format!("{BLOG_MEDIA_DIR}/{name}");
        (url, local_path)
    }
}

/// Extracts embedded image references from `<img src=...>` occurrences.
fn embedded_refs(text: &str) -> Vec<String> {
    let normalized = text.replace("<IMG ", "<img ");
    let mut refs = Vec::new();
    for segment in normalized.split("<img").skip(1) {
        let segment = segment.replace("SRC=", "src=");
        if let Some(value) = attribute_value(&segment, "src=") {
            refs.push(value);
        }
    }
    refs
}

/// Extracts linked references from `<a href=...>` opening tags.
fn linked_refs(text: &str) -> Vec<String> {
    let normalized = text.replace("<A ", "<a ");
    let mut refs = Vec::new();
    for segment in normalized.split("<a ").skip(1) {
        let end = segment.find('>').map_or(segment.len(), |index| index + 1);
        let tag = segment[..end].replace(" HREF=", " href=");
        if let Some(value) = attribute_value(&tag, " href=") {
            refs.push(value);
        }
    }
    refs
}

/// The value following `marker`, delimited by whatever character comes right
/// after it. Returns `None` when the marker is absent or the value is
/// unterminated.
fn attribute_value(text: &str, marker: &str) -> Option<String> {
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let delimiter = rest.chars().next()?;
    let value = &rest[delimiter.len_utf8()..];
    let end = value.find(delimiter)?;
    Some(value[..end].to_string())
}
