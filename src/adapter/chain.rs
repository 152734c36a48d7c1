//! Config-driven adapter for sites whose only stable contract is a chain of
//! previous-page links.
//!
//! Field extraction is a set of per-site regular expressions from the site
//! configuration; group 1 of each pattern is the value. A page is fetched
//! once, while its entry is computed; the previous-page link found in that
//! body becomes the next URL in the chain. The page a halt URL points at is
//! therefore never fetched at all.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use super::registry::AdapterError;
use super::{ChainOptions, SourceAdapter, SourceError};
use crate::blog::BlogLocalizer;
use crate::catalog::CatalogRecord;
use crate::walker::ComicEntry;

/// Compiled extraction patterns.
struct Patterns {
    prev_url: Regex,
    media_url: Option<Regex>,
    title: Option<Regex>,
    hovertext: Option<Regex>,
    blogtext: Option<Regex>,
    date: Option<Regex>,
    episode: Option<Regex>,
    alternate: Option<Regex>,
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, AdapterError> {
    Regex::new(pattern).map_err(|source| AdapterError::Pattern { field, source })
}

fn compile_optional(
    field: &'static str,
    pattern: Option<&String>,
) -> Result<Option<Regex>, AdapterError> {
    pattern.map(|pattern| compile(field, pattern)).transpose()
}

impl Patterns {
    fn from_options(options: &ChainOptions) -> Result<Self, AdapterError> {
        Ok(Self {
            prev_url: compile("prev_url", &options.prev_url)?,
            media_url: compile_optional("media_url", options.media_url.as_ref())?,
            title: compile_optional("title", options.title.as_ref())?,
            hovertext: compile_optional("hovertext", options.hovertext.as_ref())?,
            blogtext: compile_optional("blogtext", options.blogtext.as_ref())?,
            date: compile_optional("date", options.date.as_ref())?,
            episode: compile_optional("episode", options.episode.as_ref())?,
            alternate: compile_optional("alternate", options.alternate.as_ref())?,
        })
    }
}

/// Extracts group 1 of an optional pattern, or an empty string.
fn capture(pattern: Option<&Regex>, body: &str) -> String {
    pattern
        .and_then(|pattern| pattern.captures(body))
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str().to_string())
        .unwrap_or_default()
}

/// Walks an archive backward through its previous-page links.
pub struct ChainAdapter {
    client: Client,
    localizer: BlogLocalizer,
    url_prefix: String,
    patterns: Patterns,
    /// The URL the chain yields next. Discovered while computing the
    /// preceding page's entry.
    next_url: Option<String>,
}

impl ChainAdapter {
    /// Builds the adapter from its configured options.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Pattern`] when any extraction pattern fails
    /// to compile.
    pub fn new(
        client: Client,
        localizer: BlogLocalizer,
        url_prefix: impl Into<String>,
        options: &ChainOptions,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            client,
            localizer,
            url_prefix: url_prefix.into(),
            patterns: Patterns::from_options(options)?,
            next_url: Some(options.first_url.clone()),
        })
    }

    fn absolutize(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.url_prefix, url)
        }
    }

    async fn page_body(&self, url: &str) -> Result<String, SourceError> {
        debug!(url = %url, "fetching page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| SourceError::page_fetch(url, error))?;
        if !response.status().is_success() {
            return Err(SourceError::page_fetch(
                url,
                format!("HTTP {}", response.status().as_u16()),
            ));
        }
        response
            .text()
            .await
            .map_err(|error| SourceError::page_fetch(url, error))
    }
}

#[async_trait]
impl SourceAdapter for ChainAdapter {
    async fn next_page_url(&mut self) -> Result<Option<String>, SourceError> {
        Ok(self.next_url.take())
    }

    async fn entry_for(&mut self, url: &str) -> Result<ComicEntry, SourceError> {
        let body = self.page_body(url).await?;

        // The chain continues wherever this page points; no match means the
        // oldest page was reached.
        self.next_url = self
            .patterns
            .prev_url
            .captures(&body)
            .and_then(|captures| captures.get(1))
            .map(|group| self.absolutize(group.as_str()));

        let media_url = match capture(self.patterns.media_url.as_ref(), &body) {
            value if value.is_empty() => None,
            value => Some(self.absolutize(&value)),
        };
        let filename = media_url
            .as_deref()
            .and_then(|media| media.rsplit('/').next())
            .map(|name| name.replace("%20", " "))
            .unwrap_or_default();

        let raw_blogtext = capture(self.patterns.blogtext.as_ref(), &body);
        let blogtext = if raw_blogtext.is_empty() {
            raw_blogtext
        } else {
            self.localizer.localize(&raw_blogtext).await?
        };

        let alternate = match capture(self.patterns.alternate.as_ref(), &body) {
            value if value.is_empty() => None,
            value => Some(value),
        };

        let record = CatalogRecord {
            alternate,
            blogtext,
            date: capture(self.patterns.date.as_ref(), &body),
            episode: capture(self.patterns.episode.as_ref(), &body),
            filename,
            hovertext: capture(self.patterns.hovertext.as_ref(), &body),
            title: capture(self.patterns.title.as_ref(), &body),
            url: url.to_string(),
        };
        Ok(ComicEntry { record, media_url })
    }
}
