//! Archive traversal.
//!
//! Turns the adapter's backward page chain into the bounded sequence of
//! catalog entries, honoring halt, skip, injection, and extras policy.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::adapter::{SourceAdapter, SourceError};
use crate::catalog::CatalogRecord;

/// One walker output: a record plus the media URL to fetch for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComicEntry {
    /// The record to append to the catalog.
    pub record: CatalogRecord,
    /// The strip's media URL. Absent for text-only items.
    pub media_url: Option<String>,
}

/// Synthetic entries emitted immediately ahead of specific trigger pages,
/// used to backfill items the source itself is missing.
pub type InjectionMap = HashMap<String, Vec<ComicEntry>>;

/// Pages whose item is excluded from the catalog entirely.
pub type SkipSet = HashSet<String>;

/// Immutable per-site traversal policy.
#[derive(Debug, Clone, Default)]
pub struct WalkPolicy {
    /// Oldest page already cataloged by a prior run. Traversal stops the
    /// instant the adapter produces it; the page itself is never processed.
    pub halt_url: Option<String>,
    /// Entries injected ahead of their trigger page.
    pub injections: InjectionMap,
    /// Pages excluded from the catalog.
    pub skips: SkipSet,
    /// Entries appended after every regular (non-injected, non-skipped)
    /// item.
    pub extras: Vec<ComicEntry>,
}

/// Bounded producer over the adapter's page chain.
///
/// Per page URL, in order: halt check, injections keyed to the URL, the
/// page's own entry, then the extras. The page's entry is computed even when
/// the URL is skipped; the skip discards it afterwards. Injected entries
/// never trigger extras, and a skip does not suppress an injection keyed to
/// the same URL.
pub struct ArchiveWalker<'a> {
    adapter: &'a mut dyn SourceAdapter,
    policy: &'a WalkPolicy,
    buffered: VecDeque<ComicEntry>,
    exhausted: bool,
}

impl<'a> ArchiveWalker<'a> {
    /// Walker over `adapter` under `policy`.
    pub fn new(adapter: &'a mut dyn SourceAdapter, policy: &'a WalkPolicy) -> Self {
        Self {
            adapter,
            policy,
            buffered: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Produces the next entry, or `None` once the page chain is exhausted
    /// or the halt page was reached.
    ///
    /// # Errors
    ///
    /// Adapter failures propagate unchanged; the walker makes no attempt to
    /// resume past them.
    pub async fn next_entry(&mut self) -> Result<Option<ComicEntry>, SourceError> {
        loop {
            if let Some(entry) = self.buffered.pop_front() {
                return Ok(Some(entry));
            }
            if self.exhausted {
                return Ok(None);
            }

            let Some(url) = self.adapter.next_page_url().await? else {
                self.exhausted = true;
                continue;
            };

            if self.policy.halt_url.as_deref() == Some(url.as_str()) {
                debug!(url = %url, "reached halt page, stopping traversal");
                self.exhausted = true;
                continue;
            }

            if let Some(injected) = self.policy.injections.get(&url) {
                debug!(url = %url, count = injected.len(), "injecting entries ahead of page");
                self.buffered.extend(injected.iter().cloned());
            }

            let entry = self.adapter.entry_for(&url).await?;
            if self.policy.skips.contains(&url) {
                debug!(url = %url, "page is skipped, discarding its entry");
                continue;
            }

            self.buffered.push_back(entry);
            self.buffered.extend(self.policy.extras.iter().cloned());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn record(title: &str) -> CatalogRecord {
        CatalogRecord {
            alternate: None,
            blogtext: String::new(),
            date: String::new(),
            episode: String::new(),
            filename: format!("{title}.png"),
            hovertext: String::new(),
            title: title.to_string(),
            url: String::new(),
        }
    }

    fn entry(title: &str) -> ComicEntry {
        ComicEntry {
            record: record(title),
            media_url: None,
        }
    }

    /// Adapter over a fixed URL list; the entry title doubles as the URL so
    /// output order is easy to assert.
    struct ScriptedAdapter {
        urls: VecDeque<String>,
        metadata_calls: Vec<String>,
    }

    impl ScriptedAdapter {
        fn new(urls: &[&str]) -> Self {
            Self {
                urls: urls.iter().map(|url| (*url).to_string()).collect(),
                metadata_calls: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for ScriptedAdapter {
        async fn next_page_url(&mut self) -> Result<Option<String>, SourceError> {
            Ok(self.urls.pop_front())
        }

        async fn entry_for(&mut self, url: &str) -> Result<ComicEntry, SourceError> {
            self.metadata_calls.push(url.to_string());
            Ok(entry(url))
        }
    }

    async fn collect_titles(adapter: &mut ScriptedAdapter, policy: &WalkPolicy) -> Vec<String> {
        let mut walker = ArchiveWalker::new(adapter, policy);
        let mut titles = Vec::new();
        while let Some(entry) = walker.next_entry().await.unwrap() {
            titles.push(entry.record.title);
        }
        titles
    }

    #[tokio::test]
    async fn test_walker_passes_every_url_through_without_policy() {
        let mut adapter = ScriptedAdapter::new(&["u1", "u2", "u3"]);
        let titles = collect_titles(&mut adapter, &WalkPolicy::default()).await;
        assert_eq!(titles, vec!["u1", "u2", "u3"]);
    }

    #[tokio::test]
    async fn test_walker_stops_at_halt_url_before_processing_it() {
        let mut adapter = ScriptedAdapter::new(&["u1", "u2", "halt", "u3"]);
        let policy = WalkPolicy {
            halt_url: Some("halt".to_string()),
            ..WalkPolicy::default()
        };

        let titles = collect_titles(&mut adapter, &policy).await;
        assert_eq!(titles, vec!["u1", "u2"]);
        assert_eq!(
            adapter.metadata_calls,
            vec!["u1", "u2"],
            "the halt page itself must never be processed"
        );
    }

    #[tokio::test]
    async fn test_walker_injects_entries_ahead_of_trigger_page() {
        let mut adapter = ScriptedAdapter::new(&["u1", "u2"]);
        let policy = WalkPolicy {
            injections: InjectionMap::from([(
                "u2".to_string(),
                vec![entry("backfill-a"), entry("backfill-b")],
            )]),
            ..WalkPolicy::default()
        };

        let titles = collect_titles(&mut adapter, &policy).await;
        assert_eq!(titles, vec!["u1", "backfill-a", "backfill-b", "u2"]);
    }

    #[tokio::test]
    async fn test_walker_skip_discards_entry_but_still_computes_metadata() {
        let mut adapter = ScriptedAdapter::new(&["u1", "u2", "u3"]);
        let policy = WalkPolicy {
            skips: SkipSet::from(["u2".to_string()]),
            ..WalkPolicy::default()
        };

        let titles = collect_titles(&mut adapter, &policy).await;
        assert_eq!(titles, vec!["u1", "u3"]);
        assert_eq!(
            adapter.metadata_calls,
            vec!["u1", "u2", "u3"],
            "metadata runs even for skipped pages"
        );
    }

    #[tokio::test]
    async fn test_walker_extras_follow_every_regular_entry() {
        let mut adapter = ScriptedAdapter::new(&["u1", "u2"]);
        let policy = WalkPolicy {
            extras: vec![entry("extra")],
            ..WalkPolicy::default()
        };

        let titles = collect_titles(&mut adapter, &policy).await;
        assert_eq!(titles, vec!["u1", "extra", "u2", "extra"]);
    }

    #[tokio::test]
    async fn test_walker_skip_suppresses_extras_but_not_injections() {
        let mut adapter = ScriptedAdapter::new(&["u1", "u2", "u3"]);
        let policy = WalkPolicy {
            injections: InjectionMap::from([("u2".to_string(), vec![entry("backfill")])]),
            skips: SkipSet::from(["u2".to_string()]),
            extras: vec![entry("extra")],
            ..WalkPolicy::default()
        };

        let titles = collect_titles(&mut adapter, &policy).await;
        assert_eq!(
            titles,
            vec!["u1", "extra", "backfill", "u3", "extra"],
            "injection survives the skip, extras do not"
        );
    }

    #[tokio::test]
    async fn test_walker_injected_entries_do_not_trigger_extras() {
        let mut adapter = ScriptedAdapter::new(&["u1"]);
        let policy = WalkPolicy {
            injections: InjectionMap::from([("u1".to_string(), vec![entry("backfill")])]),
            extras: vec![entry("extra")],
            ..WalkPolicy::default()
        };

        let titles = collect_titles(&mut adapter, &policy).await;
        assert_eq!(titles, vec!["backfill", "u1", "extra"]);
    }

    #[tokio::test]
    async fn test_walker_returns_none_repeatedly_after_exhaustion() {
        let mut adapter = ScriptedAdapter::new(&["u1"]);
        let policy = WalkPolicy::default();
        let mut walker = ArchiveWalker::new(&mut adapter, &policy);

        assert!(walker.next_entry().await.unwrap().is_some());
        assert!(walker.next_entry().await.unwrap().is_none());
        assert!(walker.next_entry().await.unwrap().is_none());
    }
}
