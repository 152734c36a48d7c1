//! Comic Archive Mirroring Library
//!
//! This library walks the page history of a web-published comic, fetches
//! each strip's metadata and media, localizes the media its blog posts
//! reference, and maintains a resumable catalog so repeated runs pick up
//! where the last one stopped.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`adapter`] - Site adapters: page chains and per-page metadata
//! - [`blog`] - Blog text localization (embedded and linked media)
//! - [`catalog`] - Catalog records and the persisted catalog document
//! - [`engine`] - The update run: drive loop and durability guarantees
//! - [`fetch`] - Idempotent media downloads with format verification
//! - [`viewer`] - Viewer page and script-embedded catalog regeneration
//! - [`walker`] - Archive traversal with halt/skip/injection policy

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod blog;
pub mod catalog;
pub mod engine;
pub mod fetch;
pub mod viewer;
pub mod walker;

// Re-export commonly used types
pub use adapter::{
    AdapterError, ChainAdapter, ChainOptions, ConfigError, SiteConfig, SourceAdapter,
    SourceError, build_adapter,
};
pub use blog::BlogLocalizer;
pub use catalog::{Catalog, CatalogError, CatalogRecord, CatalogStore};
pub use engine::{ArchiveEngine, RunError, RunSummary};
pub use fetch::{FetchError, MediaFetcher};
pub use viewer::{ViewerError, ViewerGenerator};
pub use walker::{ArchiveWalker, ComicEntry, InjectionMap, SkipSet, WalkPolicy};
