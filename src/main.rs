//! CLI entry point for the comicmirror tool.

use anyhow::{Context, Result};
use clap::Parser;
use comicmirror_core::{
    ArchiveEngine, CatalogStore, MediaFetcher, SiteConfig, ViewerGenerator, build_adapter,
};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!(root = %args.root.display(), "comicmirror starting");

    let fetcher = MediaFetcher::new();
    let engine = ArchiveEngine::new(&args.root, fetcher.clone());

    let config = SiteConfig::load(&engine.resource_dir())
        .context("cannot load the archive's site configuration")?;
    let mut adapter = build_adapter(&config, &fetcher, &engine.media_dir())
        .context("cannot build the configured site adapter")?;
    let policy = config.walk_policy(args.halt_url.as_deref());

    // The engine persists the catalog on every exit path, so even a failed
    // run leaves the archive resumable.
    let summary = engine
        .run(adapter.as_mut(), &policy, &config.extra_dirs)
        .await?;

    info!(
        appended = summary.appended,
        total = summary.total,
        "comic update complete, generating viewer"
    );

    let catalog = CatalogStore::new(&engine.resource_dir())
        .load()
        .await
        .context("cannot reload the catalog for viewer generation")?;
    let assets_dir = std::env::current_dir().context("cannot determine assets directory")?;
    ViewerGenerator::new(&args.root, assets_dir)
        .generate(&catalog)
        .await
        .context("viewer generation failed")?;

    Ok(())
}
