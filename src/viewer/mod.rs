//! Viewer regeneration.
//!
//! After a successful update the archive gets a browsable face: a
//! script-embedded copy of the catalog (`comicdb.js`), a `view.html` page
//! rendered from a `$key` template over the archive's metadata file, and the
//! static viewer assets copied in next to the catalog.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::catalog::Catalog;
use crate::engine::RESOURCE_DIR;

/// Static assets copied into the resource directory on every run.
const STATIC_ASSETS: [&str; 2] = ["comiclib.js", "loading.gif"];

/// The viewer template filename, read from the assets directory.
const TEMPLATE_FILE: &str = "template.txt";

/// The archive metadata filename under the resource directory.
const INFO_FILE: &str = "info.txt";

/// Matches `$$`, `$name`, and `${name}` in the viewer template.
#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:(\$)|\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("placeholder pattern is statically valid")
});

/// Errors from viewer generation.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// A viewer file could not be read, written, or copied.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The template names parameters the metadata file does not define.
    #[error("template references undefined parameters: {missing}")]
    MissingParameters {
        /// Comma-separated missing parameter names.
        missing: String,
    },

    /// The catalog could not be serialized for embedding.
    #[error("catalog serialization failed: {source}")]
    Serialize {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

fn io_error(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> ViewerError {
    let path = path.into();
    move |source| ViewerError::Io { path, source }
}

/// Generates viewer artifacts for one archive root.
pub struct ViewerGenerator {
    root: PathBuf,
    /// Directory holding the template and static assets.
    assets_dir: PathBuf,
}

impl ViewerGenerator {
    /// Generator for `root`, reading the template and assets from
    /// `assets_dir`.
    pub fn new(root: impl Into<PathBuf>, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            assets_dir: assets_dir.into(),
        }
    }

    /// Writes `comicdb.js`, renders `view.html`, and copies the static
    /// assets.
    ///
    /// # Errors
    ///
    /// Any IO failure, an unparseable catalog, or a template referencing
    /// undefined parameters.
    pub async fn generate(&self, catalog: &Catalog) -> Result<(), ViewerError> {
        self.write_comic_db(catalog).await?;
        self.render_view_page().await?;
        self.copy_static_assets().await?;
        info!(root = %self.root.display(), "viewer regenerated");
        Ok(())
    }

    /// Writes the script-embedded catalog copy the viewer page loads.
    async fn write_comic_db(&self, catalog: &Catalog) -> Result<(), ViewerError> {
        let json = serde_json::to_string(catalog.records())
            .map_err(|source| ViewerError::Serialize { source })?;
        let path = self.root.join(RESOURCE_DIR).join("comicdb.js");
        tokio::fs::write(&path, format!("var comicDB = {json};"))
            .await
            .map_err(io_error(path))
    }

    async fn render_view_page(&self) -> Result<(), ViewerError> {
        let template_path = self.assets_dir.join(TEMPLATE_FILE);
        let template = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(io_error(template_path))?;

        let parameters = self.page_parameters().await?;
        let page = substitute(&template, &parameters)?;

        let out_path = self.root.join("view.html");
        tokio::fs::write(&out_path, page)
            .await
            .map_err(io_error(out_path))
    }

    async fn copy_static_assets(&self) -> Result<(), ViewerError> {
        for asset in STATIC_ASSETS {
            let from = self.assets_dir.join(asset);
            let to = self.root.join(RESOURCE_DIR).join(asset);
            tokio::fs::copy(&from, &to).await.map_err(io_error(from))?;
        }
        Ok(())
    }

    /// Template parameters: the archive's `info.txt` plus the generation
    /// timestamp and an empty `bonus` placeholder.
    async fn page_parameters(&self) -> Result<HashMap<String, String>, ViewerError> {
        let path = self.root.join(RESOURCE_DIR).join(INFO_FILE);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(io_error(path))?;

        let mut parameters = parse_info(&text);
        parameters.insert(
            "timestamp".to_string(),
            Utc::now().format("%B %d, %Y %H:%M:%S UTC").to_string(),
        );
        parameters.entry("bonus".to_string()).or_default();
        Ok(parameters)
    }
}

/// Parses `key: value` lines. Blank lines and lines without a colon are
/// skipped; the first colon splits key from value.
fn parse_info(text: &str) -> HashMap<String, String> {
    let mut parameters = HashMap::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some((field, value)) = line.split_once(':') {
            parameters.insert(field.trim().to_string(), value.trim().to_string());
        }
    }
    parameters
}

/// Substitutes `$name` / `${name}` placeholders; `$$` escapes a literal
/// dollar. Placeholders with no defined parameter are collected and reported
/// together.
fn substitute(
    template: &str,
    parameters: &HashMap<String, String>,
) -> Result<String, ViewerError> {
    let mut missing: Vec<&str> = PLACEHOLDER
        .captures_iter(template)
        .filter_map(|captures| {
            let name = captures.get(2).or_else(|| captures.get(3))?.as_str();
            (!parameters.contains_key(name)).then_some(name)
        })
        .collect();
    missing.sort_unstable();
    missing.dedup();
    if !missing.is_empty() {
        return Err(ViewerError::MissingParameters {
            missing: missing.join(", "),
        });
    }

    let rendered = PLACEHOLDER.replace_all(template, |captures: &regex::Captures<'_>| {
        if captures.get(1).is_some() {
            return "$".to_string();
        }
        captures
            .get(2)
            .or_else(|| captures.get(3))
            .and_then(|name| parameters.get(name.as_str()))
            .cloned()
            .unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRecord;
    use tempfile::TempDir;

    #[test]
    fn test_parse_info_splits_on_first_colon() {
        let parameters = parse_info("title: My Comic\nhomepage: http://example.com/home\n");
        assert_eq!(parameters.get("title").unwrap(), "My Comic");
        assert_eq!(
            parameters.get("homepage").unwrap(),
            "http://example.com/home"
        );
    }

    #[test]
    fn test_parse_info_skips_blank_and_malformed_lines() {
        let parameters = parse_info("\n\ntitle: ok\nno colon here\n");
        assert_eq!(parameters.len(), 1);
    }

    #[test]
    fn test_substitute_replaces_both_placeholder_forms() {
        let mut parameters = HashMap::new();
        parameters.insert("title".to_string(), "My Comic".to_string());
        let result = substitute("<h1>$title</h1><p>${title}</p>", &parameters).unwrap();
        assert_eq!(result, "<h1>My Comic</h1><p>My Comic</p>");
    }

    #[test]
    fn test_substitute_dollar_dollar_escapes() {
        let parameters = HashMap::new();
        let result = substitute("costs $$5", &parameters).unwrap();
        assert_eq!(result, "costs $5");
    }

    #[test]
    fn test_substitute_missing_parameter_is_reported_by_name() {
        let parameters = HashMap::new();
        let result = substitute("$title and $author", &parameters);
        match result {
            Err(ViewerError::MissingParameters { missing }) => {
                assert_eq!(missing, "author, title");
            }
            other => panic!("expected MissingParameters, got: {other:?}"),
        }
    }

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

    fn archive_with_assets() -> (TempDir, TempDir) {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join(RESOURCE_DIR)).unwrap();
        std::fs::write(
            root.path().join(RESOURCE_DIR).join(INFO_FILE),
            "title: My Comic\n",
        )
        .unwrap();

        let assets = TempDir::new().unwrap();
        std::fs::write(
            assets.path().join(TEMPLATE_FILE),
            "<html><title>$title</title>updated $timestamp$bonus</html>",
        )
        .unwrap();
        std::fs::write(assets.path().join("comiclib.js"), "// viewer code\n").unwrap();
        std::fs::write(assets.path().join("loading.gif"), b"GIF89a").unwrap();
        (root, assets)
    }

    #[tokio::test]
    async fn test_generate_writes_all_artifacts() {
        let (root, assets) = archive_with_assets();
        let generator = ViewerGenerator::new(root.path(), assets.path());

        let catalog = Catalog::from_records(vec![record("one")]);
        generator.generate(&catalog).await.unwrap();

        let db = std::fs::read_to_string(root.path().join("resource/comicdb.js")).unwrap();
        assert!(db.starts_with("var comicDB = ["), "embedded catalog: {db}");
        assert!(db.ends_with("];"));
        assert!(db.contains("\"one.png\""));

        let page = std::fs::read_to_string(root.path().join("view.html")).unwrap();
        assert!(page.contains("<title>My Comic</title>"), "rendered: {page}");
        assert!(!page.contains("$timestamp"), "timestamp substituted: {page}");

        assert!(root.path().join("resource/comiclib.js").exists());
        assert!(root.path().join("resource/loading.gif").exists());
    }

    #[tokio::test]
    async fn test_generate_fails_cleanly_on_undefined_template_parameter() {
        let (root, assets) = archive_with_assets();
        std::fs::write(
            assets.path().join(TEMPLATE_FILE),
            "<html>$no_such_key</html>",
        )
        .unwrap();
        let generator = ViewerGenerator::new(root.path(), assets.path());

        let result = generator.generate(&Catalog::new()).await;
        assert!(matches!(
            result,
            Err(ViewerError::MissingParameters { .. })
        ));
    }
}
