//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Mirror a web-published comic archive into a local viewer.
///
/// comicmirror walks a comic's page history backward, downloads each strip
/// and the media its blog posts reference, and maintains a resumable catalog
/// under the archive root. Pass the URL of the newest page already cataloged
/// to stop the walk there.
#[derive(Parser, Debug)]
#[command(name = "comicmirror")]
#[command(author, version, about)]
pub struct Args {
    /// Archive root directory (holds comics/ and resource/)
    pub root: PathBuf,

    /// Page URL already present in the catalog; traversal stops there
    pub halt_url: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_root_only_parses_successfully() {
        let args = Args::try_parse_from(["comicmirror", "/archives/comic"]).unwrap();
        assert_eq!(args.root, PathBuf::from("/archives/comic"));
        assert!(args.halt_url.is_none());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_halt_url_is_second_positional() {
        let args = Args::try_parse_from([
            "comicmirror",
            "/archives/comic",
            "http://example.com/p100",
        ])
        .unwrap();
        assert_eq!(args.halt_url.as_deref(), Some("http://example.com/p100"));
    }

    #[test]
    fn test_cli_missing_root_is_rejected() {
        let result = Args::try_parse_from(["comicmirror"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["comicmirror", "/a", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["comicmirror", "/a", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["comicmirror", "/a", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["comicmirror", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["comicmirror", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_unknown_flag_is_rejected() {
        let result = Args::try_parse_from(["comicmirror", "/a", "--concurrency", "4"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
