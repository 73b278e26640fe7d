//! Command-line interface definitions for specup

use clap::Parser;
use std::path::PathBuf;

/// CLI structure for the specup application
#[derive(Parser, Debug)]
#[command(name = "specup")]
#[command(version)]
#[command(about = "Compile markdown specifications into standalone HTML pages", long_about = None)]
pub struct Cli {
    /// Document set configuration (.json or .toml)
    #[arg(short, long, value_name = "FILE", default_value = "specs.json")]
    pub config: PathBuf,

    /// Render every document once and exit instead of watching for changes
    #[arg(long, alias = "nowatch")]
    pub no_watch: bool,

    /// Link individual asset files instead of inlining the compiled bundle
    #[arg(long)]
    pub dev: bool,

    /// Directory containing the `assets/` folder
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Render raw HTML in markdown as text
    #[arg(long)]
    pub no_html: bool,

    /// Leave bare URLs as plain text
    #[arg(long)]
    pub no_linkify: bool,

    /// Disable smart quotes and dashes
    #[arg(long)]
    pub no_typographer: bool,

    /// Debounce window for file change events, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = specup::watch::DEFAULT_DEBOUNCE_MS)]
    pub debounce_ms: u64,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["specup"]);

        assert_eq!(cli.config, PathBuf::from("specs.json"));
        assert!(!cli.no_watch);
        assert!(!cli.dev);
        assert_eq!(cli.debounce_ms, specup::watch::DEFAULT_DEBOUNCE_MS);
    }

    #[test]
    fn test_nowatch_alias() {
        let cli = Cli::parse_from(["specup", "--nowatch", "-c", "docs/specs.toml"]);

        assert!(cli.no_watch);
        assert_eq!(cli.config, PathBuf::from("docs/specs.toml"));
    }
}
