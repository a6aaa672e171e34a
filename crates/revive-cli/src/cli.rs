//! # CLI Structure and Argument Parsing
//!
//! The command-line interface for `revive`, built with `clap` derive macros.
//!
//! ```bash
//! # List the pages a site's sitemap advertises
//! revive sitemap example.com
//!
//! # Check that a post can be extracted
//! revive fetch https://example.com/blog/old-post --format json
//!
//! # Audit and rewrite a batch of posts
//! revive run --domain example.com --urls-file posts.txt --output-dir rewritten
//! ```
//!
//! Global options (`--verbose`, `--quiet`, `--debug`, `--no-color`,
//! `--config`) apply to every command.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Main CLI structure for the `revive` command
#[derive(Parser, Clone, Debug)]
#[command(name = "revive")]
#[command(version)]
#[command(about = "revive - audit and rewrite old blog posts", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Path to configuration file (overrides autodiscovery). Also via `REVIVE_CONFIG`.
    #[arg(long, global = true, value_name = "FILE", env = "REVIVE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands for the `revive` CLI
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Discover a site's pages through robots.txt and its sitemap
    Sitemap {
        /// Domain or site URL (e.g. `example.com`)
        domain: String,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Fetch one post and show what was extracted
    Fetch {
        /// Post URL
        url: String,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Audit and rewrite a batch of posts
    Run(RunArgs),
}

impl Commands {
    /// Output format selected for this command.
    pub const fn format(&self) -> OutputFormat {
        match self {
            Self::Sitemap { format, .. } | Self::Fetch { format, .. } => *format,
            Self::Run(args) => args.format,
        }
    }
}

/// Arguments for `revive run`
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Site the posts belong to, used for sitemap discovery and internal links
    #[arg(short = 'd', long, env = "REVIVE_DOMAIN")]
    pub domain: Option<String>,

    /// Post URLs to revive
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// File with one post URL per line (blank lines are ignored)
    #[arg(long, value_name = "FILE")]
    pub urls_file: Option<PathBuf>,

    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Directory for rewritten markdown (defaults to `paths.output_dir`)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_run_arguments() {
        let cli = Cli::try_parse_from([
            "revive",
            "--quiet",
            "run",
            "--domain",
            "example.com",
            "https://example.com/a",
            "https://example.com/b",
            "--urls-file",
            "posts.txt",
            "-o",
            "out",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(cli.quiet);
        assert_eq!(cli.command.format(), OutputFormat::Json);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.domain.as_deref(), Some("example.com"));
        assert_eq!(args.urls.len(), 2);
        assert_eq!(args.urls_file, Some(PathBuf::from("posts.txt")));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_sitemap_defaults_to_text() {
        let cli = Cli::try_parse_from(["revive", "sitemap", "example.com"]).unwrap();
        assert_eq!(cli.command.format(), OutputFormat::Text);
    }
}
