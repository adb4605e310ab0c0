//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// almanac static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Content root path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Config file name (default: almanac.toml)
    #[arg(short = 'C', long, default_value = "almanac.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for the Build command
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Clean output directory completely before building
    #[arg(long)]
    pub clean: bool,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Override base URL for the site.
    ///
    /// Useful for CI/CD deployments where the production URL differs from local development.
    ///
    /// Example:
    ///   almanac build --base-url "https://staging.coffee.example"
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Render with an alternate layout wherever the default layout would be used.
    ///
    /// Example: `almanac build --layout-variant retro` swaps `default.html` for `retro.html`.
    #[arg(long = "layout-variant", value_name = "NAME")]
    pub layout_variant: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the site: pages, archives, feeds and sitemap
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}
