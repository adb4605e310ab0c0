//! almanac - a static site generator for date-named markdown blogs.

mod build;
mod cli;
mod config;
mod content;
mod error;
mod generator;
mod index;
mod logger;
mod template;
mod utils;

use anyhow::{Result, bail};
use build::build_site;
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands};
use config::{ConfigError, SiteConfig};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Build { .. } => {
            let report = build_site(&config, Utc::now().naive_utc())?;
            if !report.is_success() {
                bail!("build finished with {} failures", report.failures);
            }
            Ok(())
        }
    }
}

/// Load and validate configuration from CLI arguments.
///
/// A missing config file aborts the build.
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    if !config_path.is_file() {
        bail!(ConfigError::Missing(config_path));
    }
    let mut config = SiteConfig::from_path(&config_path)?;
    config.update_with_cli(cli);
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn cli(root: &Path) -> Cli {
        Cli::try_parse_from(["almanac", "--root", root.to_str().unwrap(), "build"]).unwrap()
    }

    #[test]
    fn test_missing_config_aborts() {
        let dir = TempDir::new().unwrap();
        let err = load_config(&cli(dir.path())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Missing(path)) if path.ends_with("almanac.toml")
        ));
    }

    #[test]
    fn test_config_file_loaded() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("almanac.toml"), "[base]\ntitle = \"Coffee\"\n").unwrap();

        let config = load_config(&cli(dir.path())).unwrap();
        assert_eq!(config.base.title, "Coffee");
    }
}
