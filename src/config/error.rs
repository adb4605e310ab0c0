//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file `{0}` not found")]
    Missing(PathBuf),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("almanac.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("almanac.toml"));

        let validation_err = ConfigError::Validation("[build.per_page] must be positive".to_string());
        let display = format!("{validation_err}");
        assert!(display.contains("per_page"));
    }

    #[test]
    fn test_missing_display() {
        let err = ConfigError::Missing(PathBuf::from("site/almanac.toml"));
        assert_eq!(err.to_string(), "config file `site/almanac.toml` not found");
    }

    #[test]
    fn test_toml_error_converts() {
        let err: ConfigError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
