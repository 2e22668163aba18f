//! Error types for the fob-tunnel CLI.
//!
//! Tunnel failures are not errors here: the plugin logs them and keeps
//! watching. Only problems that prevent the host from running at all
//! surface as a [`CliError`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (file not found, invalid syntax, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Output directory path exists but is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Explicitly requested config file doesn't exist
    #[error("Config file not found: {}\n\nHint: Create a fob.toml file or pass an existing path to --config", .0.display())]
    NotFound(PathBuf),

    /// Config sources could not be merged or deserialized
    #[error("Invalid configuration: {0}\n\nHint: Check fob.toml syntax and FOB_TUNNEL_* environment variables")]
    Invalid(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Invalid(Box::new(err))
    }
}

/// Convert CliError to a miette report for display by `main`.
pub fn cli_error_to_miette(err: CliError) -> miette::Report {
    match err {
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        _ => miette::miette!("{}", err),
    }
}
