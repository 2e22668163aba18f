//! fob-tunnel - Share a running fob dev server through a public URL.
//!
//! This crate is the reference host for [`fob_plugin_tunnel`]: it reads the
//! `[dev]`, `[bundle]` and `[tunnel]` sections of `fob.toml`, applies
//! [`LocalTunnelPlugin`](fob_plugin_tunnel::LocalTunnelPlugin) to a
//! [`DevHost`](host::DevHost) and turns files written to the output
//! directory into asset-emitted events.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line arguments
//! - [`config`] - Layered configuration (file, environment, flags)
//! - [`host`] - Host context the plugin registers with
//! - [`watcher`] - Output directory watcher
//! - [`logger`] - Structured logging with tracing
//! - [`ui`] - Status messages
//!
//! # Example
//!
//! ```rust,no_run
//! use fob_tunnel::{cli::Cli, commands, error::Result, logger};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let args = Cli::parse();
//!     logger::init_logger(args.verbose, args.quiet, args.no_color);
//!     commands::execute(args).await
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod logger;
pub mod ui;
pub mod watcher;

pub use error::{CliError, ConfigError, Result};
