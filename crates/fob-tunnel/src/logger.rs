//! Logging infrastructure for fob-tunnel.
//!
//! Sets up the global `tracing` subscriber and provides the infrastructure
//! logger handed to plugins.
//!
//! # Example
//!
//! ```rust,no_run
//! use fob_tunnel::logger::init_logger;
//! use tracing::info;
//!
//! init_logger(false, false, false);
//! info!("Watching dist for emitted assets");
//! ```

use fob_plugin_tunnel::InfrastructureLogger;
use std::error::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber with the specified options.
///
/// The logging level is determined in this order:
/// 1. `--verbose` flag: DEBUG for fob crates
/// 2. `--quiet` flag: ERROR only
/// 3. `RUST_LOG` environment variable: Custom filter
/// 4. Default: INFO for fob crates
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("fob=debug,fob_tunnel=debug,fob_plugin_tunnel=debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("fob=info,fob_tunnel=info,fob_plugin_tunnel=info"))
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Check if colored output should be enabled.
///
/// Honors `NO_COLOR` and `FORCE_COLOR`, then falls back to terminal detection.
pub fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::Term::stdout().features().colors_supported()
}

/// Infrastructure logger that forwards plugin messages to `tracing`.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    plugin: String,
}

impl TracingLogger {
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }
}

impl InfrastructureLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "fob::plugin", "[{}] {}", self.plugin, message);
    }

    fn error(&self, message: &str, detail: &(dyn Error + 'static)) {
        tracing::error!(target: "fob::plugin", "[{}] {}: {}", self.plugin, message, detail);
    }
}
