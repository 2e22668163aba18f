//! Command-line interface definition for fob-tunnel.

use clap::Parser;
use std::path::PathBuf;

/// fob-tunnel - Share a running dev server through a public URL
#[derive(Parser, Debug)]
#[command(
    name = "fob-tunnel",
    version,
    about = "Share a running dev server through a public URL",
    long_about = "Watches the bundler's output directory and, on the first emitted asset,\n\
                  opens a localtunnel to the dev server port and prints the public URL.\n\
                  A failed tunnel is retried on the next emitted asset."
)]
pub struct Cli {
    /// Path to the config file (defaults to ./fob.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dev server port to expose
    ///
    /// Overrides `[dev] port` and enables tunnelling even when the config
    /// has no `[dev]` section.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Requested tunnel subdomain
    #[arg(short, long)]
    pub subdomain: Option<String>,

    /// Output directory to watch for emitted assets
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Command used to run the localtunnel client (e.g. "npx --yes localtunnel")
    #[arg(long)]
    pub command: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
