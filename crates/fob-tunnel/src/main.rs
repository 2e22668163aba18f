//! fob-tunnel binary entry point.
//!
//! Parses arguments, initializes logging and colors, then runs the tunnel
//! session.

use clap::Parser;
use fob_tunnel::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let colors = !args.no_color && logger::should_use_colors();
    logger::init_logger(args.verbose, args.quiet, !colors);
    ui::init_colors(colors);

    commands::execute(args)
        .await
        .map_err(error::cli_error_to_miette)
}
