//! Status messages for terminal output.
//!
//! Messages go to stderr so stdout stays free for piping.

use console::style;

/// Enable or disable colored status messages.
///
/// Should be called once in `main`, before any message is printed.
pub fn init_colors(enabled: bool) {
    console::set_colors_enabled_stderr(enabled);
}

/// Print a success message to stderr.
///
/// ```no_run
/// use fob_tunnel::ui::success;
///
/// success("Tunnel ready: https://demo.loca.lt");
/// ```
pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").for_stderr().green().bold(), message);
}

/// Print an info message to stderr.
pub fn info(message: &str) {
    eprintln!("{} {}", style("ℹ").for_stderr().blue().bold(), message);
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        style("⚠").for_stderr().yellow().bold(),
        style(message).for_stderr().yellow()
    );
}
