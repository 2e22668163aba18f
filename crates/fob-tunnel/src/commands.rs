//! The `fob-tunnel` command.
//!
//! Loads configuration, applies the tunnel plugin to a [`DevHost`] and feeds
//! it assets from the output directory until Ctrl-C.

use crate::cli::Cli;
use crate::config::TunnelConfig;
use crate::error::{CliError, Result};
use crate::host::DevHost;
use crate::ui;
use crate::watcher::AssetWatcher;
use fob_plugin_tunnel::{AssetEmitted, LocalTunnelPlugin};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Execute the command for the given arguments.
pub async fn execute(args: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = TunnelConfig::load(&args, &cwd)?;

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutting down"),
            Err(err) => warn!(error = %err, "failed to listen for Ctrl-C, shutting down"),
        }
    };
    run_until(config, shutdown).await?;
    Ok(())
}

/// Run a tunnel session until `shutdown` completes.
///
/// Returns the public URL if a tunnel was established. Returns immediately
/// with `None` when no dev server is configured.
pub async fn run_until<F>(config: TunnelConfig, shutdown: F) -> Result<Option<String>>
where
    F: Future<Output = ()>,
{
    let plugin = Arc::new(LocalTunnelPlugin::with_options(
        config.tunnel_options(),
        Arc::new(config.provider()),
    ));

    let mut host = DevHost::new(config.dev_server());
    plugin.apply(&mut host);

    if host.hook_count() == 0 {
        ui::warning(
            "No dev server configured, tunnel disabled. Add a [dev] section to fob.toml or pass --port.",
        );
        return Ok(None);
    }

    let out_dir = config.bundle.output_dir.clone();
    if out_dir.exists() && !out_dir.is_dir() {
        return Err(CliError::NotADirectory(out_dir));
    }
    tokio::fs::create_dir_all(&out_dir).await?;

    let (watcher, rx) = AssetWatcher::new(out_dir, config.debounce())?;
    let existing = AssetWatcher::existing_assets(watcher.root())?;
    ui::info(&format!(
        "Watching {} for emitted assets",
        watcher.root().display()
    ));

    let mut session = tokio::spawn(drive(host, Arc::clone(&plugin), existing, rx));

    tokio::select! {
        _ = &mut session => {
            debug!("asset watcher closed");
        }
        _ = shutdown => {
            session.abort();
        }
    }

    let url = plugin.public_url();
    if let Some(url) = &url {
        info!(url = %url, "tunnel closed");
    }
    Ok(url)
}

/// Emit every asset to the host, announcing the public URL once it is known.
async fn drive(
    host: DevHost,
    plugin: Arc<LocalTunnelPlugin>,
    existing: Vec<AssetEmitted>,
    mut rx: mpsc::Receiver<AssetEmitted>,
) {
    let mut announced = false;

    for asset in existing {
        host.emit_asset(&asset).await;
        announce(&plugin, &mut announced);
    }

    while let Some(asset) = rx.recv().await {
        host.emit_asset(&asset).await;
        announce(&plugin, &mut announced);
    }
}

fn announce(plugin: &LocalTunnelPlugin, announced: &mut bool) {
    if *announced {
        return;
    }
    if let Some(url) = plugin.public_url() {
        ui::success(&format!("Tunnel ready: {}", url));
        *announced = true;
    }
}
