//! Contract between the plugin and the build host that runs it.
//!
//! A host owns the build lifecycle. It tells the plugin whether a dev server
//! is configured, hands out loggers, and invokes tapped hooks whenever it
//! writes an output asset.

use std::error::Error;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by a hook. Hosts await it before their own
/// post-emission work.
pub type HookFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback invoked once per emitted asset.
///
/// The synchronous part of the call runs when the host invokes the hook,
/// before the returned future is polled.
pub type AssetEmittedHook = Box<dyn Fn(&AssetEmitted) -> HookFuture + Send + Sync>;

/// An output asset written by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEmitted {
    /// File name relative to the output directory (e.g. `index.js`)
    pub file: String,
    /// Absolute path of the written file
    pub path: PathBuf,
}

impl AssetEmitted {
    pub fn new(file: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            path: path.into(),
        }
    }
}

/// Dev server settings the host exposes to plugins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevServer {
    /// Interface the dev server binds to
    pub host: String,
    /// Local port the dev server listens on
    pub port: u16,
}

impl DevServer {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Logger handed out by the host, scoped to one plugin name.
pub trait InfrastructureLogger: Send + Sync {
    fn info(&self, message: &str);

    fn error(&self, message: &str, detail: &(dyn Error + 'static));
}

/// Build host a plugin is applied to.
pub trait HostContext {
    /// Dev server configuration, or `None` for non-interactive builds.
    fn dev_server(&self) -> Option<DevServer>;

    /// Logger scoped to the plugin called `name`.
    fn infrastructure_logger(&self, name: &str) -> Arc<dyn InfrastructureLogger>;

    /// Register `hook` to run on every asset emission.
    fn tap_asset_emitted(&mut self, name: &str, hook: AssetEmittedHook);
}
