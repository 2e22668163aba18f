//! Reference build host for tunnel plugins.
//!
//! Holds tapped hooks in registration order and runs them for every emitted
//! asset, awaiting each hook before moving on.

use crate::logger::TracingLogger;
use fob_plugin_tunnel::{AssetEmitted, AssetEmittedHook, DevServer, HostContext, InfrastructureLogger};
use std::sync::Arc;
use tracing::trace;

/// Dev session host.
pub struct DevHost {
    dev_server: Option<DevServer>,
    hooks: Vec<(String, AssetEmittedHook)>,
}

impl DevHost {
    /// Create a host. `dev_server` is `None` for non-interactive builds.
    pub fn new(dev_server: Option<DevServer>) -> Self {
        Self {
            dev_server,
            hooks: Vec::new(),
        }
    }

    /// Number of tapped hooks.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Names of tapped hooks, in registration order.
    pub fn hook_names(&self) -> impl Iterator<Item = &str> {
        self.hooks.iter().map(|(name, _)| name.as_str())
    }

    /// Run every tapped hook for `asset`, one after another.
    pub async fn emit_asset(&self, asset: &AssetEmitted) {
        for (name, hook) in &self.hooks {
            trace!(hook = %name, asset = %asset.file, "running assetEmitted hook");
            hook(asset).await;
        }
    }
}

impl HostContext for DevHost {
    fn dev_server(&self) -> Option<DevServer> {
        self.dev_server.clone()
    }

    fn infrastructure_logger(&self, name: &str) -> Arc<dyn InfrastructureLogger> {
        Arc::new(TracingLogger::new(name))
    }

    fn tap_asset_emitted(&mut self, name: &str, hook: AssetEmittedHook) {
        self.hooks.push((name.to_string(), hook));
    }
}
