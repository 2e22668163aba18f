//! The local tunnel plugin.

use crate::config::TunnelOptions;
use crate::host::{AssetEmitted, HookFuture, HostContext, InfrastructureLogger};
use crate::provider::TunnelProvider;
use crate::state::TunnelState;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

/// Dev-server plugin that opens a public tunnel on the first emitted asset.
///
/// At most one tunnel request is in flight or completed at a time. A failed
/// request puts the plugin back to idle, so the next emitted asset retries.
///
/// # Architecture
///
/// ```text
/// apply() → dev server? → tap assetEmitted
///                              ↓
/// asset emitted → Idle? → Attempting → provider.open() → Established / Idle
/// ```
pub struct LocalTunnelPlugin {
    /// Options merged at construction
    options: Arc<TunnelOptions>,

    /// Shared with the tapped hook
    state: Arc<Mutex<TunnelState>>,

    provider: Arc<dyn TunnelProvider>,
}

impl std::fmt::Debug for LocalTunnelPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTunnelPlugin")
            .field("options", &self.options)
            .field("state", &*self.state.lock())
            .field("provider", &self.provider.name())
            .finish()
    }
}

impl LocalTunnelPlugin {
    /// Name used for the hook tap and the infrastructure logger
    pub const NAME: &'static str = "LocalTunnel";

    /// Create a plugin with default options
    ///
    /// # Example
    ///
    /// ```rust
    /// use fob_plugin_tunnel::{LocalTunnelCli, LocalTunnelPlugin};
    /// use std::sync::Arc;
    ///
    /// let plugin = LocalTunnelPlugin::new(Arc::new(LocalTunnelCli::new()));
    /// assert_eq!(plugin.name(), "LocalTunnel");
    /// ```
    pub fn new(provider: Arc<dyn TunnelProvider>) -> Self {
        Self::with_options(TunnelOptions::default(), provider)
    }

    /// Create a plugin with custom options
    pub fn with_options(options: TunnelOptions, provider: Arc<dyn TunnelProvider>) -> Self {
        Self {
            options: Arc::new(options),
            state: Arc::new(Mutex::new(TunnelState::default())),
            provider,
        }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn options(&self) -> &TunnelOptions {
        &self.options
    }

    /// Snapshot of the tunnel state
    pub fn state(&self) -> TunnelState {
        self.state.lock().clone()
    }

    /// Public URL once the tunnel is up
    pub fn public_url(&self) -> Option<String> {
        self.state.lock().url().map(str::to_string)
    }

    /// Register with `host`.
    ///
    /// Does nothing when the host has no dev server: there is nothing to
    /// tunnel to.
    pub fn apply<H: HostContext + ?Sized>(&self, host: &mut H) {
        let Some(dev_server) = host.dev_server() else {
            debug!(plugin = Self::NAME, "no dev server configured, tunnel disabled");
            return;
        };

        let bootstrap = Arc::new(TunnelBootstrap {
            options: Arc::clone(&self.options),
            state: Arc::clone(&self.state),
            provider: Arc::clone(&self.provider),
            logger: host.infrastructure_logger(Self::NAME),
            port: dev_server.port,
        });

        host.tap_asset_emitted(
            Self::NAME,
            Box::new(move |asset: &AssetEmitted| {
                Arc::clone(&bootstrap).on_asset_emitted(asset)
            }),
        );
    }
}

/// Everything the tapped hook needs, captured at `apply` time.
struct TunnelBootstrap {
    options: Arc<TunnelOptions>,
    state: Arc<Mutex<TunnelState>>,
    provider: Arc<dyn TunnelProvider>,
    logger: Arc<dyn InfrastructureLogger>,
    port: u16,
}

impl TunnelBootstrap {
    /// The state transition happens here, before the returned future is
    /// polled, so back-to-back emissions issue a single request.
    fn on_asset_emitted(self: Arc<Self>, asset: &AssetEmitted) -> HookFuture {
        if !self.state.lock().begin_attempt() {
            trace!(asset = %asset.file, "tunnel already requested");
            return Box::pin(std::future::ready(()));
        }

        debug!(asset = %asset.file, port = self.port, "requesting tunnel");
        let request = self.options.request(self.port);

        Box::pin(async move {
            match self.provider.open(request).await {
                Ok(tunnel) => {
                    self.state.lock().succeed(tunnel.url().to_string());
                    self.logger.info(&format!("tunnel created: {}", tunnel.url()));
                }
                Err(err) => {
                    self.state.lock().fail();
                    self.logger.error("can not create tunnel", &err);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TunnelError;
    use crate::provider::{TunnelHandle, TunnelRequest};
    use async_trait::async_trait;

    struct NeverCalled;

    #[async_trait]
    impl TunnelProvider for NeverCalled {
        fn name(&self) -> &str {
            "never"
        }

        async fn open(&self, _request: TunnelRequest) -> Result<TunnelHandle, TunnelError> {
            unreachable!("provider should not be called")
        }
    }

    #[test]
    fn test_plugin_creation() {
        let plugin = LocalTunnelPlugin::new(Arc::new(NeverCalled));
        assert_eq!(plugin.name(), "LocalTunnel");
        assert!(plugin.state().is_idle());
        assert!(plugin.public_url().is_none());
    }

    #[test]
    fn test_plugin_with_options() {
        let plugin = LocalTunnelPlugin::with_options(
            TunnelOptions::new().with_subdomain("custom"),
            Arc::new(NeverCalled),
        );
        assert_eq!(plugin.options().subdomain(), Some("custom"));
    }

    #[test]
    fn test_debug_shows_provider() {
        let plugin = LocalTunnelPlugin::new(Arc::new(NeverCalled));
        let debug = format!("{:?}", plugin);
        assert!(debug.contains("never"));
        assert!(debug.contains("Idle"));
    }
}
