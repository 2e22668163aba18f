//! Fob dev-server plugin that exposes the local server through a public tunnel
//!
//! The plugin taps the host's asset-emission hook. On the first emitted asset
//! of a dev session it asks a [`TunnelProvider`] for a public URL pointing at
//! the dev server's port and logs it. Later emissions are no-ops while a
//! request is in flight or once the tunnel is up; a failed request is logged
//! and the next emission tries again. Tunnel failures never fail the build.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fob_plugin_tunnel::{LocalTunnelCli, LocalTunnelPlugin, TunnelOptions};
//! use std::sync::Arc;
//!
//! let options = TunnelOptions::new().with_subdomain("my-app");
//! let plugin = LocalTunnelPlugin::with_options(options, Arc::new(LocalTunnelCli::new()));
//! // plugin.apply(&mut host);
//! ```

mod config;
mod error;
mod host;
mod plugin;
mod provider;
mod state;

pub use config::{TunnelOptions, DEFAULT_SUBDOMAIN};
pub use error::TunnelError;
pub use host::{
    AssetEmitted, AssetEmittedHook, DevServer, HookFuture, HostContext, InfrastructureLogger,
};
pub use plugin::LocalTunnelPlugin;
pub use provider::{
    extract_tunnel_url, LocalTunnelCli, TunnelHandle, TunnelProvider, TunnelRequest,
};
pub use state::TunnelState;
