//! Tunnel providers.
//!
//! A provider turns a [`TunnelRequest`] into a public URL pointing at the
//! local dev server. The plugin only needs the URL; keeping the tunnel alive
//! is the provider's job.

mod localtunnel;

pub use localtunnel::{extract_tunnel_url, LocalTunnelCli};

use crate::error::TunnelError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

/// Request for a tunnel to a local port.
///
/// Serializes as a flat object: `{ "port": 9000, "subdomain": "...", ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TunnelRequest {
    /// Local port to expose
    pub port: u16,
    /// Remaining provider options (never contains `port`)
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl TunnelRequest {
    /// Requested subdomain, if any
    pub fn subdomain(&self) -> Option<&str> {
        self.options.get("subdomain").and_then(Value::as_str)
    }
}

/// A tunnel that was successfully opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelHandle {
    provider: String,
    url: String,
}

impl TunnelHandle {
    pub fn new(provider: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            url: url.into(),
        }
    }

    /// Publicly reachable URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Name of the provider that opened the tunnel
    pub fn provider(&self) -> &str {
        &self.provider
    }
}

/// Trait implemented by tunnel providers.
#[async_trait]
pub trait TunnelProvider: Send + Sync {
    /// Human-readable provider name (e.g. "localtunnel").
    fn name(&self) -> &str;

    /// Open a tunnel for `request` and return its public URL.
    async fn open(&self, request: TunnelRequest) -> Result<TunnelHandle, TunnelError>;
}
