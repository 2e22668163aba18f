//! Tunnel options for the local tunnel plugin.
//!
//! Options are a free-form key/value map handed to the tunnel provider as-is.
//! The only built-in default is the requested subdomain; everything else is
//! caller-supplied and validated by the provider when a tunnel is requested.

use crate::provider::TunnelRequest;
use serde::Serialize;
use serde_json::{Map, Value};

/// Subdomain requested when the caller does not supply one.
pub const DEFAULT_SUBDOMAIN: &str = "miro-plugin-boilerplate";

/// Key reserved for the local port. Always taken from the dev server.
const PORT_KEY: &str = "port";

/// Options passed to the tunnel provider.
///
/// Built by shallow-merging caller overrides on top of
/// `{ subdomain: DEFAULT_SUBDOMAIN }`. Caller values win on key conflict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TunnelOptions {
    values: Map<String, Value>,
}

impl Default for TunnelOptions {
    fn default() -> Self {
        let mut values = Map::new();
        values.insert(
            "subdomain".to_string(),
            Value::String(DEFAULT_SUBDOMAIN.to_string()),
        );
        Self { values }
    }
}

impl TunnelOptions {
    /// Create options containing only the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge caller overrides on top of the defaults
    ///
    /// # Example
    ///
    /// ```rust
    /// use fob_plugin_tunnel::TunnelOptions;
    /// use serde_json::{json, Map};
    ///
    /// let mut overrides = Map::new();
    /// overrides.insert("subdomain".into(), json!("my-app"));
    /// overrides.insert("host".into(), json!("https://tunnel.example.com"));
    ///
    /// let options = TunnelOptions::with_overrides(overrides);
    /// assert_eq!(options.subdomain(), Some("my-app"));
    /// ```
    pub fn with_overrides(overrides: Map<String, Value>) -> Self {
        let mut options = Self::default();
        options.values.extend(overrides);
        options
    }

    /// Set the requested subdomain
    pub fn with_subdomain(self, subdomain: impl Into<String>) -> Self {
        self.with_option("subdomain", Value::String(subdomain.into()))
    }

    /// Set an arbitrary provider option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Requested subdomain, if it is a string
    pub fn subdomain(&self) -> Option<&str> {
        self.values.get("subdomain").and_then(Value::as_str)
    }

    /// Look up a single option
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Iterate over all options
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Build the provider request for a dev server listening on `port`.
    ///
    /// A `port` present in the options is discarded: the dev server's port is
    /// authoritative.
    pub fn request(&self, port: u16) -> TunnelRequest {
        let mut options = self.values.clone();
        options.remove(PORT_KEY);
        TunnelRequest { port, options }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_subdomain() {
        let options = TunnelOptions::new();
        assert_eq!(options.subdomain(), Some(DEFAULT_SUBDOMAIN));
        assert_eq!(options.iter().count(), 1);
    }

    #[test]
    fn test_overrides_win_over_defaults() {
        let mut overrides = Map::new();
        overrides.insert("subdomain".into(), json!("other"));
        overrides.insert("local_host".into(), json!("127.0.0.1"));

        let options = TunnelOptions::with_overrides(overrides);
        assert_eq!(options.subdomain(), Some("other"));
        assert_eq!(options.get("local_host"), Some(&json!("127.0.0.1")));
    }

    #[test]
    fn test_empty_overrides_keep_defaults() {
        let options = TunnelOptions::with_overrides(Map::new());
        assert_eq!(options, TunnelOptions::default());
    }

    #[test]
    fn test_request_uses_dev_server_port() {
        let options = TunnelOptions::new().with_option("port", 1234);
        let request = options.request(9000);

        assert_eq!(request.port, 9000);
        assert!(request.options.get("port").is_none());
        assert_eq!(request.subdomain(), Some(DEFAULT_SUBDOMAIN));
    }

    #[test]
    fn test_request_serializes_flat() {
        let request = TunnelOptions::new().with_subdomain("demo").request(3000);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({ "port": 3000, "subdomain": "demo" }));
    }
}
