//! Configuration loading for fob-tunnel.
//!
//! Reads the `[dev]`, `[bundle]` and `[tunnel]` sections of `fob.toml`.
//! Priority: CLI args > environment variables (`FOB_TUNNEL_*`) > config file > defaults.
//!
//! ```toml
//! [bundle]
//! output_dir = "dist"
//!
//! [dev]
//! port = 9000
//!
//! [tunnel]
//! command = ["npx", "--yes", "localtunnel"]
//! timeout_secs = 30
//!
//! [tunnel.options]
//! subdomain = "my-app"
//! ```

use crate::cli::Cli;
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use fob_plugin_tunnel::{DevServer, LocalTunnelCli, TunnelOptions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "fob.toml";

/// Complete fob-tunnel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TunnelConfig {
    #[serde(default)]
    pub bundle: BundleSection,

    /// Dev server settings. `None` means there is nothing to tunnel to.
    #[serde(default)]
    pub dev: Option<DevSection>,

    #[serde(default)]
    pub tunnel: TunnelSection,
}

/// Where the bundler writes its output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleSection {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for BundleSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for DevSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelSection {
    /// Command used to run the localtunnel client
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    /// Seconds to wait for the client to report its URL
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Debounce window for repeated writes to the same asset
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Options passed through to the tunnel client
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl Default for TunnelSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            timeout_secs: default_timeout_secs(),
            debounce_ms: default_debounce_ms(),
            options: Map::new(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    9000
}

fn default_command() -> Vec<String> {
    vec!["lt".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_debounce_ms() -> u64 {
    100
}

impl TunnelConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// Relative paths are resolved against `cwd`.
    pub fn load(args: &Cli, cwd: &Path) -> Result<Self> {
        let mut figment = Figment::new();

        let config_file = match &args.config {
            Some(path) => {
                let path = cwd.join(path);
                if !path.exists() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => {
                let default_path = cwd.join(DEFAULT_CONFIG_FILE);
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        // FOB_TUNNEL_DEV__PORT, FOB_TUNNEL_TUNNEL__TIMEOUT_SECS, ...
        figment = figment.merge(Env::prefixed("FOB_TUNNEL_").split("__"));

        // CLI args override everything
        if let Some(port) = args.port {
            figment = figment.merge(Serialized::default("dev.port", port));
        }
        if let Some(subdomain) = &args.subdomain {
            figment = figment.merge(Serialized::default("tunnel.options.subdomain", subdomain));
        }
        if let Some(out_dir) = &args.out_dir {
            figment = figment.merge(Serialized::default("bundle.output_dir", out_dir));
        }
        if let Some(command) = &args.command {
            let command: Vec<&str> = command.split_whitespace().collect();
            figment = figment.merge(Serialized::default("tunnel.command", command));
        }

        let mut config: TunnelConfig = figment.extract().map_err(ConfigError::from)?;
        if config.bundle.output_dir.is_relative() {
            config.bundle.output_dir = cwd.join(&config.bundle.output_dir);
        }
        Ok(config)
    }

    /// Dev server the plugin should tunnel to, if configured.
    pub fn dev_server(&self) -> Option<DevServer> {
        self.dev
            .as_ref()
            .map(|dev| DevServer::new(dev.host.clone(), dev.port))
    }

    /// Plugin options: defaults merged with `[tunnel.options]`.
    pub fn tunnel_options(&self) -> TunnelOptions {
        TunnelOptions::with_overrides(self.tunnel.options.clone())
    }

    /// Provider running the configured localtunnel command.
    pub fn provider(&self) -> LocalTunnelCli {
        let provider = match self.tunnel.command.split_first() {
            Some((program, args)) => LocalTunnelCli::with_command(program.clone(), args.to_vec()),
            None => LocalTunnelCli::new(),
        };
        provider.with_timeout(Duration::from_secs(self.tunnel.timeout_secs))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.tunnel.debounce_ms)
    }
}
