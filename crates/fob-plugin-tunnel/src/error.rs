//! Error types for tunnel creation

use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while requesting a public tunnel
#[derive(Error, Debug, Diagnostic)]
pub enum TunnelError {
    /// Failed to spawn the tunnel client process
    #[error("Failed to spawn tunnel client '{program}': {source}")]
    #[diagnostic(
        code(fob::tunnel::spawn_failed),
        help("Install the localtunnel client: npm install -g localtunnel")
    )]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Client process exited before reporting a URL
    #[error("Tunnel client exited with code {exit_code}")]
    #[diagnostic(code(fob::tunnel::client_exited))]
    ClientExited {
        exit_code: i32,
        #[help]
        stderr: String,
    },

    /// Client closed its output without reporting a URL
    #[error("Tunnel client '{program}' did not report a public URL")]
    #[diagnostic(code(fob::tunnel::no_url))]
    NoUrl {
        program: String,
        #[help]
        stderr: String,
    },

    /// Client did not report a URL in time
    #[error("Tunnel client timed out after {timeout:?}")]
    #[diagnostic(
        code(fob::tunnel::timeout),
        help("Check your network connection or increase the tunnel timeout")
    )]
    Timeout { timeout: Duration },

    /// Option value the tunnel client cannot accept
    #[error("Invalid tunnel option '{key}': {reason}")]
    #[diagnostic(
        code(fob::tunnel::invalid_option),
        help("Tunnel options must be strings, numbers or booleans")
    )]
    InvalidOption { key: String, reason: String },
}

impl TunnelError {
    pub fn spawn_failed(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            source,
        }
    }

    pub fn client_exited(exit_code: i32, stderr: String) -> Self {
        Self::ClientExited { exit_code, stderr }
    }

    pub fn no_url(program: impl Into<String>, stderr: String) -> Self {
        Self::NoUrl {
            program: program.into(),
            stderr,
        }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    pub fn invalid_option(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
