//! Tunnel lifecycle state for a single plugin instance.

/// Where the plugin is in establishing its tunnel.
///
/// ```text
/// Idle ──request──▶ Attempting ──ok──▶ Established
///   ▲                   │
///   └──────error────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TunnelState {
    /// No tunnel and no request in flight
    #[default]
    Idle,
    /// A tunnel request has been issued and has not resolved yet
    Attempting,
    /// The tunnel is up
    Established { url: String },
}

impl TunnelState {
    /// Check if no tunnel has been requested (or the last request failed).
    pub fn is_idle(&self) -> bool {
        matches!(self, TunnelState::Idle)
    }

    /// Check if a request is in flight.
    pub fn is_attempting(&self) -> bool {
        matches!(self, TunnelState::Attempting)
    }

    /// Check if the tunnel is up.
    pub fn is_established(&self) -> bool {
        matches!(self, TunnelState::Established { .. })
    }

    /// Public URL of the established tunnel.
    pub fn url(&self) -> Option<&str> {
        match self {
            TunnelState::Established { url } => Some(url),
            _ => None,
        }
    }

    /// Move `Idle -> Attempting`.
    ///
    /// Returns `false` and leaves the state untouched when a request is
    /// already in flight or the tunnel is up.
    pub(crate) fn begin_attempt(&mut self) -> bool {
        match self {
            TunnelState::Idle => {
                *self = TunnelState::Attempting;
                true
            }
            TunnelState::Attempting | TunnelState::Established { .. } => false,
        }
    }

    /// Move `Attempting -> Established`.
    pub(crate) fn succeed(&mut self, url: String) {
        debug_assert!(self.is_attempting(), "tunnel resolved without an attempt");
        *self = TunnelState::Established { url };
    }

    /// Move `Attempting -> Idle` so the next emission can retry.
    pub(crate) fn fail(&mut self) {
        debug_assert!(self.is_attempting(), "tunnel failed without an attempt");
        *self = TunnelState::Idle;
    }
}
