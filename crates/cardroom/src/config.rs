//! Server configuration.

use std::time::Duration;

use cardroom_collaborator::CollaboratorConfig;
use cardroom_transport::DEFAULT_HANDSHAKE_TIMEOUT;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "localhost:8765";

/// Everything needed to start a [`CardroomServer`](crate::CardroomServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// How long a new socket may take to send its WebSocket upgrade.
    pub handshake_timeout: Duration,
    pub collaborator: CollaboratorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            collaborator: CollaboratorConfig::default(),
        }
    }
}
