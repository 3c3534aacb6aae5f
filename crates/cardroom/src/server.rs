//! `CardroomServer` builder and accept loop.
//!
//! This is the entry point for running a room server. It ties together
//! all the layers: transport → protocol → engine → collaborator.

use std::sync::Arc;
use std::time::Duration;

use cardroom_collaborator::{Collaborator, HttpCollaborator};
use cardroom_transport::{Transport, WebSocketConnection, WebSocketTransport};

use crate::handler::handle_incoming;
use crate::{CardroomError, ServerConfig, SyncEngine};

/// Builder for configuring and starting a Cardroom server.
///
/// # Example
///
/// ```rust,no_run
/// use cardroom::prelude::*;
///
/// # async fn run() -> Result<(), CardroomError> {
/// let server = CardroomServer::builder()
///     .bind("0.0.0.0:8765")
///     .collaborator_url("http://content-service:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CardroomServerBuilder {
    config: ServerConfig,
}

impl CardroomServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the collaborator service base URL.
    pub fn collaborator_url(mut self, url: &str) -> Self {
        self.config.collaborator.base_url = url.to_string();
        self
    }

    /// Sets how long a new socket may take to complete the upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Sets the timeout for every collaborator call.
    pub fn collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.config.collaborator.timeout = timeout;
        self
    }

    /// Binds the listener and builds an HTTP collaborator from the config.
    pub async fn build(
        self,
    ) -> Result<CardroomServer<HttpCollaborator>, CardroomError> {
        let collaborator = HttpCollaborator::new(self.config.collaborator.clone())?;
        self.build_with(collaborator).await
    }

    /// Binds the listener and uses the given collaborator.
    pub async fn build_with<P: Collaborator>(
        self,
        collaborator: P,
    ) -> Result<CardroomServer<P>, CardroomError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr)
            .await?
            .with_handshake_timeout(self.config.handshake_timeout);
        Ok(CardroomServer {
            transport,
            engine: Arc::new(SyncEngine::new(collaborator)),
        })
    }
}

/// A bound Cardroom server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct CardroomServer<P: Collaborator> {
    transport: WebSocketTransport,
    engine: Arc<SyncEngine<WebSocketConnection, P>>,
}

impl CardroomServer<HttpCollaborator> {
    /// Creates a new builder.
    pub fn builder() -> CardroomServerBuilder {
        CardroomServerBuilder::new()
    }
}

impl<P: Collaborator> CardroomServer<P> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The engine shared by every connection task.
    pub fn engine(&self) -> &Arc<SyncEngine<WebSocketConnection, P>> {
        &self.engine
    }

    /// Runs the accept loop, one task per connection.
    ///
    /// The loop only takes sockets off the listener; each upgrade runs in
    /// the connection's own task. Accept failures are logged and the loop
    /// continues. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), CardroomError> {
        if let Ok(addr) = self.transport.local_addr() {
            tracing::info!(%addr, "cardroom server listening");
        }

        loop {
            match self.transport.accept().await {
                Ok(incoming) => {
                    tracing::debug!(peer = %incoming.peer_addr(), "accepted");
                    let engine = Arc::clone(&self.engine);
                    tokio::spawn(handle_incoming(incoming, engine));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
