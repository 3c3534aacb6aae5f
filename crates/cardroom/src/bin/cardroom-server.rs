//! Cardroom room server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin cardroom-server
//! cargo run --bin cardroom-server -- --bind 0.0.0.0:8765 \
//!     --collaborator-url http://content:8080
//! ```

use std::time::Duration;

use cardroom::{CardroomServer, DEFAULT_BIND_ADDR, ServerConfig, setup_logger};
use cardroom_collaborator::{CollaboratorConfig, DEFAULT_BASE_URL};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cardroom-server")]
#[command(
    about = "Real-time room synchronization server for party games",
    long_about = None
)]
struct Args {
    /// Address to bind the WebSocket listener to
    #[arg(
        short = 'b',
        long,
        env = "CARDROOM_BIND",
        default_value = DEFAULT_BIND_ADDR
    )]
    bind: String,

    /// Base URL of the persistence and prompt service
    #[arg(
        short = 'c',
        long,
        env = "CARDROOM_COLLABORATOR_URL",
        default_value = DEFAULT_BASE_URL
    )]
    collaborator_url: String,

    /// Timeout in seconds for each collaborator call
    #[arg(long, env = "CARDROOM_COLLABORATOR_TIMEOUT_SECS", default_value_t = 5)]
    collaborator_timeout_secs: u64,

    /// Seconds a new socket may take to send its WebSocket upgrade
    #[arg(long, env = "CARDROOM_HANDSHAKE_TIMEOUT_SECS", default_value_t = 10)]
    handshake_timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            collaborator: CollaboratorConfig::new(self.collaborator_url)
                .with_timeout(Duration::from_secs(
                    self.collaborator_timeout_secs,
                )),
        }
    }
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = Args::parse().into_config();
    tracing::info!(?config, "starting");

    let server = match CardroomServer::builder().config(config).build().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
