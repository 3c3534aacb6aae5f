//! Tracing setup for the server binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Without `RUST_LOG`, every `cardroom*` target and the binary itself log
/// at `default_log_level`.
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "cardroom={},{}={}",
                    default_log_level,
                    binary_name.replace('-', "_"),
                    default_log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
