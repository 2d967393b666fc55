/*!
Demo services for the four call patterns of [duplex_rpc]:
- [hello]: unary;
- [numbers]: server streaming;
- [average]: client streaming;
- [chat]: bidirectional streaming.

Every pattern has a server and a client binary under `src/bin`. Ports and timing are in [config].
*/

use log::{warn, LevelFilter};

pub mod average;
pub mod chat;
pub mod config;
pub mod hello;
pub mod latch;
pub mod numbers;

/// Init binary logging. `RUST_LOG` overrides the default `info` level
pub fn init_logging() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");

        // Serve until killed
        std::future::pending::<()>().await
    }
}
