use anyhow::Context;
use duplex_demo::{config, numbers};
use duplex_rpc::server::{Router, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    duplex_demo::init_logging();

    let pattern = config::NUMBERS;
    let router = Router::new().route(
        numbers::METHOD,
        numbers::NumberService {
            pacing: pattern.pacing,
        },
    )?;

    let listener = Server::listen(pattern.listen_addr())
        .await
        .with_context(|| format!("Failed to start {} server", pattern.name))?;

    Server::new(router)
        .serve_with_shutdown(listener, duplex_demo::shutdown_signal())
        .await?;

    Ok(())
}
