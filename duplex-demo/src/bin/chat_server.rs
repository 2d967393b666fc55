use anyhow::Context;
use duplex_demo::{chat, config};
use duplex_rpc::server::{Router, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    duplex_demo::init_logging();

    let pattern = config::CHAT;
    let router = Router::new().route(chat::METHOD, chat::server::ChatService)?;

    let listener = Server::listen(pattern.listen_addr())
        .await
        .with_context(|| format!("Failed to start {} server", pattern.name))?;

    Server::new(router)
        .serve_with_shutdown(listener, duplex_demo::shutdown_signal())
        .await?;

    Ok(())
}
