use anyhow::Context;
use duplex_demo::{
    chat::{self, client},
    config,
};
use duplex_rpc::channel::Channel;
use log::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    duplex_demo::init_logging();

    let pattern = config::CHAT;
    let channel = Channel::dial(pattern.dial_addr(), pattern.name)
        .await
        .context("Failed to connect to the chat server")?;

    let transcript = client::chat(
        &channel,
        &chat::DEFAULT_MESSAGES,
        pattern.pacing,
        pattern.deadline,
    )
    .await?;
    info!("Chat completed, {} replies received", transcript.len());

    Ok(())
}
