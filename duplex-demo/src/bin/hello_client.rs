use anyhow::Context;
use duplex_demo::{config, hello};
use duplex_rpc::channel::Channel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    duplex_demo::init_logging();

    let pattern = config::HELLO;
    let channel = Channel::dial(pattern.dial_addr(), pattern.name)
        .await
        .context("Failed to connect to the hello server")?;

    hello::say_hello(&channel, "gRPC", pattern.deadline).await?;

    Ok(())
}
