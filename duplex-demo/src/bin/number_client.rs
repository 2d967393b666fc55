use anyhow::Context;
use duplex_demo::{
    config,
    numbers::{self, NumberRequest},
};
use duplex_rpc::channel::Channel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    duplex_demo::init_logging();

    let pattern = config::NUMBERS;
    let channel = Channel::dial(pattern.dial_addr(), pattern.name)
        .await
        .context("Failed to connect to the numbers server")?;

    numbers::get_numbers(
        &channel,
        NumberRequest { start: 1, end: 5 },
        pattern.deadline,
    )
    .await?;

    Ok(())
}
