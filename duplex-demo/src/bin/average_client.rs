use anyhow::Context;
use duplex_demo::{average, config};
use duplex_rpc::channel::Channel;

const NUMBERS: [i32; 5] = [10, 20, 30, 40, 50];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    duplex_demo::init_logging();

    let pattern = config::AVERAGE;
    let channel = Channel::dial(pattern.dial_addr(), pattern.name)
        .await
        .context("Failed to connect to the average server")?;

    average::calculate_average(&channel, &NUMBERS, pattern.pacing, pattern.deadline).await?;

    Ok(())
}
