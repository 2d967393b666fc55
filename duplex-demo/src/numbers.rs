//! Server-streaming call: the client asks for a range, the server sends it
//! back one number at a time

use std::time::Duration;

use async_trait::async_trait;
use duplex_rpc::{channel::Channel, request::ServerCall, server::Handler};
use log::info;
use serde::{Deserialize, Serialize};

pub const METHOD: &str = "numbers.NumberService/GetNumbers";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct NumberRequest {
    pub start: i32,
    pub end: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct NumberResponse {
    pub number: i32,
}

/// Responses for `start..=end` in ascending order. Empty if `start > end`
pub fn number_sequence(request: &NumberRequest) -> impl Iterator<Item = NumberResponse> {
    (request.start..=request.end).map(|number| NumberResponse { number })
}

pub struct NumberService {
    /// Delay after each sent number
    pub pacing: Duration,
}

#[async_trait]
impl Handler for NumberService {
    async fn handle(&self, mut call: ServerCall) -> duplex_rpc::Result<()> {
        let request: NumberRequest = call.recv_request().await?;
        info!(
            "Received request: start={}, end={}",
            request.start, request.end
        );

        for response in number_sequence(&request) {
            call.send(&response).await?;
            info!("Sent: {}", response.number);

            tokio::time::sleep(self.pacing).await;
        }

        Ok(())
    }
}

/// Request a range and collect all streamed numbers
pub async fn get_numbers(
    channel: &Channel,
    request: NumberRequest,
    deadline: Duration,
) -> duplex_rpc::Result<Vec<i32>> {
    info!(
        "Requesting numbers from {} to {}",
        request.start, request.end
    );

    let mut call = channel.open_call(METHOD, deadline).await?;
    call.send(&request).await?;
    call.close_send().await?;

    let mut numbers = Vec::new();
    while let Some(response) = call.recv::<NumberResponse>().await? {
        info!("Received: {}", response.number);
        numbers.push(response.number);
    }

    info!("Stream completed");
    Ok(numbers)
}
