//! Unary call: one request, one response

use std::time::Duration;

use async_trait::async_trait;
use duplex_rpc::{channel::Channel, request::ServerCall, server::Handler};
use log::info;
use serde::{Deserialize, Serialize};

pub const METHOD: &str = "hello.HelloService/SayHello";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HelloRequest {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HelloResponse {
    pub message: String,
}

pub fn greet(name: &str) -> String {
    format!("Hello, {name}!")
}

pub struct HelloService;

#[async_trait]
impl Handler for HelloService {
    async fn handle(&self, mut call: ServerCall) -> duplex_rpc::Result<()> {
        let request: HelloRequest = call.recv_request().await?;
        info!("Received: {}", request.name);

        call.send(&HelloResponse {
            message: greet(&request.name),
        })
        .await
    }
}

pub async fn say_hello(
    channel: &Channel,
    name: &str,
    deadline: Duration,
) -> duplex_rpc::Result<HelloResponse> {
    let request = HelloRequest {
        name: name.to_owned(),
    };
    info!("Sending request: {}", request.name);

    let response: HelloResponse = channel.unary(METHOD, &request, deadline).await?;
    info!("Received: {}", response.message);

    Ok(response)
}
