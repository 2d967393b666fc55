use std::{sync::Arc, time::Duration};

use duplex_demo::hello::{self, HelloRequest, HelloResponse, HelloService};
use duplex_rpc::{
    channel::Channel,
    server::{Router, Server},
};

const DEADLINE: Duration = Duration::from_secs(1);

fn connect() -> Channel {
    let router = Router::new().route(hello::METHOD, HelloService).unwrap();
    let (client, server) = tokio::io::duplex(64 * 1024);

    tokio::spawn(Server::serve_connection(
        Arc::new(router),
        server,
        "client".to_owned(),
    ));

    Channel::new(client, "hello")
}

#[tokio::test]
async fn test_say_hello() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let channel = connect();

    let response = hello::say_hello(&channel, "gRPC", DEADLINE).await.unwrap();
    assert_eq!(response.message, "Hello, gRPC!");
}

#[tokio::test]
async fn test_empty_name() {
    let channel = connect();

    let response: HelloResponse = channel
        .unary(
            hello::METHOD,
            &HelloRequest {
                name: String::new(),
            },
            DEADLINE,
        )
        .await
        .unwrap();
    assert_eq!(response.message, "Hello, !");
}

#[tokio::test]
async fn test_wrong_method() {
    let channel = connect();

    let result = channel
        .unary::<_, HelloResponse>(
            "hello.HelloService/SayGoodbye",
            &HelloRequest {
                name: "gRPC".into(),
            },
            DEADLINE,
        )
        .await;
    assert!(matches!(result, Err(duplex_rpc::Error::NoEndpoint(_))));
}

#[test]
fn test_greet() {
    assert_eq!(hello::greet("world"), "Hello, world!");
}
