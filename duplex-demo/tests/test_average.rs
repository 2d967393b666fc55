use std::{sync::Arc, time::Duration};

use duplex_demo::average::{self, Accumulator, AverageResponse, AverageService, NumberMessage};
use duplex_rpc::{
    channel::Channel,
    server::{Router, Server},
    AsyncReadMessage, AsyncWriteMessage, RpcData, RpcMessage,
};

const DEADLINE: Duration = Duration::from_secs(5);

fn connect() -> Channel {
    let router = Router::new()
        .route(average::METHOD, AverageService)
        .unwrap();
    let (client, server) = tokio::io::duplex(64 * 1024);

    tokio::spawn(Server::serve_connection(
        Arc::new(router),
        server,
        "client".to_owned(),
    ));

    Channel::new(client, "average")
}

#[tokio::test]
async fn test_calculate_average() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let channel = connect();

    let average = average::calculate_average(
        &channel,
        &[10, 20, 30, 40, 50],
        Duration::from_millis(10),
        DEADLINE,
    )
    .await
    .unwrap();
    assert_eq!(format!("{average:.2}"), "30.00");
}

#[tokio::test]
async fn test_fractional_average() {
    let channel = connect();

    let average = average::calculate_average(&channel, &[1, 2], Duration::ZERO, DEADLINE)
        .await
        .unwrap();
    assert_eq!(average, 1.5);
}

#[tokio::test]
async fn test_empty_input() {
    let channel = connect();

    let average = average::calculate_average(&channel, &[], Duration::ZERO, DEADLINE)
        .await
        .unwrap();
    assert_eq!(average, 0.0);
}

#[tokio::test]
async fn test_no_overflow() {
    let channel = connect();

    let average =
        average::calculate_average(&channel, &[i32::MAX, i32::MAX], Duration::ZERO, DEADLINE)
            .await
            .unwrap();
    assert_eq!(average, f64::from(i32::MAX));
}

#[tokio::test]
async fn test_response_after_half_close() {
    let channel = connect();
    let mut call = channel.open_call(average::METHOD, DEADLINE).await.unwrap();

    call.send(&NumberMessage { number: 4 }).await.unwrap();
    call.send(&NumberMessage { number: 8 }).await.unwrap();

    // Nothing is sent back until the input is closed
    let early =
        tokio::time::timeout(Duration::from_millis(100), call.recv::<AverageResponse>()).await;
    assert!(early.is_err());

    let response: AverageResponse = call.finish().await.unwrap();
    assert_eq!(response.average, 6.0);
}

#[tokio::test]
async fn test_broken_input() {
    let channel = connect();
    let mut call = channel.open_call(average::METHOD, DEADLINE).await.unwrap();

    call.send(&NumberMessage { number: 4 }).await.unwrap();
    call.send(&"four").await.unwrap();

    // Call fails without an average
    assert!(matches!(
        call.recv::<AverageResponse>().await,
        Err(duplex_rpc::Error::ResultTypeError(_))
    ));
    assert!(matches!(
        call.recv::<AverageResponse>().await,
        Err(duplex_rpc::Error::ResultTypeError(_))
    ));
}

#[tokio::test]
async fn test_cancel_mid_stream() {
    let router = Router::new()
        .route(average::METHOD, AverageService)
        .unwrap();
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    tokio::spawn(Server::serve_connection(
        Arc::new(router),
        server,
        "client".to_owned(),
    ));

    let frames = [
        RpcData::Open {
            method: average::METHOD.to_owned(),
            timeout_ms: Some(5000),
        },
        RpcData::Data(bson::to_bson(&NumberMessage { number: 4 }).unwrap()),
        RpcData::Cancel,
    ];
    for data in frames {
        client.write_message(&RpcMessage::new(1, data)).await.unwrap();
    }

    // The only frame back is the call status
    let frame: RpcMessage = client.read_message().await.unwrap();
    assert_eq!(
        frame,
        RpcMessage::new(1, RpcData::Close(Err(duplex_rpc::Error::Cancelled)))
    );
}

#[test]
fn test_accumulator() {
    let accumulator: Accumulator = [10, 20, 30, 40, 50].into_iter().collect();
    assert_eq!(accumulator.sum(), 150);
    assert_eq!(accumulator.count(), 5);
    assert_eq!(accumulator.average(), 30.0);

    let empty = Accumulator::default();
    assert_eq!(empty.count(), 0);
    assert_eq!(empty.average(), 0.0);
}
