use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use duplex_rpc::{
    channel::Channel,
    request::ServerCall,
    server::{Handler, Router, Server},
    AsyncReadMessage, AsyncWriteMessage, RpcData, RpcMessage,
};
use tokio::{sync::mpsc, time::Instant};

const SLOW_METHOD: &str = "test.Slow/Slow";
const WAIT_METHOD: &str = "test.Slow/Wait";

/// Sleeps for a second before responding. Reports when it completes
struct Slow {
    completed: Arc<AtomicBool>,
}

#[async_trait]
impl Handler for Slow {
    async fn handle(&self, call: ServerCall) -> duplex_rpc::Result<()> {
        tokio::time::sleep(Duration::from_secs(1)).await;
        self.completed.store(true, Ordering::SeqCst);

        call.send(&1u32).await
    }
}

/// Blocks on the client input. Reports the receive result
struct Wait {
    results: mpsc::UnboundedSender<duplex_rpc::Result<Option<u32>>>,
}

#[async_trait]
impl Handler for Wait {
    async fn handle(&self, mut call: ServerCall) -> duplex_rpc::Result<()> {
        let result = call.recv::<u32>().await;
        let _ = self.results.send(result.clone());

        result.map(|_| ())
    }
}

fn connect(router: Router) -> Channel {
    let (client, server) = tokio::io::duplex(64 * 1024);

    tokio::spawn(Server::serve_connection(
        Arc::new(router),
        server,
        "client".to_owned(),
    ));

    Channel::new(client, "server")
}

#[tokio::test]
async fn test_deadline_exceeded() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let completed = Arc::new(AtomicBool::new(false));
    let router = Router::new()
        .route(
            SLOW_METHOD,
            Slow {
                completed: completed.clone(),
            },
        )
        .unwrap();
    let channel = connect(router);

    let started = Instant::now();
    let response = channel
        .unary::<u32, u32>(SLOW_METHOD, &0, Duration::from_millis(100))
        .await;

    let error = response.unwrap_err();
    assert_eq!(error, duplex_rpc::Error::DeadlineExceeded);
    assert!(error.is_cancellation());
    assert!(started.elapsed() < Duration::from_millis(900));

    // Server dropped the handler instead of letting it finish
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(!completed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_deadline_on_stream_receive() {
    let (results, mut results_rx) = mpsc::unbounded_channel();
    let router = Router::new().route(WAIT_METHOD, Wait { results }).unwrap();
    let channel = connect(router);

    let mut call = channel
        .open_call(WAIT_METHOD, Duration::from_millis(100))
        .await
        .unwrap();

    assert_eq!(
        call.recv::<u32>().await,
        Err(duplex_rpc::Error::DeadlineExceeded)
    );
    // Failed call keeps its status
    assert_eq!(
        call.recv::<u32>().await,
        Err(duplex_rpc::Error::DeadlineExceeded)
    );
    assert_eq!(
        call.send(&1u32).await,
        Err(duplex_rpc::Error::DeadlineExceeded)
    );

    // Handler was aborted while waiting, so it never reports
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(results_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_cancel_on_drop() {
    let completed = Arc::new(AtomicBool::new(false));
    let router = Router::new()
        .route(
            SLOW_METHOD,
            Slow {
                completed: completed.clone(),
            },
        )
        .unwrap();
    let channel = connect(router);

    let call = channel
        .open_call(SLOW_METHOD, Duration::from_secs(10))
        .await
        .unwrap();
    drop(call);

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(!completed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_receive_before_deadline() {
    let (results, mut results_rx) = mpsc::unbounded_channel();
    let router = Router::new().route(WAIT_METHOD, Wait { results }).unwrap();
    let channel = connect(router);

    let mut call = channel
        .open_call(WAIT_METHOD, Duration::from_secs(10))
        .await
        .unwrap();
    call.send(&5u32).await.unwrap();

    assert_eq!(results_rx.recv().await, Some(Ok(Some(5))));
    assert_eq!(call.recv::<u32>().await, Ok(None));
}

#[tokio::test]
async fn test_server_deadline_without_cancel() {
    let (results, mut results_rx) = mpsc::unbounded_channel();
    let router = Router::new().route(WAIT_METHOD, Wait { results }).unwrap();

    // Raw client, which never sends `Cancel`
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    tokio::spawn(Server::serve_connection(
        Arc::new(router),
        server,
        "client".to_owned(),
    ));

    let started = Instant::now();
    client
        .write_message(&RpcMessage::new(
            1,
            RpcData::Open {
                method: WAIT_METHOD.to_owned(),
                timeout_ms: Some(100),
            },
        ))
        .await
        .unwrap();

    let frame: RpcMessage = client.read_message().await.unwrap();
    assert_eq!(
        frame,
        RpcMessage::new(1, RpcData::Close(Err(duplex_rpc::Error::DeadlineExceeded)))
    );
    assert!(started.elapsed() >= Duration::from_millis(100));

    // Handler was dropped while waiting for input
    assert!(results_rx.try_recv().is_err());
}
