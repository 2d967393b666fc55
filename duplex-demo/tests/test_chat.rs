use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use duplex_demo::chat::{
    self, client,
    server::{transition, ChatEvent, ChatService, ChatState},
    ChatRequest, ChatResponse, CLIENT_USER, SERVER_USER,
};
use duplex_rpc::{
    channel::Channel,
    request::ServerCall,
    server::{Handler, Router, Server},
};

const DEADLINE: Duration = Duration::from_secs(5);

/// Fails the call after the first client line
struct BrokenChat;

#[async_trait]
impl Handler for BrokenChat {
    async fn handle(&self, mut call: ServerCall) -> duplex_rpc::Result<()> {
        let _: Option<ChatRequest> = call.recv().await?;

        Err(duplex_rpc::Error::HandlerError("chat is closed".into()))
    }
}

fn connect() -> Channel {
    serve(Router::new().route(chat::METHOD, ChatService).unwrap())
}

fn serve(router: Router) -> Channel {
    let (client, server) = tokio::io::duplex(64 * 1024);

    tokio::spawn(Server::serve_connection(
        Arc::new(router),
        server,
        "client".to_owned(),
    ));

    Channel::new(client, "chat")
}

#[tokio::test]
async fn test_chat() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let channel = connect();

    let transcript = client::chat(
        &channel,
        &chat::DEFAULT_MESSAGES,
        Duration::from_millis(10),
        DEADLINE,
    )
    .await
    .unwrap();

    let mut expected: Vec<ChatResponse> = chat::DEFAULT_MESSAGES
        .iter()
        .map(|message| ChatResponse::echo(message))
        .collect();
    expected.push(ChatResponse::farewell());

    assert_eq!(transcript, expected);
    assert_eq!(transcript[0].message, "Echo: Hello!");
}

#[tokio::test]
async fn test_chat_without_messages() {
    let channel = connect();

    let transcript = client::chat(&channel, &[], Duration::ZERO, DEADLINE)
        .await
        .unwrap();
    assert_eq!(transcript, vec![ChatResponse::farewell()]);
}

#[tokio::test]
async fn test_echo_before_half_close() {
    let channel = connect();
    let mut call = channel.open_call(chat::METHOD, DEADLINE).await.unwrap();

    // Replies arrive while the input is still open
    for message in ["one", "two"] {
        call.send(&ChatRequest::new(CLIENT_USER, message))
            .await
            .unwrap();

        let reply: ChatResponse = call.recv().await.unwrap().unwrap();
        assert_eq!(reply, ChatResponse::echo(message));
    }

    call.close_send().await.unwrap();

    let farewell: ChatResponse = call.recv().await.unwrap().unwrap();
    assert!(farewell.is_farewell());
    assert_eq!(call.recv::<ChatResponse>().await.unwrap(), None);
}

#[tokio::test]
async fn test_chat_deadline() {
    let channel = connect();

    let result = client::chat(
        &channel,
        &chat::DEFAULT_MESSAGES,
        Duration::from_millis(200),
        Duration::from_millis(300),
    )
    .await;
    assert_eq!(result, Err(duplex_rpc::Error::DeadlineExceeded));
}

#[tokio::test]
async fn test_receiver_failure() {
    let channel = serve(Router::new().route(chat::METHOD, BrokenChat).unwrap());

    // Sends succeed, the receiver gets the server error instead of the farewell
    let result = client::chat(&channel, &chat::DEFAULT_MESSAGES, Duration::ZERO, DEADLINE).await;
    assert_eq!(
        result,
        Err(duplex_rpc::Error::HandlerError("chat is closed".into()))
    );
}

#[test]
fn test_transition() {
    let on_message = transition(ChatEvent::Message(ChatRequest::new(CLIENT_USER, "Hi")));
    assert_eq!(on_message.state, ChatState::AwaitingInput);
    assert_eq!(on_message.reply, Some(ChatResponse::echo("Hi")));

    let on_end = transition(ChatEvent::EndOfStream);
    assert_eq!(on_end.state, ChatState::Closed);
    assert_eq!(on_end.reply, Some(ChatResponse::farewell()));

    let on_error = transition(ChatEvent::Error(duplex_rpc::Error::PeerDisconnected));
    assert_eq!(
        on_error.state,
        ChatState::Failed(duplex_rpc::Error::PeerDisconnected)
    );
    assert_eq!(on_error.reply, None);
}

#[test]
fn test_responses() {
    let echo = ChatResponse::echo("Hello!");
    assert_eq!(echo.user, SERVER_USER);
    assert_eq!(echo.message, "Echo: Hello!");
    assert!(!echo.is_farewell());

    assert!(ChatResponse::farewell().is_farewell());
}
