use std::time::Duration;

use duplex_rpc::{
    call::{CallReceiver, CallSender},
    channel::Channel,
};
use log::info;

use super::{ChatRequest, ChatResponse, CLIENT_USER, METHOD};
use crate::latch::{latch, LatchSetter};

/// Run a chat call. Sends `messages` with `pacing` in between, while a separate
/// task receives the replies. Returns once the server has finished the call.
/// Returned transcript holds every received reply in order
pub async fn chat(
    channel: &Channel,
    messages: &[&str],
    pacing: Duration,
    deadline: Duration,
) -> duplex_rpc::Result<Vec<ChatResponse>> {
    let call = channel.open_call(METHOD, deadline).await?;
    let (mut sender, receiver) = call.split();

    let (setter, done) = latch();
    let receiving = tokio::spawn(receive_replies(receiver, setter));

    info!("Starting chat...");
    if let Err(e) = send_messages(&mut sender, messages, pacing).await {
        receiving.abort();
        return Err(e);
    }

    // Wait for the farewell, not only for our own sends
    if !done.wait().await {
        info!("Chat receiver stopped before the server finished the call");
    }

    receiving.await.map_err(|e| {
        duplex_rpc::Error::InternalError(format!("Chat receiver task failed: {e}"))
    })?
}

async fn send_messages(
    sender: &mut CallSender,
    messages: &[&str],
    pacing: Duration,
) -> duplex_rpc::Result<()> {
    for message in messages {
        sender.send(&ChatRequest::new(CLIENT_USER, message)).await?;
        info!("Sent: {message}");

        tokio::time::sleep(pacing).await;
    }

    sender.close_send().await
}

async fn receive_replies(
    mut receiver: CallReceiver,
    done: LatchSetter,
) -> duplex_rpc::Result<Vec<ChatResponse>> {
    let mut transcript = Vec::new();

    while let Some(response) = receiver.recv::<ChatResponse>().await? {
        info!("Received from {}: {}", response.user, response.message);
        transcript.push(response);
    }

    info!("Server has completed sending messages");
    done.set();

    Ok(transcript)
}
