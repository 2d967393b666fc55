use async_trait::async_trait;
use duplex_machine::{Control, Machine};
use duplex_rpc::{request::ServerCall, server::Handler};
use log::{debug, info};

use super::{ChatRequest, ChatResponse};

/// Server call state
#[derive(Debug, Clone, PartialEq)]
pub enum ChatState {
    /// Waiting for the next client line
    AwaitingInput,
    /// Farewell sent, the call is finished
    Closed,
    /// Receive failed, the call is aborted
    Failed(duplex_rpc::Error),
}

/// Outcome of a single receive
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Message(ChatRequest),
    EndOfStream,
    Error(duplex_rpc::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ChatState,
    /// Record to send before entering `state`
    pub reply: Option<ChatResponse>,
}

/// Server transition function. Every line gets exactly one echo, end of input gets the farewell
pub fn transition(event: ChatEvent) -> Transition {
    match event {
        ChatEvent::Message(request) => Transition {
            state: ChatState::AwaitingInput,
            reply: Some(ChatResponse::echo(&request.message)),
        },
        ChatEvent::EndOfStream => Transition {
            state: ChatState::Closed,
            reply: Some(ChatResponse::farewell()),
        },
        ChatEvent::Error(e) => Transition {
            state: ChatState::Failed(e),
            reply: None,
        },
    }
}

struct ChatSession {
    call: ServerCall,
}

async fn chat_step(mut session: ChatSession) -> Control<ChatSession, duplex_rpc::Result<()>> {
    let event = match session.call.recv::<ChatRequest>().await {
        Ok(Some(request)) => {
            info!("Received from {}: {}", request.user, request.message);
            ChatEvent::Message(request)
        }
        Ok(None) => {
            info!("Client has completed sending messages");
            ChatEvent::EndOfStream
        }
        Err(e) => ChatEvent::Error(e),
    };

    let Transition { state, reply } = transition(event);

    if let Some(reply) = reply {
        if let Err(e) = session.call.send(&reply).await {
            return Control::Return(Err(e));
        }

        info!("Sent to client: {}", reply.message);
    }

    match state {
        ChatState::AwaitingInput => Control::Loop(session),
        ChatState::Closed => Control::Return(Ok(())),
        ChatState::Failed(e) => {
            debug!("Chat receive failed: {e}");
            Control::Return(Err(e))
        }
    }
}

pub struct ChatService;

#[async_trait]
impl Handler for ChatService {
    async fn handle(&self, call: ServerCall) -> duplex_rpc::Result<()> {
        info!("Chat started with {}", call.peer_name());

        Machine::init(ChatSession { call }).then(chat_step).await
    }
}
