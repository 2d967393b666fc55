//! Bidirectional call. The client sends chat lines with a delay in between while a
//! separate task receives the replies. The server echoes every line as soon as it
//! arrives and says goodbye once the client half-closes the call.

use serde::{Deserialize, Serialize};

pub mod client;
pub mod server;

pub const METHOD: &str = "chat.ChatService/Chat";

pub const CLIENT_USER: &str = "Client";
pub const SERVER_USER: &str = "Server";
pub const FAREWELL: &str = "Goodbye!";

/// Lines the demo client sends
pub const DEFAULT_MESSAGES: [&str; 4] = [
    "Hello!",
    "How are you?",
    "I'm learning gRPC!",
    "Bidirectional streaming is cool!",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub user: String,
    pub message: String,
}

impl ChatRequest {
    pub fn new(user: &str, message: &str) -> Self {
        Self {
            user: user.to_owned(),
            message: message.to_owned(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub user: String,
    pub message: String,
}

impl ChatResponse {
    /// Server reply to a client line
    pub fn echo(message: &str) -> Self {
        Self {
            user: SERVER_USER.to_owned(),
            message: format!("Echo: {message}"),
        }
    }

    /// Last server message of a call
    pub fn farewell() -> Self {
        Self {
            user: SERVER_USER.to_owned(),
            message: FAREWELL.to_owned(),
        }
    }

    pub fn is_farewell(&self) -> bool {
        self.user == SERVER_USER && self.message == FAREWELL
    }
}
