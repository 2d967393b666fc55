/*!
Streaming RPC library used by the duplex demo services.

The library:
- Runs any number of concurrent calls over a single [tokio] stream, routing frames by call id;
- Supports unary, server-streaming, client-streaming and bidirectional calls with the same primitives:
  `send`, `recv` and a half-close;
- Bounds every call by a deadline, which aborts pending operations on both sides;
- Dispatches incoming calls through an explicit [server::Router] built at startup.

Frames are BSON documents, call records are any [serde] types.

# Examples

Bidirectional call:
```no_run
use std::time::Duration;

use duplex_rpc::channel::Channel;

async fn chat() -> duplex_rpc::Result<()> {
    let channel = Channel::dial("localhost:50054", "chat").await?;
    let call = channel.open_call("chat.ChatService/Chat", Duration::from_secs(10)).await?;

    let (mut sender, mut receiver) = call.split();
    let reader = tokio::spawn(async move {
        while let Some(reply) = receiver.recv::<String>().await? {
            println!("Reply: {reply}");
        }

        Ok::<_, duplex_rpc::Error>(())
    });

    sender.send(&"Hello!").await?;
    sender.close_send().await?;

    reader.await.expect("reader panicked")
}
```

Serving calls:
```no_run
use async_trait::async_trait;
use duplex_rpc::{
    request::ServerCall,
    server::{Handler, Router, Server},
};

struct Echo;

#[async_trait]
impl Handler for Echo {
    async fn handle(&self, mut call: ServerCall) -> duplex_rpc::Result<()> {
        while let Some(message) = call.recv::<String>().await? {
            call.send(&message).await?;
        }

        Ok(())
    }
}

async fn serve() -> duplex_rpc::Result<()> {
    let router = Router::new().route("echo", Echo)?;
    let listener = Server::listen("0.0.0.0:50054").await?;

    Server::new(router).serve(listener).await
}
```

See `tests/` for more examples.
*/

pub mod call;
mod calls_registry;
pub mod channel;
mod error;
mod message;
mod message_stream;
pub mod request;
pub mod server;
mod writer;

pub use error::*;
pub use message::{RpcData, RpcMessage};
pub use message_stream::{AsyncReadMessage, AsyncWriteMessage, MAX_MESSAGE_SIZE};
