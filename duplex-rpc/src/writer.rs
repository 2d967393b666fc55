use std::sync::Arc;

use futures::lock::Mutex;
use log::{debug, trace};
use serde::Serialize;
use tokio::io::AsyncWrite;

use crate::{
    message::{RpcData, RpcMessage},
    message_stream::AsyncWriteMessage,
};

type Socket = Box<dyn AsyncWrite + Send + Unpin>;

/// A shared writing half of a connection. Frames of all calls go through it
#[derive(Clone)]
pub(crate) struct RpcWriter {
    /// Writer part of the socket
    socket: Arc<Mutex<Socket>>,
    /// Verbose peer name
    peer_name: Arc<str>,
}

impl RpcWriter {
    pub fn new<W: AsyncWrite + Send + Unpin + 'static>(socket: W, peer_name: &str) -> Self {
        Self {
            socket: Arc::new(Mutex::new(Box::new(socket))),
            peer_name: peer_name.into(),
        }
    }

    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }

    pub async fn open(&self, id: i64, method: &str, timeout_ms: Option<i64>) -> crate::Result<()> {
        debug!("Opening call {id} to `{method}` at {}", self.peer_name);

        self.write(&RpcMessage::new(
            id,
            RpcData::Open {
                method: method.to_owned(),
                timeout_ms,
            },
        ))
        .await
    }

    /// Send a call record
    /// Immediately returns an `Error` if `P` doesn't serialize into Bson, or the peer has disconnected
    pub async fn send_data<P: Serialize>(&self, id: i64, data: &P) -> crate::Result<()> {
        let data = bson::to_bson(data).map_err(|e| crate::Error::ParamsTypeError(e.to_string()))?;

        debug!("Call {id} record to {}: {data:?}", self.peer_name);

        self.write(&RpcMessage::new(id, RpcData::Data(data))).await
    }

    pub async fn half_close(&self, id: i64) -> crate::Result<()> {
        debug!("Half-closing call {id} to {}", self.peer_name);

        self.write(&RpcMessage::new(id, RpcData::HalfClose)).await
    }

    pub async fn close(&self, id: i64, status: crate::Result<()>) -> crate::Result<()> {
        debug!("Closing call {id} to {} with {status:?}", self.peer_name);

        self.write(&RpcMessage::new(id, RpcData::Close(status)))
            .await
    }

    /// Notify the peer the call is abandoned. Doesn't wait for the frame to be written
    pub fn spawn_cancel(&self, id: i64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime to cancel call {id}");
            return;
        };

        let writer = self.clone();
        runtime.spawn(async move {
            debug!("Cancelling call {id} to {}", writer.peer_name);

            if let Err(e) = writer.write(&RpcMessage::new(id, RpcData::Cancel)).await {
                debug!("Failed to cancel call {id}: {e}");
            }
        });
    }

    async fn write(&self, message: &RpcMessage) -> crate::Result<()> {
        trace!("Writing a frame for call {}", message.id);

        self.socket.lock().await.write_message(message).await
    }
}
