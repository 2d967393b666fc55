use futures::{channel::mpsc::UnboundedReceiver, StreamExt};
use serde::{de::DeserializeOwned, Serialize};

use crate::{calls_registry::Inbound, writer::RpcWriter};

/// Server side of an incoming call. Owned by a single handler invocation
pub struct ServerCall {
    /// Call id from the client
    id: i64,
    /// Requested method name
    method: String,
    /// Writer to respond to the call
    writer: RpcWriter,
    /// Client records
    inbound: UnboundedReceiver<Inbound>,
    /// Client has half-closed the call
    input_closed: bool,
}

impl ServerCall {
    pub(crate) fn new(
        id: i64,
        method: String,
        writer: RpcWriter,
        inbound: UnboundedReceiver<Inbound>,
    ) -> Self {
        Self {
            id,
            method,
            writer,
            inbound,
            input_closed: false,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Requested method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Verbose client name
    pub fn peer_name(&self) -> &str {
        self.writer.peer_name()
    }

    /// Receive next client record. `Ok(None)` means the client has half-closed the call
    pub async fn recv<T: DeserializeOwned>(&mut self) -> crate::Result<Option<T>> {
        if self.input_closed {
            return Ok(None);
        }

        match self.inbound.next().await {
            Some(Inbound::Data(data)) => bson::from_bson(data)
                .map(Some)
                .map_err(|e| crate::Error::ResultTypeError(e.to_string())),
            Some(Inbound::End) => {
                self.input_closed = true;
                Ok(None)
            }
            Some(Inbound::Failed(e)) => Err(e),
            None => Err(crate::Error::PeerDisconnected),
        }
    }

    /// Receive the only request of a unary or a server-streaming call
    pub async fn recv_request<T: DeserializeOwned>(&mut self) -> crate::Result<T> {
        self.recv().await?.ok_or_else(|| {
            crate::Error::ProtocolError("Client half-closed the call without a request".into())
        })
    }

    /// Send a record to the client
    pub async fn send<T: Serialize>(&self, data: &T) -> crate::Result<()> {
        self.writer.send_data(self.id, data).await
    }
}

impl std::fmt::Debug for ServerCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCall")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("input_closed", &self.input_closed)
            .finish()
    }
}
