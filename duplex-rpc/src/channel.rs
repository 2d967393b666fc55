use std::{fmt::Display, sync::Arc, time::Duration};

use futures::lock::Mutex;
use log::{debug, info, trace, warn};
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpStream, ToSocketAddrs},
    task::JoinHandle,
    time::Instant,
};

use crate::{
    call::Call,
    calls_registry::{CallsRegistry, Inbound},
    message::{RpcData, RpcMessage},
    message_stream::AsyncReadMessage,
    writer::RpcWriter,
};

/// Deadline used when `now + timeout` doesn't fit into [Instant]
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// Client connection to a server. Any number of calls can be open at the same time.
/// Incoming frames are read by a background task and routed to the calls
pub struct Channel {
    /// Socker writer handle shared with the calls
    writer: RpcWriter,
    /// Call registry to route incoming frames
    calls_registry: Arc<Mutex<CallsRegistry>>,
    /// Background reader
    reader: JoinHandle<()>,
}

impl Channel {
    /// Connect to a server at `addr`. `peer_name` is used for logging
    pub async fn dial<A: ToSocketAddrs + Display>(addr: A, peer_name: &str) -> crate::Result<Self> {
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| crate::Error::ConnectionError(format!("{addr}: {e}")))?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to disable Nagle's algorithm: {e}");
        }

        info!("Connected to {peer_name} at {addr}");

        Ok(Self::new(stream, peer_name))
    }

    /// Make a new channel from a connected stream. Must be called within a Tokio runtime
    pub fn new<S>(stream: S, peer_name: &str) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        trace!("Making new channel from a stream");

        let (reader, writer) = tokio::io::split(stream);
        let calls_registry = Arc::new(Mutex::new(CallsRegistry::new()));

        let reader = tokio::spawn(Self::poll(
            reader,
            calls_registry.clone(),
            peer_name.to_owned(),
        ));

        Self {
            writer: RpcWriter::new(writer, peer_name),
            calls_registry,
            reader,
        }
    }

    /// Verbose peer name
    pub fn peer_name(&self) -> &str {
        self.writer.peer_name()
    }

    /// `false` once the server has disconnected
    pub fn is_connected(&self) -> bool {
        !self.reader.is_finished()
    }

    /// Open a new call to the `method`. All call operations fail with
    /// [crate::Error::DeadlineExceeded] after `timeout`
    pub async fn open_call(&self, method: &str, timeout: Duration) -> crate::Result<Call> {
        let now = Instant::now();
        let deadline = now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE);
        let timeout_ms = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);

        let (id, inbound) = self.calls_registry.lock().await.add_call();

        debug!("New {id} call to `{method}` with {timeout_ms}ms deadline");

        // In case we failed to send, forget the call immediately
        if let Err(e) = self.writer.open(id, method, Some(timeout_ms)).await {
            debug!("Error opening a call: {e:?}");

            self.calls_registry.lock().await.remove(id);
            return Err(e);
        }

        Ok(Call::new(id, method, self.writer.clone(), inbound, deadline))
    }

    /// Make a unary call: send a single request and wait for a single response
    pub async fn unary<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        request: &P,
        timeout: Duration,
    ) -> crate::Result<R> {
        let mut call = self.open_call(method, timeout).await?;

        call.send(request).await?;
        call.finish().await
    }

    /// Read incoming frames and route them to the calls
    async fn poll<R: AsyncRead + Unpin>(
        mut socket: R,
        calls_registry: Arc<Mutex<CallsRegistry>>,
        peer_name: String,
    ) {
        loop {
            let message: RpcMessage = match socket.read_message().await {
                Ok(message) => message,
                Err(e) => {
                    info!("Failed to read incoming message from {peer_name}. Server disconnected?: {e}");
                    break;
                }
            };

            debug!("Incoming message from {peer_name}: {message:?}");

            let RpcMessage { id, data } = message;
            match data {
                RpcData::Data(body) => calls_registry
                    .lock()
                    .await
                    .resolve(id, Inbound::Data(body)),
                RpcData::Close(status) => {
                    let inbound = match status {
                        Ok(()) => Inbound::End,
                        Err(e) => Inbound::Failed(e),
                    };

                    let mut registry = calls_registry.lock().await;
                    registry.resolve(id, inbound);
                    registry.remove(id);
                }
                data => warn!("Unexpected frame from {peer_name} for the call {id}: {data:?}"),
            }
        }

        calls_registry
            .lock()
            .await
            .clear_pending_calls(crate::Error::PeerDisconnected);
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
