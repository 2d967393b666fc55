use std::{collections::HashMap, fmt::Display, future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::{channel::oneshot, lock::Mutex};
use log::{debug, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, ToSocketAddrs},
    time::Instant,
};

use crate::{
    calls_registry::{CallsRegistry, Inbound},
    message::{RpcData, RpcMessage},
    message_stream::AsyncReadMessage,
    request::ServerCall,
    writer::RpcWriter,
};

/// Call handler. A handler invocation owns the call until it returns.
/// Returned status is sent to the client as the call trailer
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, call: ServerCall) -> crate::Result<()>;
}

/// Routing table. Maps method names to handlers
#[derive(Default, Clone)]
pub struct Router {
    routes: HashMap<String, Arc<dyn Handler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `handler` for the `method`
    pub fn add_route<H: Handler>(&mut self, method: &str, handler: H) -> crate::Result<()> {
        if self.routes.contains_key(method) {
            return Err(crate::Error::AlreadyRegistered(method.to_owned()));
        }

        debug!("Registering `{method}` handler");

        self.routes.insert(method.to_owned(), Arc::new(handler));
        Ok(())
    }

    /// Builder version of [Router::add_route]
    pub fn route<H: Handler>(mut self, method: &str, handler: H) -> crate::Result<Self> {
        self.add_route(method, handler)?;
        Ok(self)
    }

    pub fn handler(&self, method: &str) -> Option<Arc<dyn Handler>> {
        self.routes.get(method).cloned()
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

/// Listening server. Serves every accepted connection on its own task
pub struct Server {
    router: Arc<Router>,
}

impl Server {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Bind a listener to `addr`
    pub async fn listen<A: ToSocketAddrs + Display>(addr: A) -> crate::Result<TcpListener> {
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::ConnectionError(format!("{addr}: {e}")))?;

        info!("Server started, listening on {addr}");

        Ok(listener)
    }

    /// Accept and serve connections forever
    pub async fn serve(self, listener: TcpListener) -> crate::Result<()> {
        self.serve_with_shutdown(listener, futures::future::pending())
            .await
    }

    /// Accept and serve connections until `signal` resolves
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, signal: F) -> crate::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut signal => {
                    info!("Shutting down server");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            debug!("Failed to disable Nagle's algorithm: {e}");
                        }

                        tokio::spawn(Self::serve_connection(
                            self.router.clone(),
                            stream,
                            addr.to_string(),
                        ));
                    }
                    Err(e) => warn!("Failed to accept a connection: {e}"),
                }
            }
        }
    }

    /// Serve a single connected stream until the client disconnects
    pub async fn serve_connection<S>(router: Arc<Router>, stream: S, peer_name: String)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        info!("New connection from {peer_name}");

        let (mut socket, writer) = tokio::io::split(stream);
        let writer = RpcWriter::new(writer, &peer_name);
        let calls_registry = Arc::new(Mutex::new(CallsRegistry::new()));

        loop {
            let message: RpcMessage = match socket.read_message().await {
                Ok(message) => message,
                Err(e) => {
                    info!("Failed to read incoming message from {peer_name}. Client disconnected?: {e}");
                    break;
                }
            };

            debug!("Incoming message from {peer_name}: {message:?}");

            let RpcMessage { id, data } = message;
            match data {
                RpcData::Open { method, timeout_ms } => {
                    Self::open_call(&router, &calls_registry, &writer, id, method, timeout_ms)
                        .await
                }
                RpcData::Data(body) => calls_registry
                    .lock()
                    .await
                    .resolve(id, Inbound::Data(body)),
                RpcData::HalfClose => calls_registry.lock().await.resolve(id, Inbound::End),
                RpcData::Cancel => calls_registry
                    .lock()
                    .await
                    .cancel(id, crate::Error::Cancelled),
                data @ RpcData::Close(_) => {
                    warn!("Unexpected frame from {peer_name} for the call {id}: {data:?}")
                }
            }
        }

        calls_registry
            .lock()
            .await
            .clear_pending_calls(crate::Error::PeerDisconnected);
    }

    async fn open_call(
        router: &Router,
        calls_registry: &Arc<Mutex<CallsRegistry>>,
        writer: &RpcWriter,
        id: i64,
        method: String,
        timeout_ms: Option<i64>,
    ) {
        let Some(handler) = router.handler(&method) else {
            warn!("Call {id} to an unknown method `{method}`");

            if let Err(e) = writer.close(id, Err(crate::Error::NoEndpoint(method))).await {
                debug!("Failed to reject a call: {e}");
            }
            return;
        };

        let Some((inbound, cancel)) = calls_registry.lock().await.add_incoming_call(id) else {
            warn!("Call {id} is already active");

            let status = Err(crate::Error::ProtocolError(format!("Duplicate call id {id}")));
            if let Err(e) = writer.close(id, status).await {
                debug!("Failed to reject a call: {e}");
            }
            return;
        };

        // Deadline out of the `Instant` range is no deadline
        let deadline = timeout_ms.and_then(|ms| {
            Instant::now().checked_add(Duration::from_millis(u64::try_from(ms).unwrap_or(0)))
        });
        let call = ServerCall::new(id, method, writer.clone(), inbound);

        tokio::spawn(Self::run_call(
            handler,
            call,
            deadline,
            cancel,
            calls_registry.clone(),
            writer.clone(),
        ));
    }

    /// Run a handler until it returns, the deadline passes, or the client cancels the call
    async fn run_call(
        handler: Arc<dyn Handler>,
        call: ServerCall,
        deadline: Option<Instant>,
        cancel: oneshot::Receiver<crate::Error>,
        calls_registry: Arc<Mutex<CallsRegistry>>,
        writer: RpcWriter,
    ) {
        let id = call.id();
        let method = call.method().to_owned();

        debug!("Handling call {id} to `{method}`");

        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => futures::future::pending().await,
            }
        };

        let status = tokio::select! {
            status = handler.handle(call) => status,
            _ = expired => Err(crate::Error::DeadlineExceeded),
            reason = cancel => Err(reason.unwrap_or(crate::Error::PeerDisconnected)),
        };

        calls_registry.lock().await.remove(id);

        match &status {
            Ok(()) => debug!("Call {id} to `{method}` completed"),
            Err(e) => info!("Call {id} to `{method}` failed: {e}"),
        }

        if let Err(e) = writer.close(id, status).await {
            debug!("Failed to send call {id} status: {e}");
        }
    }
}
