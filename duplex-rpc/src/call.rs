use futures::{channel::mpsc::UnboundedReceiver, StreamExt};
use log::debug;
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::{timeout_at, Instant};

use crate::{calls_registry::Inbound, writer::RpcWriter};

/// Client side of an open call. Both directions are usable from a single
/// owner. Use [Call::split] to drive them from different tasks
pub struct Call {
    sender: CallSender,
    receiver: CallReceiver,
}

impl Call {
    pub(crate) fn new(
        id: i64,
        method: &str,
        writer: RpcWriter,
        inbound: UnboundedReceiver<Inbound>,
        deadline: Instant,
    ) -> Self {
        Self {
            sender: CallSender {
                id,
                method: method.to_owned(),
                writer: writer.clone(),
                deadline,
                send_closed: false,
            },
            receiver: CallReceiver {
                id,
                method: method.to_owned(),
                writer,
                inbound,
                deadline,
                status: None,
            },
        }
    }

    pub fn id(&self) -> i64 {
        self.sender.id
    }

    pub fn method(&self) -> &str {
        &self.sender.method
    }

    pub fn deadline(&self) -> Instant {
        self.sender.deadline
    }

    /// Send a record to the server
    pub async fn send<P: Serialize>(&mut self, data: &P) -> crate::Result<()> {
        self.sender.send(data).await
    }

    /// Receive next server record. `Ok(None)` means the server finished the call
    pub async fn recv<R: DeserializeOwned>(&mut self) -> crate::Result<Option<R>> {
        self.receiver.recv().await
    }

    /// Half-close the call. The server sees end of input, responses still can be received
    pub async fn close_send(&mut self) -> crate::Result<()> {
        self.sender.close_send().await
    }

    /// Half-close the call and wait for the only response
    pub async fn finish<R: DeserializeOwned>(mut self) -> crate::Result<R> {
        self.close_send().await?;

        let response = self.recv().await?.ok_or_else(|| {
            crate::Error::ProtocolError("Call finished without a response".into())
        })?;

        match self.recv::<bson::Bson>().await? {
            None => Ok(response),
            Some(_) => Err(crate::Error::ProtocolError(
                "Unexpected response after the final one".into(),
            )),
        }
    }

    /// Split the call into independently owned halves
    pub fn split(self) -> (CallSender, CallReceiver) {
        (self.sender, self.receiver)
    }
}

/// Sending half of a call
pub struct CallSender {
    id: i64,
    method: String,
    writer: RpcWriter,
    deadline: Instant,
    send_closed: bool,
}

impl CallSender {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Send a record to the server. Fails if the call deadline has passed or the call is half-closed
    pub async fn send<P: Serialize>(&mut self, data: &P) -> crate::Result<()> {
        if self.send_closed {
            return Err(crate::Error::ProtocolError(format!(
                "Send to the call {} after half-close",
                self.id
            )));
        }

        self.with_deadline(self.writer.send_data(self.id, data))
            .await
    }

    /// Half-close the call. Subsequent calls are no-op
    pub async fn close_send(&mut self) -> crate::Result<()> {
        if self.send_closed {
            return Ok(());
        }

        self.with_deadline(self.writer.half_close(self.id)).await?;
        self.send_closed = true;

        Ok(())
    }

    async fn with_deadline(
        &self,
        write: impl std::future::Future<Output = crate::Result<()>>,
    ) -> crate::Result<()> {
        if Instant::now() >= self.deadline {
            self.writer.spawn_cancel(self.id);
            return Err(crate::Error::DeadlineExceeded);
        }

        match timeout_at(self.deadline, write).await {
            Ok(result) => result,
            Err(_) => {
                debug!("Call {} to `{}` deadline exceeded on send", self.id, self.method);

                self.writer.spawn_cancel(self.id);
                Err(crate::Error::DeadlineExceeded)
            }
        }
    }
}

/// Receiving half of a call
pub struct CallReceiver {
    id: i64,
    method: String,
    writer: RpcWriter,
    inbound: UnboundedReceiver<Inbound>,
    deadline: Instant,
    /// Call status, once the call is finished
    status: Option<crate::Result<()>>,
}

impl CallReceiver {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Receive next server record. `Ok(None)` means the server finished the call.
    /// Once the call is finished all subsequent calls return the same status
    pub async fn recv<R: DeserializeOwned>(&mut self) -> crate::Result<Option<R>> {
        if let Some(status) = &self.status {
            return status.clone().map(|_| None);
        }

        let frame = match timeout_at(self.deadline, self.inbound.next()).await {
            Ok(frame) => frame,
            Err(_) => {
                debug!("Call {} to `{}` deadline exceeded on receive", self.id, self.method);

                self.writer.spawn_cancel(self.id);
                return Err(self.fail(crate::Error::DeadlineExceeded));
            }
        };

        match frame {
            Some(Inbound::Data(data)) => bson::from_bson(data)
                .map(Some)
                .map_err(|e| crate::Error::ResultTypeError(e.to_string())),
            Some(Inbound::End) => {
                self.status = Some(Ok(()));
                Ok(None)
            }
            Some(Inbound::Failed(e)) => Err(self.fail(e)),
            None => Err(self.fail(crate::Error::PeerDisconnected)),
        }
    }

    /// `true` once the server finished the call, or the call failed
    pub fn is_finished(&self) -> bool {
        self.status.is_some()
    }

    fn fail(&mut self, error: crate::Error) -> crate::Error {
        self.status = Some(Err(error.clone()));
        error
    }
}

impl Drop for CallReceiver {
    fn drop(&mut self) {
        if self.status.is_none() {
            debug!("Call {} to `{}` dropped before completion", self.id, self.method);

            self.writer.spawn_cancel(self.id);
        }
    }
}
