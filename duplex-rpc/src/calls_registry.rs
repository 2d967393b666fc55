use std::collections::HashMap;

use bson::Bson;
use futures::channel::{
    mpsc::{unbounded, UnboundedReceiver, UnboundedSender},
    oneshot::{channel as one_channel, Receiver as OneReceiver, Sender as OneSender},
};
use log::{debug, info, trace, warn};

/// Inbound event routed to a call
#[derive(Debug)]
pub(crate) enum Inbound {
    /// Peer record
    Data(Bson),
    /// Peer won't send any more records
    End,
    /// Peer finished the call with an error
    Failed(crate::Error),
}

struct CallEntry {
    /// Inbound records of the call. Unbounded, delivery never waits for the owner
    frames: UnboundedSender<Inbound>,
    /// Abort signal for server side handlers
    cancel: Option<OneSender<crate::Error>>,
}

/// A registry of active calls of a single connection. The connection reader
/// uses it to route incoming frames to the call owner
pub(crate) struct CallsRegistry {
    id_counter: i64,
    calls: HashMap<i64, CallEntry>,
}

impl CallsRegistry {
    pub fn new() -> Self {
        Self {
            id_counter: 0,
            calls: HashMap::new(),
        }
    }

    /// Register an outgoing call, resulting in a call id
    pub fn add_call(&mut self) -> (i64, UnboundedReceiver<Inbound>) {
        let (sender, receiver) = unbounded();
        let id = self.next_id();

        self.calls.insert(
            id,
            CallEntry {
                frames: sender,
                cancel: None,
            },
        );

        trace!("Add new call {id}");

        (id, receiver)
    }

    /// Register an incoming call with a peer-provided id.
    /// Returns `None` if the id is taken by an active call
    pub fn add_incoming_call(
        &mut self,
        id: i64,
    ) -> Option<(UnboundedReceiver<Inbound>, OneReceiver<crate::Error>)> {
        if self.calls.contains_key(&id) {
            return None;
        }

        let (sender, receiver) = unbounded();
        let (cancel_sender, cancel_receiver) = one_channel();

        self.calls.insert(
            id,
            CallEntry {
                frames: sender,
                cancel: Some(cancel_sender),
            },
        );

        trace!("Add new incoming call {id}");

        Some((receiver, cancel_receiver))
    }

    /// Route an inbound event to the call. Never waits for the call owner
    pub fn resolve(&mut self, id: i64, inbound: Inbound) {
        if let Some(entry) = self.calls.get(&id) {
            if entry.frames.unbounded_send(inbound).is_err() {
                warn!("User dropped call {id} handle. Failed to deliver a frame");
            } else {
                debug!("Succesfully delivered a frame to the call {id}")
            }
        } else {
            warn!("Unexpected frame for an unknown call {id}: {inbound:?}")
        }
    }

    /// Abort a server side call with a `reason`
    pub fn cancel(&mut self, id: i64, reason: crate::Error) {
        match self.calls.get_mut(&id).and_then(|entry| entry.cancel.take()) {
            Some(cancel) => {
                if cancel.send(reason).is_err() {
                    debug!("Call {id} has finished before cancellation")
                }
            }
            None => debug!("Cancel for an inactive call {id}"),
        }
    }

    pub fn remove(&mut self, id: i64) {
        if self.calls.remove(&id).is_some() {
            trace!("Removed call {id}");
        }
    }

    /// Drop all calls. Pending handlers are aborted with `reason`, pending
    /// readers see their queue closed
    pub fn clear_pending_calls(&mut self, reason: crate::Error) {
        info!("Clearing calls queue: {reason}");

        for (_, entry) in self.calls.drain() {
            if let Some(cancel) = entry.cancel {
                let _ = cancel.send(reason.clone());
            }
        }
    }

    fn next_id(&mut self) -> i64 {
        self.id_counter += 1;
        self.id_counter
    }
}
