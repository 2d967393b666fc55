use bson::Bson;
use serde::{Deserialize, Serialize};

/// A single frame on the wire. `id` is the call id the frame belongs to
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcMessage {
    pub id: i64,
    pub data: RpcData,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum RpcData {
    /// Client opens a new call
    Open {
        method: String,
        timeout_ms: Option<i64>,
    },
    /// Call record. Sent in both directions
    Data(Bson),
    /// Client won't send any more records
    HalfClose,
    /// Client abandoned the call
    Cancel,
    /// Server finished the call with a status
    Close(crate::Result<()>),
}

impl RpcMessage {
    pub fn new(id: i64, data: RpcData) -> Self {
        Self { id, data }
    }
}
