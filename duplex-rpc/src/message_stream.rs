use log::trace;
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Frames bigger than this are rejected without reading the body
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Smallest valid BSON document: length prefix and a trailing zero
const MIN_MESSAGE_SIZE: usize = 5;

/// A trait which can read [serde::de::DeserializeOwned] from a stream
pub trait AsyncReadMessage<T: DeserializeOwned> {
    async fn read_message(&mut self) -> crate::Result<T>;
}

/// A trait which can write [serde::ser::Serialize] into a stream
pub trait AsyncWriteMessage<T: Serialize> {
    async fn write_message(&mut self, message: &T) -> crate::Result<()>;
}

impl<R, T> AsyncReadMessage<T> for R
where
    R: AsyncReadExt + Unpin,
    T: DeserializeOwned,
{
    async fn read_message(&mut self) -> crate::Result<T> {
        // Read BSON len
        let mut len_buf = [0u8; 4];

        self.read_exact(&mut len_buf)
            .await
            .map_err(|_| crate::Error::PeerDisconnected)?;

        let len = i32::from_le_bytes(len_buf);
        trace!("BSON message len: {:?}", len);

        let len = usize::try_from(len)
            .ok()
            .filter(|len| (MIN_MESSAGE_SIZE..=MAX_MESSAGE_SIZE).contains(len))
            .ok_or_else(|| crate::Error::ProtocolError(format!("Invalid frame size {len}")))?;

        // Read BSON body. BSON len is a part of the document
        let mut data = vec![0u8; len];
        data[..4].copy_from_slice(&len_buf);

        self.read_exact(&mut data[4..])
            .await
            .map_err(|_| crate::Error::PeerDisconnected)?;

        bson::from_slice(&data).map_err(|e| crate::Error::ProtocolError(e.to_string()))
    }
}

impl<W, T> AsyncWriteMessage<T> for W
where
    W: AsyncWriteExt + Unpin,
    T: Serialize,
{
    async fn write_message(&mut self, message: &T) -> crate::Result<()> {
        let buffer =
            bson::to_vec(message).map_err(|e| crate::Error::InternalError(e.to_string()))?;

        self.write_all(&buffer)
            .await
            .map_err(|_| crate::Error::PeerDisconnected)?;
        self.flush()
            .await
            .map_err(|_| crate::Error::PeerDisconnected)?;

        Ok(())
    }
}
