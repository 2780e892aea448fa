//! Length-prefixed JSON framing over the TCP socket to the Executor.
//!
//! The original supervisor-executor socket read raw `recv(4096)` chunks and
//! fed each straight to `json.loads`, which silently truncates or
//! concatenates messages that straddle a read boundary. Every frame here
//! carries an explicit 4-byte big-endian length prefix so a read always
//! returns exactly one message, however many `recv` calls it takes to
//! arrive.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// The largest frame body a 4-byte big-endian length prefix can carry,
/// minus a few bytes of headroom: (4 GiB − 5) bytes.
pub const MAX_FRAME_LEN: u32 = u32::MAX - 4;

#[derive(Debug, thiserror::Error)]
pub enum FramedError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame length {0} exceeds max {MAX_FRAME_LEN}")]
    TooLarge(u32),
    #[error("connection closed")]
    Closed,
}

/// Write `value` as a length-prefixed JSON frame.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), FramedError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(value).map_err(|e| {
        FramedError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    let len = u32::try_from(body.len()).map_err(|_| FramedError::TooLarge(u32::MAX))?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame and parse it as JSON. Returns
/// `Ok(None)` for a malformed body (logged, not fatal — the connection
/// stays open for the next frame) and `Err` only for a transport-level
/// failure (EOF, oversized length, I/O error).
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, FramedError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(FramedError::Closed),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(FramedError::TooLarge(len));
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;

    match serde_json::from_slice(&body) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            log::warn!("dropping malformed frame ({} bytes): {e}", body.len());
            Ok(None)
        }
    }
}
