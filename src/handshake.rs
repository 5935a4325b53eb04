//! Length-prefixed UTF-8 string exchange used for the filename handshake.
//! Deliberately opaque and separate from `SenderEngine`/`ReceiverEngine` — a
//! caller driving the engines directly can ignore this module entirely.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, TcpliteError};

/// Write `s` as a `u32` big-endian length prefix followed by its UTF-8
/// bytes.
pub async fn write_str<W: AsyncWrite + Unpin>(writer: &mut W, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    writer
        .write_all(&(bytes.len() as u32).to_be_bytes())
        .await
        .map_err(|_| TcpliteError::ChannelClosed)?;
    writer
        .write_all(bytes)
        .await
        .map_err(|_| TcpliteError::ChannelClosed)?;
    Ok(())
}

/// Read a length-prefixed UTF-8 string written by `write_str`.
pub async fn read_str<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|_| TcpliteError::ChannelClosed)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|_| TcpliteError::ChannelClosed)?;
    String::from_utf8(buf).map_err(|_| TcpliteError::MalformedFrameDetail("handshake string is not valid UTF-8"))
}
