//! # Length-Prefixed Framing
//!
//! Gives opaque binary payloads reliable message boundaries over a byte stream.
//!
//! ## Wire Protocol
//!
//! ```text
//! [4 bytes: payload length N, big-endian u32] [N bytes: payload]
//! ```
//!
//! There is no version byte, checksum or type tag at this layer. A zero length
//! is a valid, empty payload.
//!
//! The free functions [`read_frame`] and [`write_frame`] work on any tokio
//! reader/writer; [`Connection`] wraps a duplex stream and adds the payload
//! limit and per-operation timeout the service runs with.

use std::time::Duration;

use log::{debug, error};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{FrameError, FrameResult};

/// Default maximum accepted payload size (64 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Size of the length prefix in bytes.
pub const HEADER_LEN: usize = 4;

/// Read one frame from `reader`.
///
/// Reads the 4-byte big-endian length, rejects it with
/// [`FrameError::FrameTooLarge`] if it exceeds `max_len` (before allocating
/// anything), then reads exactly that many payload bytes.
///
/// # Errors
/// - [`FrameError::IncompleteFrame`] if the stream ends before the header or
///   the whole payload has been received
/// - [`FrameError::FrameTooLarge`] for an oversized declared length
/// - [`FrameError::Io`] for any other I/O failure
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> FrameResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut length_buf = [0u8; HEADER_LEN];
    reader.read_exact(&mut length_buf).await.map_err(eof_as_incomplete)?;

    let length = u32::from_be_bytes(length_buf) as usize;
    if length > max_len {
        error!(
            "❌ Frame too large: {} bytes (max: {} bytes)",
            length, max_len
        );
        return Err(FrameError::FrameTooLarge {
            len: length,
            max: max_len,
        });
    }
    if length == 0 {
        return Ok(Vec::new());
    }

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await.map_err(eof_as_incomplete)?;
    Ok(payload)
}

/// Write one frame to `writer`: the 4-byte big-endian length, then the
/// payload, then a flush.
///
/// # Errors
/// [`FrameError::FrameTooLarge`] if the payload does not fit a `u32` length,
/// [`FrameError::Io`] if the stream fails.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> FrameResult<()>
where
    W: AsyncWrite + Unpin,
{
    let length = u32::try_from(payload.len()).map_err(|_| FrameError::FrameTooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;

    writer.write_all(&length.to_be_bytes()).await?;
    if !payload.is_empty() {
        writer.write_all(payload).await?;
    }
    writer.flush().await?;
    Ok(())
}

fn eof_as_incomplete(err: std::io::Error) -> FrameError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        FrameError::IncompleteFrame
    } else {
        FrameError::Io(err)
    }
}

/// Stream wrapper that applies a payload limit and an I/O timeout to every
/// frame operation.
pub struct Connection<S> {
    stream: S,
    max_frame_size: usize,
    timeout: Option<Duration>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an established stream with the default limit and no timeout.
    ///
    /// # Example
    /// ```ignore
    /// let stream = TcpStream::connect("127.0.0.1:8000").await?;
    /// let mut conn = Connection::new(stream).with_timeout(Duration::from_secs(30));
    /// ```
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            timeout: None,
        }
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Bound every subsequent read and write by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read one frame, failing with [`FrameError::Timeout`] if the peer stalls.
    pub async fn read_frame(&mut self) -> FrameResult<Vec<u8>> {
        let max = self.max_frame_size;
        let payload = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, read_frame(&mut self.stream, max))
                .await
                .map_err(|_| FrameError::Timeout(limit))??,
            None => read_frame(&mut self.stream, max).await?,
        };
        debug!("Received frame with {} payload bytes", payload.len());
        Ok(payload)
    }

    /// Write one frame, failing with [`FrameError::Timeout`] if the peer stops reading.
    pub async fn write_frame(&mut self, payload: &[u8]) -> FrameResult<()> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, write_frame(&mut self.stream, payload))
                .await
                .map_err(|_| FrameError::Timeout(limit))??,
            None => write_frame(&mut self.stream, payload).await?,
        }
        debug!("Sent frame with {} payload bytes", payload.len());
        Ok(())
    }

    /// Shut down the write half so the peer sees end-of-stream.
    pub async fn shutdown(&mut self) -> FrameResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Read and throw away up to `len` bytes, stopping early at end-of-stream.
    ///
    /// Used after refusing an oversized frame: a socket closed with unread
    /// input is reset, and the reset can destroy the error response before the
    /// peer reads it.
    pub async fn discard(&mut self, len: u64) -> FrameResult<u64> {
        let drain = async {
            let mut remaining = (&mut self.stream).take(len);
            tokio::io::copy(&mut remaining, &mut tokio::io::sink()).await
        };
        let discarded = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, drain)
                .await
                .map_err(|_| FrameError::Timeout(limit))??,
            None => drain.await?,
        };
        debug!("Discarded {} unread payload bytes", discarded);
        Ok(discarded)
    }
}
