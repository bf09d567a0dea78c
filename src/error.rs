//! Error types for the edge-detection service.
//!
//! Each layer owns its own error enum; [`ServiceError`] is the per-connection
//! taxonomy the server reports back to clients as a one-byte [`ErrorCode`].

use std::time::Duration;

use thiserror::Error;

use crate::common::protocol::ErrorCode;

/// Failures while sending or receiving a length-prefixed frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The stream ended before the header or the full payload arrived.
    #[error("incomplete frame: stream closed mid-frame")]
    IncompleteFrame,

    /// The declared payload length exceeds the accepted maximum.
    #[error("frame too large: {len} bytes (max: {max} bytes)")]
    FrameTooLarge { len: usize, max: usize },

    /// The read or write did not finish in time.
    #[error("frame I/O timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while converting between container bytes and an [`Image`](crate::processing::Image).
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload signature is neither PNG nor JPEG.
    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Pixel storage does not match the declared geometry.
    #[error("dimension mismatch: expected {expected} values, found {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Failures of a convolution pass.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("convolution deadline exceeded")]
    DeadlineExceeded,

    /// The row worker threads could not be started.
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Everything that can abort one server connection.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(#[from] FrameError),

    #[error("decode error: {0}")]
    Decode(#[source] CodecError),

    #[error("encode error: {0}")]
    Encode(#[source] CodecError),

    #[error("processing timed out")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Wire code reported to the client for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Transport(FrameError::Timeout(_)) | ServiceError::Timeout => {
                ErrorCode::Timeout
            }
            ServiceError::Transport(_) => ErrorCode::Transport,
            ServiceError::Decode(_) => ErrorCode::Decode,
            ServiceError::Encode(_) => ErrorCode::Encode,
            ServiceError::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<ComputeError> for ServiceError {
    fn from(err: ComputeError) -> Self {
        match err {
            ComputeError::DeadlineExceeded => ServiceError::Timeout,
            ComputeError::Pool(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

/// Failures seen by the client during one request/response exchange.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] FrameError),

    /// The server answered with an error response.
    #[error("server rejected request ({code:?}): {message}")]
    Rejected { code: ErrorCode, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("local file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for frame operations.
pub type FrameResult<T> = std::result::Result<T, FrameError>;
