//! Error types for the subscription service.

use thiserror::Error;

/// Failure building a prefix key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefixError {
    #[error("prefix of {bits} bits needs {needed} bytes, got {got}")]
    Truncated {
        bits: usize,
        needed: usize,
        got: usize,
    },
}

/// Failure decoding a wire payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unexpected end of stream")]
    EndOfStream,

    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    #[error("prefix of {0} bits does not fit a one-byte length")]
    PrefixTooLong(usize),

    #[error("unknown error code: {0}")]
    UnknownCode(u32),
}

/// Status codes carried in subscribe/renew responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    BadStream = 12,
    PoolFull = 15,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(value: u32) -> std::result::Result<Self, CodecError> {
        match value {
            0 => Ok(ErrorCode::Success),
            12 => Ok(ErrorCode::BadStream),
            15 => Ok(ErrorCode::PoolFull),
            other => Err(CodecError::UnknownCode(other)),
        }
    }
}

impl From<&CodecError> for ErrorCode {
    fn from(_: &CodecError) -> Self {
        ErrorCode::BadStream
    }
}

/// Main error type for subscription service operations.
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("Subscription pool is full (limit {0})")]
    PoolFull(u32),

    #[error("Malformed request: {0}")]
    Codec(#[from] CodecError),

    #[error("Invalid prefix: {0}")]
    Prefix(#[from] PrefixError),

    #[error("Dispatch pool is shut down")]
    Stopped,

    #[error("Worker thread could not be started: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),
}

impl SubscribeError {
    /// Status code to report to the client for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubscribeError::PoolFull(_) => ErrorCode::PoolFull,
            SubscribeError::Codec(_) | SubscribeError::Prefix(_) => ErrorCode::BadStream,
            // Not reachable from a client request.
            SubscribeError::Stopped
            | SubscribeError::Spawn(_)
            | SubscribeError::WorkerPanicked(_) => ErrorCode::BadStream,
        }
    }
}

/// Result type for subscription service operations.
pub type Result<T> = std::result::Result<T, SubscribeError>;
