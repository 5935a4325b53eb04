use thiserror::Error;

/// All errors produced by the tcplite engines.
#[derive(Debug, Error)]
pub enum TcpliteError {
    #[error("malformed frame: expected at least {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    #[error("malformed frame: {0}")]
    MalformedFrameDetail(&'static str),

    #[error("channel closed by peer")]
    ChannelClosed,

    #[error("chunk source or delivery sink unavailable: {0}")]
    FileUnavailable(String),

    #[error("transfer aborted after exhausting retransmission attempts for segment {0}")]
    TransferAborted(i32),

    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, TcpliteError>;
