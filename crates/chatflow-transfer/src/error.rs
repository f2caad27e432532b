//! Error types for the transfer pipeline.
//!
//! The pipeline itself surfaces almost nothing synchronously: decode
//! failures are skipped, cache failures are counted, queue failures are
//! logged. The variants here exist for the sink trait implementations and
//! the few places where a hand-off can genuinely fail (channel shutdown).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    /// Cache batch write failed; the storage list is dropped and counted.
    #[error("cache write failed: {0}")]
    Cache(String),

    /// A downstream queue rejected an enqueue.
    #[error("{queue} enqueue failed: {message}")]
    Queue {
        queue: &'static str,
        message: String,
    },

    /// A payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] chatflow_core::Error),

    /// An internal hand-off channel was closed (pipeline shutting down).
    #[error("{0} channel closed")]
    ChannelClosed(&'static str),
}

pub type Result<T> = std::result::Result<T, TransferError>;
