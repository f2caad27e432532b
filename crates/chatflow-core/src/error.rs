//! Error types for chatflow core operations.
//!
//! All fallible functions in this crate return `Result<T>`, aliased to
//! `Result<T, Error>`, so callers can use the `?` operator for propagation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A raw payload could not be decoded into a `ChatEvent`.
    #[error("payload decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// A routing key was empty or otherwise unusable.
    #[error("invalid conversation key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, Error>;
