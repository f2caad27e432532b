//! Core types for the chatflow message-transfer pipeline.
//!
//! This crate defines the data model shared between the transfer pipeline
//! and the processes that host it:
//!
//! - [`RawEvent`]: the unit delivered by the partitioned-log client
//! - [`ChatEvent`]: the decoded chat event (protobuf wire format)
//! - [`Options`]: the per-event delivery/storage flag bitmask
//! - [`Error`] / [`Result`]: the core error type
//!
//! Everything here is plain data; the pipeline mechanics live in
//! `chatflow-transfer`.

pub mod error;
pub mod event;
pub mod options;

pub use error::{Error, Result};
pub use event::{content_type, ChatEvent, RawEvent};
pub use options::Options;
