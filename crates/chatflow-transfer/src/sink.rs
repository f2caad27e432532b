//! Trait seams for the pipeline's external collaborators.
//!
//! The core treats the cache driver, the three downstream queues, and the
//! log client's offset acknowledgement as opaque, network-attached services.
//! Each is a small object-safe trait held as `Arc<dyn _>`; production hosts
//! wire real clients, tests wire in-memory fakes.
//!
//! Retry/backoff policy lives inside these implementations, never in the
//! pipeline: the fan-out writer calls each sink exactly once per batch.

use std::sync::Arc;

use async_trait::async_trait;
use chatflow_core::ChatEvent;

use crate::error::Result;

/// Fast-cache driver with sequence assignment.
///
/// Both methods write one ordered batch for one conversation key atomically
/// and return the last sequence number assigned to the batch. Messages and
/// notifications are sequenced independently, hence the two methods.
#[async_trait]
pub trait MsgCache: Send + Sync {
    /// Writes a message-aspect batch, assigning sequence numbers under `key`.
    async fn batch_insert_chat(&self, key: &str, events: &[ChatEvent]) -> Result<i64>;

    /// Writes a notification-aspect batch, assigning sequence numbers under
    /// `key`'s notification stream.
    async fn batch_insert_notification(&self, key: &str, events: &[ChatEvent]) -> Result<i64>;
}

/// Durable-storage queue: receives successfully cached batches together with
/// their assigned last sequence, fire-and-forget from the pipeline's view.
#[async_trait]
pub trait StorageQueue: Send + Sync {
    async fn enqueue(&self, key: &str, events: &[ChatEvent], last_seq: i64) -> Result<()>;
}

/// Push-notification queue: one enqueue call per event.
#[async_trait]
pub trait PushQueue: Send + Sync {
    async fn enqueue(&self, key: &str, event: &ChatEvent) -> Result<()>;
}

/// Modify queue: reaction add/remove propagation batches.
#[async_trait]
pub trait ModifyQueue: Send + Sync {
    async fn enqueue(&self, key: &str, events: &[ChatEvent]) -> Result<()>;
}

/// Offset acknowledgement hook into the log client.
///
/// Called synchronously by the intake buffer the moment a delivery is
/// accepted, before any downstream processing. Implementations are expected
/// to be in-memory marks (the log client commits asynchronously).
pub trait OffsetAcker: Send + Sync {
    fn ack(&self, partition: i32, offset: i64);
}

/// Bundle of the four downstream handles the fan-out writer needs.
#[derive(Clone)]
pub struct MsgSinks {
    pub cache: Arc<dyn MsgCache>,
    pub storage_queue: Arc<dyn StorageQueue>,
    pub push_queue: Arc<dyn PushQueue>,
    pub modify_queue: Arc<dyn ModifyQueue>,
}
