//! Fan-out writer: cache write with sequence assignment, then downstream
//! forwarding.
//!
//! One writer instance is shared by all lanes. Per aspect (message or
//! notification) and key:
//!
//! - non-empty storage list: one batch write to the cache requesting
//!   sequence assignment. On failure the failure counter grows by the list
//!   length and nothing is forwarded (at-most-once into storage). On
//!   success the success counter grows by the list length, the batch plus
//!   its last assigned sequence goes to the durable-storage queue, and each
//!   event goes individually to the push queue.
//! - non-empty non-storage list: each event individually to the push queue.
//!
//! The two branches are independent and both run when applicable. Enqueue
//! failures are logged and processing continues; retry policy belongs to
//! the queue clients, never to this writer.

use std::sync::Arc;

use chatflow_core::ChatEvent;
use tracing::error;

use crate::counters::TransferCounters;
use crate::sink::MsgSinks;

/// Which stream of one conversation a batch belongs to. Messages and
/// notifications are cached and sequenced independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aspect {
    Message,
    Notification,
}

impl Aspect {
    fn label(self) -> &'static str {
        match self {
            Aspect::Message => "message",
            Aspect::Notification => "notification",
        }
    }
}

pub struct FanoutWriter {
    sinks: MsgSinks,
    counters: Arc<TransferCounters>,
}

impl FanoutWriter {
    pub fn new(sinks: MsgSinks, counters: Arc<TransferCounters>) -> Self {
        Self { sinks, counters }
    }

    /// Writes and fans out one aspect of one conversation's batch.
    pub async fn handle(
        &self,
        aspect: Aspect,
        key: &str,
        storage: Vec<ChatEvent>,
        non_storage: Vec<ChatEvent>,
    ) {
        if !storage.is_empty() {
            let result = match aspect {
                Aspect::Message => self.sinks.cache.batch_insert_chat(key, &storage).await,
                Aspect::Notification => {
                    self.sinks
                        .cache
                        .batch_insert_notification(key, &storage)
                        .await
                }
            };
            match result {
                Err(err) => {
                    error!(
                        error = %err,
                        key = %key,
                        aspect = aspect.label(),
                        count = storage.len(),
                        "cache batch write failed, dropping storage batch"
                    );
                    self.counters.record_failure(storage.len() as u64);
                }
                Ok(last_seq) => {
                    self.counters.record_success(storage.len() as u64);
                    if let Err(err) = self
                        .sinks
                        .storage_queue
                        .enqueue(key, &storage, last_seq)
                        .await
                    {
                        error!(
                            error = %err,
                            key = %key,
                            aspect = aspect.label(),
                            last_seq,
                            "storage queue enqueue failed"
                        );
                    }
                    for event in &storage {
                        if let Err(err) = self.sinks.push_queue.enqueue(key, event).await {
                            error!(
                                error = %err,
                                key = %key,
                                client_msg_id = %event.client_msg_id,
                                "push queue enqueue failed"
                            );
                        }
                    }
                }
            }
        }

        for event in &non_storage {
            if let Err(err) = self.sinks.push_queue.enqueue(key, event).await {
                error!(
                    error = %err,
                    key = %key,
                    client_msg_id = %event.client_msg_id,
                    "push queue enqueue failed"
                );
            }
        }
    }

    /// Forwards the reaction modify list. Failures are logged, non-fatal.
    pub async fn forward_modify(&self, key: &str, events: &[ChatEvent]) {
        if events.is_empty() {
            return;
        }
        if let Err(err) = self.sinks.modify_queue.enqueue(key, events).await {
            error!(
                error = %err,
                key = %key,
                count = events.len(),
                "modify queue enqueue failed"
            );
        }
    }
}
