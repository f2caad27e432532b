//! Distribution router: decode, group, shard.
//!
//! A single sequential task consumes chunks from the intake buffer, decodes
//! each payload, groups decoded events by conversation key in arrival
//! order, and dispatches each group to one of N fixed lanes chosen by a
//! deterministic hash of the key. Because the task is strictly sequential
//! and the hash is stable for the life of the process, events for one key
//! are never reordered or raced across lanes.
//!
//! A payload that fails to decode is logged and skipped; the rest of the
//! chunk is processed normally. Lane sends block when the lane's bounded
//! queue is full — the secondary backpressure point, which throttles the
//! router and, transitively, the intake buffer.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use chatflow_core::ChatEvent;
use siphasher::sip::SipHasher;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::intake::TriggerBatch;

/// One conversation's share of a chunk, dispatched to a lane.
#[derive(Debug)]
pub struct ConversationJob {
    /// Conversation/aggregation key.
    pub key: String,
    /// Trigger id propagated from the intake flush.
    pub trigger_id: String,
    /// Decoded events for this key, in arrival order.
    pub events: Vec<ChatEvent>,
}

/// Command sent on a lane's inbound queue.
#[derive(Debug)]
pub enum LaneCommand {
    Aggregate(ConversationJob),
}

/// Deterministic lane selection: stable SipHash of the key, reduced modulo
/// the lane count. The same key maps to the same lane for the life of the
/// process.
pub fn lane_index(key: &str, lane_count: usize) -> usize {
    let mut hasher = SipHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % lane_count as u64) as usize
}

/// Spawns the router task. Exits when the intake side goes away.
pub(crate) fn spawn_router(
    mut trigger_rx: mpsc::Receiver<TriggerBatch>,
    lanes: Vec<mpsc::Sender<LaneCommand>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(batch) = trigger_rx.recv().await {
            route_batch(&lanes, batch).await;
        }
        debug!("trigger channel closed, router exiting");
    })
}

/// Decodes one chunk, groups by key, and dispatches to lanes.
pub(crate) async fn route_batch(lanes: &[mpsc::Sender<LaneCommand>], batch: TriggerBatch) {
    let TriggerBatch { trigger_id, events } = batch;
    debug!(
        trigger_id = %trigger_id,
        count = events.len(),
        "chunk arrived at distribution"
    );

    // Group by key, preserving per-key arrival order. Keys are dispatched
    // in first-arrival order to keep routing deterministic per chunk.
    let mut groups: HashMap<String, Vec<ChatEvent>> = HashMap::new();
    let mut key_order: Vec<String> = Vec::new();
    for raw in events {
        let event = match ChatEvent::from_payload(&raw.payload) {
            Ok(event) => event,
            Err(error) => {
                error!(
                    error = %error,
                    key = %raw.key,
                    partition = raw.partition,
                    offset = raw.offset,
                    operation_id = raw.header("operation_id").unwrap_or(""),
                    "failed to decode payload, skipping event"
                );
                continue;
            }
        };
        if !groups.contains_key(&raw.key) {
            key_order.push(raw.key.clone());
        }
        groups.entry(raw.key).or_default().push(event);
    }

    for key in key_order {
        let Some(events) = groups.remove(&key) else {
            continue;
        };
        let lane = lane_index(&key, lanes.len());
        debug!(
            key = %key,
            lane,
            count = events.len(),
            trigger_id = %trigger_id,
            "dispatching conversation batch"
        );
        let job = ConversationJob {
            key,
            trigger_id: trigger_id.clone(),
            events,
        };
        if lanes[lane].send(LaneCommand::Aggregate(job)).await.is_err() {
            warn!(lane, "lane channel closed, dropping conversation batch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chatflow_core::RawEvent;
    use prost::Message;

    fn encoded(send_id: &str, msg_id: &str) -> Bytes {
        let event = ChatEvent {
            send_id: send_id.to_string(),
            conversation_id: "c".to_string(),
            client_msg_id: msg_id.to_string(),
            send_time: 0,
            content_type: chatflow_core::content_type::TEXT,
            options: 0,
            content: Bytes::new(),
        };
        Bytes::from(event.encode_to_vec())
    }

    fn raw(key: &str, offset: i64, payload: Bytes) -> RawEvent {
        RawEvent {
            key: key.to_string(),
            payload,
            headers: Vec::new(),
            partition: 0,
            offset,
        }
    }

    #[test]
    fn lane_index_is_deterministic_and_in_range() {
        for key in ["alice", "bob", "group-9000", ""] {
            let first = lane_index(key, 100);
            assert!(first < 100);
            for _ in 0..5 {
                assert_eq!(lane_index(key, 100), first);
            }
        }
    }

    #[test]
    fn lane_index_spreads_keys() {
        // Not a distribution test, just a sanity check that hashing does
        // not collapse everything onto one lane.
        let lanes: std::collections::HashSet<_> =
            (0..1000).map(|i| lane_index(&format!("key-{i}"), 100)).collect();
        assert!(lanes.len() > 50);
    }

    #[tokio::test]
    async fn route_batch_groups_by_key_and_keeps_order() {
        let lane_count = 4;
        let mut rxs = Vec::new();
        let mut txs = Vec::new();
        for _ in 0..lane_count {
            let (tx, rx) = mpsc::channel(64);
            txs.push(tx);
            rxs.push(rx);
        }

        // Interleave two keys; each key's events must arrive as one job in
        // original order.
        let mut events = Vec::new();
        for i in 0..10 {
            events.push(raw("ka", i * 2, encoded("ua", &format!("a-{i}"))));
            events.push(raw("kb", i * 2 + 1, encoded("ub", &format!("b-{i}"))));
        }
        route_batch(
            &txs,
            TriggerBatch {
                trigger_id: "t1".to_string(),
                events,
            },
        )
        .await;
        drop(txs);

        let mut jobs = Vec::new();
        for mut rx in rxs {
            while let Some(LaneCommand::Aggregate(job)) = rx.recv().await {
                jobs.push(job);
            }
        }
        assert_eq!(jobs.len(), 2);
        for job in jobs {
            let prefix = if job.key == "ka" { "a" } else { "b" };
            let ids: Vec<_> = job.events.iter().map(|e| e.client_msg_id.clone()).collect();
            let expected: Vec<_> = (0..10).map(|i| format!("{prefix}-{i}")).collect();
            assert_eq!(ids, expected);
        }
    }

    #[tokio::test]
    async fn undecodable_event_is_skipped_not_fatal() {
        let (tx, mut rx) = mpsc::channel(64);
        let events = vec![
            raw("ka", 0, encoded("ua", "a-0")),
            raw("ka", 1, Bytes::from_static(&[0xff, 0xff, 0xff])),
            raw("ka", 2, encoded("ua", "a-1")),
        ];
        route_batch(
            &[tx],
            TriggerBatch {
                trigger_id: "t1".to_string(),
                events,
            },
        )
        .await;

        let Some(LaneCommand::Aggregate(job)) = rx.recv().await else {
            panic!("expected a job");
        };
        let ids: Vec<_> = job.events.iter().map(|e| e.client_msg_id.clone()).collect();
        assert_eq!(ids, vec!["a-0", "a-1"]);
    }
}
