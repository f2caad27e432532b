//! Lane workers.
//!
//! Each lane is one permanently-running task, single consumer of its own
//! bounded queue, processing jobs strictly in arrival order. FIFO here is
//! what carries the per-key ordering established by the router through to
//! the cache and the downstream queues. A lane blocking on cache or queue
//! I/O stalls only itself, never the router or its sibling lanes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::classify::classify;
use crate::fanout::{Aspect, FanoutWriter};
use crate::router::{ConversationJob, LaneCommand};

pub(crate) fn spawn_lane(
    lane: usize,
    mut rx: mpsc::Receiver<LaneCommand>,
    writer: Arc<FanoutWriter>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                LaneCommand::Aggregate(job) => handle_job(lane, job, &writer).await,
            }
        }
        debug!(lane, "lane channel closed, worker exiting");
    })
}

async fn handle_job(lane: usize, job: ConversationJob, writer: &FanoutWriter) {
    let ConversationJob {
        key,
        trigger_id,
        events,
    } = job;
    debug!(
        lane,
        key = %key,
        trigger_id = %trigger_id,
        count = events.len(),
        "conversation batch arrived at lane"
    );

    let set = classify(&key, events);
    writer
        .handle(Aspect::Message, &key, set.storage_msgs, set.non_storage_msgs)
        .await;
    writer
        .handle(
            Aspect::Notification,
            &key,
            set.storage_notifications,
            set.non_storage_notifications,
        )
        .await;
    writer.forward_modify(&key, &set.modify_msgs).await;
}
