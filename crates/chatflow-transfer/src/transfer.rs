//! Pipeline wiring.
//!
//! [`MsgTransfer::new`] assembles the whole hot path: counters, fan-out
//! writer, N lane tasks, the router task, the intake buffer, and its flush
//! timer. The host process feeds deliveries in through [`MsgTransfer::accept`]
//! and otherwise observes the pipeline only through counters and logs.
//!
//! ## Example
//!
//! ```ignore
//! use chatflow_transfer::{MsgSinks, MsgTransfer, TransferConfig};
//!
//! let config = TransferConfig::from_env();
//! let transfer = MsgTransfer::new(&config, sinks, acker);
//! // log client delivery loop:
//! for raw in deliveries {
//!     transfer.accept(raw);
//! }
//! ```

use std::sync::Arc;

use chatflow_core::RawEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::TransferConfig;
use crate::counters::{CounterSnapshot, TransferCounters};
use crate::error::Result;
use crate::fanout::FanoutWriter;
use crate::intake::{spawn_flush_timer, IntakeBuffer};
use crate::lane::spawn_lane;
use crate::router::spawn_router;
use crate::sink::{MsgSinks, OffsetAcker};

pub struct MsgTransfer {
    intake: Arc<IntakeBuffer>,
    counters: Arc<TransferCounters>,
    flush_task: JoinHandle<()>,
    router_task: JoinHandle<()>,
    lane_tasks: Vec<JoinHandle<()>>,
}

impl MsgTransfer {
    /// Builds the pipeline and spawns all of its tasks.
    pub fn new(config: &TransferConfig, sinks: MsgSinks, acker: Arc<dyn OffsetAcker>) -> Self {
        // Zero-sized lanes, queues, or chunks are never meaningful; a lane
        // count of 0 would divide by zero in routing and a chunk size of 0
        // would never drain the buffer. Clamp rather than panic on a
        // host-supplied config.
        let lane_count = config.lane_count.max(1);
        let lane_queue_capacity = config.lane_queue_capacity.max(1);
        let chunk_size = config.chunk_size.max(1);
        if lane_count != config.lane_count
            || lane_queue_capacity != config.lane_queue_capacity
            || chunk_size != config.chunk_size
        {
            warn!(
                lane_count = config.lane_count,
                lane_queue_capacity = config.lane_queue_capacity,
                chunk_size = config.chunk_size,
                "zero-valued pipeline sizes clamped to 1"
            );
        }

        let counters = Arc::new(TransferCounters::new());
        let writer = Arc::new(FanoutWriter::new(sinks, Arc::clone(&counters)));

        let mut lane_txs = Vec::with_capacity(lane_count);
        let mut lane_tasks = Vec::with_capacity(lane_count);
        for lane in 0..lane_count {
            let (tx, rx) = mpsc::channel(lane_queue_capacity);
            lane_txs.push(tx);
            lane_tasks.push(spawn_lane(lane, rx, Arc::clone(&writer)));
        }

        // Capacity 1: the intake's hand-off blocks while the router is
        // still working, which is the primary backpressure point.
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let router_task = spawn_router(trigger_rx, lane_txs);

        let intake = Arc::new(IntakeBuffer::new(trigger_tx, acker, chunk_size));
        let flush_task = spawn_flush_timer(Arc::clone(&intake), config.flush_interval());

        info!(
            lanes = lane_count,
            lane_queue_capacity,
            chunk_size,
            flush_interval_ms = config.flush_interval_ms,
            "message transfer pipeline started"
        );

        Self {
            intake,
            counters,
            flush_task,
            router_task,
            lane_tasks,
        }
    }

    /// Accepts one delivery from the log client; acks immediately, buffers
    /// non-empty payloads.
    pub fn accept(&self, raw: RawEvent) {
        self.intake.accept(raw);
    }

    /// Forces a flush outside the timer cadence.
    pub async fn flush(&self) -> Result<()> {
        self.intake.flush().await
    }

    /// Shared handle to the success/failure counters.
    pub fn counters(&self) -> Arc<TransferCounters> {
        Arc::clone(&self.counters)
    }

    /// Point-in-time counter values.
    pub fn counter_snapshot(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Drains buffered events and tears the pipeline down in order: final
    /// flush, stop the timer, close the trigger channel, let the router and
    /// lanes run dry, then join them. After this returns, every accepted
    /// event has been fully processed or accounted for in the counters.
    pub async fn shutdown(self) -> Result<()> {
        let final_flush = self.intake.flush().await;
        self.flush_task.abort();
        let _ = self.flush_task.await;

        // Dropping the intake drops the trigger sender; the router exits
        // when the channel runs dry, dropping the lane senders in turn.
        drop(self.intake);
        let _ = self.router_task.await;
        for task in self.lane_tasks {
            let _ = task.await;
        }
        info!("message transfer pipeline stopped");
        final_flush
    }
}
