//! Intake buffer: the pipeline's entry point.
//!
//! Raw deliveries from the log client accumulate in a single growable
//! buffer behind a short-held lock. On a fixed cadence (or an explicit
//! [`IntakeBuffer::flush`]) the buffer is swapped for an empty one — a
//! double-buffer swap, so no event is ever visible in both generations —
//! and the swapped-out contents are split into chunks of at most
//! `chunk_size` events, order preserved across chunk boundaries. Each chunk
//! is handed to the distribution router through a bounded channel; the send
//! blocks while the router is busy, which is the pipeline's primary
//! backpressure point against the log client's consumption rate.
//!
//! Offsets are acknowledged in [`IntakeBuffer::accept`], before any
//! downstream processing: the durability trade-off is documented on the
//! crate root.

use std::sync::Arc;
use std::time::Duration;

use chatflow_core::RawEvent;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::{Result, TransferError};
use crate::sink::OffsetAcker;

/// One chunk handed from the intake buffer to the router.
#[derive(Debug)]
pub struct TriggerBatch {
    /// Fresh identifier shared by all chunks of one flush, for tracing.
    pub trigger_id: String,
    /// At most `chunk_size` events, in arrival order.
    pub events: Vec<RawEvent>,
}

pub struct IntakeBuffer {
    buf: Mutex<Vec<RawEvent>>,
    /// Serializes whole flushes (swap plus all chunk sends). Without this,
    /// a timer flush overlapping an explicit flush could swap fresh events
    /// for a key into the trigger channel between an earlier flush's
    /// chunks, reordering that key's events.
    flush_lock: tokio::sync::Mutex<()>,
    trigger_tx: mpsc::Sender<TriggerBatch>,
    acker: Arc<dyn OffsetAcker>,
    chunk_size: usize,
}

impl IntakeBuffer {
    pub fn new(
        trigger_tx: mpsc::Sender<TriggerBatch>,
        acker: Arc<dyn OffsetAcker>,
        chunk_size: usize,
    ) -> Self {
        Self {
            buf: Mutex::new(Vec::new()),
            flush_lock: tokio::sync::Mutex::new(()),
            trigger_tx,
            acker,
            chunk_size,
        }
    }

    /// Accepts one delivery from the log client.
    ///
    /// The offset is acknowledged immediately, whether or not the event is
    /// buffered. Empty payloads are dropped without buffering.
    pub fn accept(&self, raw: RawEvent) {
        self.acker.ack(raw.partition, raw.offset);
        if raw.payload.is_empty() {
            trace!(
                key = %raw.key,
                partition = raw.partition,
                offset = raw.offset,
                "dropping empty payload"
            );
            return;
        }
        self.buf.lock().push(raw);
    }

    /// Number of events currently buffered.
    pub fn pending(&self) -> usize {
        self.buf.lock().len()
    }

    /// Swaps the buffer out and hands its contents to the router in chunks.
    ///
    /// Concurrent flushes (timer vs explicit) are serialized end to end so
    /// one flush's chunks can never interleave with another's. The buffer
    /// lock itself is held only for the swap, never across the channel
    /// sends. Blocks while the router is still busy with a previous chunk.
    pub async fn flush(&self) -> Result<()> {
        let _flush = self.flush_lock.lock().await;
        let drained = {
            let mut buf = self.buf.lock();
            std::mem::take(&mut *buf)
        };
        if drained.is_empty() {
            return Ok(());
        }

        let trigger_id = Uuid::new_v4().to_string();
        debug!(
            trigger_id = %trigger_id,
            count = drained.len(),
            "flush trigger, handing off to distribution"
        );

        let mut remaining = drained;
        while !remaining.is_empty() {
            let rest = if remaining.len() > self.chunk_size {
                remaining.split_off(self.chunk_size)
            } else {
                Vec::new()
            };
            let chunk = std::mem::replace(&mut remaining, rest);
            self.trigger_tx
                .send(TriggerBatch {
                    trigger_id: trigger_id.clone(),
                    events: chunk,
                })
                .await
                .map_err(|_| TransferError::ChannelClosed("distribution"))?;
        }
        Ok(())
    }
}

/// Spawns the periodic flush task. Exits when the router side goes away.
pub(crate) fn spawn_flush_timer(
    intake: Arc<IntakeBuffer>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the first
        // flush happens one full period after startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(error) = intake.flush().await {
                warn!(error = %error, "flush hand-off failed, stopping flush timer");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use parking_lot::Mutex as PlMutex;

    #[derive(Default)]
    struct RecordingAcker {
        acked: PlMutex<Vec<(i32, i64)>>,
    }

    impl OffsetAcker for RecordingAcker {
        fn ack(&self, partition: i32, offset: i64) {
            self.acked.lock().push((partition, offset));
        }
    }

    fn raw(offset: i64, payload: &'static [u8]) -> RawEvent {
        RawEvent {
            key: "g1".to_string(),
            payload: Bytes::from_static(payload),
            headers: Vec::new(),
            partition: 0,
            offset,
        }
    }

    #[tokio::test]
    async fn accept_acks_and_drops_empty_payloads() {
        let (tx, _rx) = mpsc::channel(1);
        let acker = Arc::new(RecordingAcker::default());
        let intake = IntakeBuffer::new(tx, acker.clone(), 1000);

        intake.accept(raw(1, b"x"));
        intake.accept(raw(2, b""));
        intake.accept(raw(3, b"y"));

        // All three acked, only two buffered.
        assert_eq!(acker.acked.lock().as_slice(), &[(0, 1), (0, 2), (0, 3)]);
        assert_eq!(intake.pending(), 2);
    }

    #[tokio::test]
    async fn flush_chunks_preserve_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let intake = IntakeBuffer::new(tx, Arc::new(RecordingAcker::default()), 1000);

        for offset in 0..2500 {
            intake.accept(raw(offset, b"payload"));
        }
        intake.flush().await.unwrap();
        assert_eq!(intake.pending(), 0);

        let mut sizes = Vec::new();
        let mut offsets = Vec::new();
        let mut trigger_ids = Vec::new();
        while let Ok(batch) = rx.try_recv() {
            sizes.push(batch.events.len());
            trigger_ids.push(batch.trigger_id);
            offsets.extend(batch.events.iter().map(|e| e.offset));
        }
        assert_eq!(sizes, vec![1000, 1000, 500]);
        assert_eq!(offsets, (0..2500).collect::<Vec<_>>());
        // One flush, one trigger id across all chunks.
        assert!(trigger_ids.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn overlapping_flushes_never_interleave_chunks() {
        // chunk_size 1 and a capacity-1 channel force the first flush to
        // block mid-hand-off; an event accepted and flushed during that
        // window must still come out after every earlier event.
        let (tx, mut rx) = mpsc::channel(1);
        let intake = Arc::new(IntakeBuffer::new(
            tx,
            Arc::new(RecordingAcker::default()),
            1,
        ));

        for offset in 0..3 {
            intake.accept(raw(offset, b"x"));
        }
        let first = {
            let intake = Arc::clone(&intake);
            tokio::spawn(async move { intake.flush().await })
        };
        // Let the first flush swap and block on the full channel.
        tokio::task::yield_now().await;

        intake.accept(raw(3, b"x"));
        let second = {
            let intake = Arc::clone(&intake);
            tokio::spawn(async move { intake.flush().await })
        };

        let mut offsets = Vec::new();
        while offsets.len() < 4 {
            let batch = rx.recv().await.expect("channel closed early");
            offsets.extend(batch.events.iter().map(|e| e.offset));
        }
        assert_eq!(offsets, vec![0, 1, 2, 3]);
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn flush_of_empty_buffer_sends_nothing() {
        let (tx, mut rx) = mpsc::channel(1);
        let intake = IntakeBuffer::new(tx, Arc::new(RecordingAcker::default()), 1000);
        intake.flush().await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn flush_after_receiver_dropped_reports_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let intake = IntakeBuffer::new(tx, Arc::new(RecordingAcker::default()), 1000);
        intake.accept(raw(1, b"x"));
        let err = intake.flush().await.unwrap_err();
        assert!(matches!(err, TransferError::ChannelClosed(_)));
    }
}
