//! Message-transfer pipeline: the hot path between the partitioned log and
//! the chat backend's storage/push systems.
//!
//! ## Architecture
//!
//! Data flows strictly left to right, one component depending only on the
//! one before it:
//!
//! ```text
//! log client ──▶ IntakeBuffer ──▶ DistributionRouter ──▶ Lane 0..N ──▶ FanoutWriter
//!                (100ms swap,      (decode, group by      (classify)    (cache write +
//!                 1000-chunk)       key, SipHash % N)                    seq assign,
//!                                                                        storage/push/
//!                                                                        modify queues)
//! ```
//!
//! - [`intake::IntakeBuffer`] accumulates raw deliveries and hands ordered
//!   chunks to the router through a bounded channel (primary backpressure
//!   point).
//! - [`router`] decodes and groups events by conversation key, then routes
//!   each group to one of N fixed lanes by a deterministic hash of the key
//!   (secondary backpressure point). Same key, same lane, always — this is
//!   what keeps per-conversation ordering intact under concurrency.
//! - Lane workers classify each group into storage/non-storage message and
//!   notification lists plus a reaction modify list, then drive the
//!   [`fanout::FanoutWriter`].
//! - The writer batches storable events into the cache (obtaining the
//!   assigned sequence range) and fans results out to the durable-storage,
//!   push, and modify queues, keeping success/failure counters.
//!
//! ## Delivery contract
//!
//! Offsets are acknowledged the moment an event is accepted into the intake
//! buffer, before any write succeeds: at-least-once from the log,
//! at-most-once into storage. A crash between ack and cache write loses that
//! batch; correctness is observed through counters and logs, never through a
//! synchronous error to the host.
//!
//! External collaborators (log client, cache driver, downstream queues) are
//! reached through the traits in [`sink`].

pub mod classify;
pub mod config;
pub mod counters;
pub mod error;
pub mod fanout;
pub mod intake;
pub mod router;
pub mod sink;
pub mod transfer;

mod lane;

pub use classify::{classify, is_storable, ClassifiedSet};
pub use config::TransferConfig;
pub use counters::{CounterSnapshot, TransferCounters};
pub use error::{Result, TransferError};
pub use fanout::{Aspect, FanoutWriter};
pub use intake::IntakeBuffer;
pub use sink::{MsgCache, MsgSinks, ModifyQueue, OffsetAcker, PushQueue, StorageQueue};
pub use transfer::MsgTransfer;
