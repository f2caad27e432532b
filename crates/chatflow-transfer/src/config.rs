//! Transfer pipeline configuration.
//!
//! Defaults match the production tuning the pipeline was designed around:
//! 100 lanes, lane queues of 50, 1000-event chunks, 100ms flush cadence.
//!
//! ## Usage
//!
//! ```ignore
//! use chatflow_transfer::TransferConfig;
//!
//! // Defaults
//! let config = TransferConfig::default();
//!
//! // From environment (CHATFLOW_* variables, see from_env)
//! let config = TransferConfig::from_env();
//!
//! // Overriding a single knob
//! let config = TransferConfig {
//!     lane_count: 16,
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Number of fixed lane workers (default: 100). Routing is a hash of
    /// the conversation key modulo this count, so changing it re-shards the
    /// key space on restart.
    #[serde(default = "default_lane_count")]
    pub lane_count: usize,

    /// Capacity of each lane's inbound queue (default: 50). A full lane
    /// queue blocks the router, and transitively the intake buffer.
    #[serde(default = "default_lane_queue_capacity")]
    pub lane_queue_capacity: usize,

    /// Maximum events per chunk handed to the router (default: 1000).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Flush period for the intake buffer in milliseconds (default: 100).
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Log topic the host subscribes to. Carried for the host process; the
    /// log client itself is external.
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Consumer group id for the log subscription.
    #[serde(default = "default_group_id")]
    pub group_id: String,
}

fn default_lane_count() -> usize {
    100
}

fn default_lane_queue_capacity() -> usize {
    50
}

fn default_chunk_size() -> usize {
    1000
}

fn default_flush_interval_ms() -> u64 {
    100
}

fn default_topic() -> String {
    "chat-events".to_string()
}

fn default_group_id() -> String {
    "chatflow-transfer".to_string()
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            lane_count: default_lane_count(),
            lane_queue_capacity: default_lane_queue_capacity(),
            chunk_size: default_chunk_size(),
            flush_interval_ms: default_flush_interval_ms(),
            topic: default_topic(),
            group_id: default_group_id(),
        }
    }
}

impl TransferConfig {
    /// Builds a config from environment variables, falling back to defaults:
    ///
    /// - `CHATFLOW_LANES`
    /// - `CHATFLOW_LANE_QUEUE_CAPACITY`
    /// - `CHATFLOW_CHUNK_SIZE`
    /// - `CHATFLOW_FLUSH_INTERVAL_MS`
    /// - `CHATFLOW_TOPIC`
    /// - `CHATFLOW_GROUP_ID`
    pub fn from_env() -> Self {
        fn parsed<T: std::str::FromStr>(name: &str, fallback: T) -> T {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(fallback)
        }

        Self {
            lane_count: parsed("CHATFLOW_LANES", default_lane_count()),
            lane_queue_capacity: parsed(
                "CHATFLOW_LANE_QUEUE_CAPACITY",
                default_lane_queue_capacity(),
            ),
            chunk_size: parsed("CHATFLOW_CHUNK_SIZE", default_chunk_size()),
            flush_interval_ms: parsed("CHATFLOW_FLUSH_INTERVAL_MS", default_flush_interval_ms()),
            topic: std::env::var("CHATFLOW_TOPIC").unwrap_or_else(|_| default_topic()),
            group_id: std::env::var("CHATFLOW_GROUP_ID").unwrap_or_else(|_| default_group_id()),
        }
    }

    /// Flush period as a `Duration`.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}
