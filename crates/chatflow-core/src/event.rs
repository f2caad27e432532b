//! Event types flowing through the transfer pipeline.
//!
//! Two representations exist:
//!
//! - [`RawEvent`]: what the partitioned-log client delivers — an opaque
//!   payload plus a routing key and positional metadata. Immutable once
//!   received; `partition`/`offset` are used only to acknowledge receipt.
//! - [`ChatEvent`]: the payload decoded into a structured chat event.
//!
//! `ChatEvent` is a hand-derived prost message, so the wire format stays
//! protobuf-compatible with the producing side without a build script.

use bytes::Bytes;
use prost::Message;

use crate::options::Options;
use crate::Result;

/// Content type constants for [`ChatEvent::content_type`].
///
/// Only the types the pipeline dispatches on are named here; all other
/// values pass through untouched.
pub mod content_type {
    /// Ordinary text message.
    pub const TEXT: i32 = 101;
    /// A reaction was added to an existing message.
    pub const REACTION_ADD: i32 = 108;
    /// A reaction was removed from an existing message.
    pub const REACTION_DELETE: i32 = 109;
}

/// The unit delivered by the log client for one partition assignment.
///
/// `key` is the conversation/aggregation identifier (a group id, or a user
/// id for single-chat fan-out). Per-key ordering downstream relies on the
/// log delivering events for one key in order within a partition.
#[derive(Debug, Clone)]
pub struct RawEvent {
    /// Routing key: the conversation/aggregation identifier.
    pub key: String,
    /// Opaque payload; decodes into a [`ChatEvent`].
    pub payload: Bytes,
    /// Trace/header metadata propagated from the producer.
    pub headers: Vec<(String, String)>,
    /// Partition this event was delivered on.
    pub partition: i32,
    /// Offset within the partition, used only for acknowledgement.
    pub offset: i64,
}

impl RawEvent {
    /// Looks up a header value by name (first match wins).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A decoded chat event.
///
/// Field numbers are part of the wire contract; do not renumber.
#[derive(Clone, PartialEq, Message)]
pub struct ChatEvent {
    /// Sender user id.
    #[prost(string, tag = "1")]
    pub send_id: String,
    /// Target conversation id (group id, or peer user id for single chat).
    #[prost(string, tag = "2")]
    pub conversation_id: String,
    /// Client-assigned message id, stable across redelivery.
    #[prost(string, tag = "3")]
    pub client_msg_id: String,
    /// Send time, milliseconds since the Unix epoch.
    #[prost(int64, tag = "4")]
    pub send_time: i64,
    /// Content type; see [`content_type`].
    #[prost(int32, tag = "5")]
    pub content_type: i32,
    /// Option bitmask; see [`Options`].
    #[prost(uint32, tag = "6")]
    pub options: u32,
    /// Message body, opaque to the pipeline.
    #[prost(bytes = "bytes", tag = "7")]
    pub content: Bytes,
}

impl ChatEvent {
    /// Decodes an event from a raw payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        Ok(ChatEvent::decode(payload)?)
    }

    /// The option bitmask as typed flags. Unknown bits are retained.
    pub fn options(&self) -> Options {
        Options::from_bits_retain(self.options)
    }

    /// Replaces the option bitmask.
    pub fn set_options(&mut self, options: Options) {
        self.options = options.bits();
    }

    /// Whether this event is a reaction add/remove that must be propagated
    /// through the modify queue.
    pub fn is_reaction(&self) -> bool {
        self.content_type == content_type::REACTION_ADD
            || self.content_type == content_type::REACTION_DELETE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_round_trip() {
        let event = ChatEvent {
            send_id: "u1".to_string(),
            conversation_id: "g42".to_string(),
            client_msg_id: "m-1".to_string(),
            send_time: 1_700_000_000_000,
            content_type: content_type::TEXT,
            options: (Options::IS_HISTORY | Options::IS_SENDER_SYNC).bits(),
            content: Bytes::from_static(b"hello"),
        };
        let payload = event.encode_to_vec();
        let decoded = ChatEvent::from_payload(&payload).unwrap();
        assert_eq!(decoded, event);
        assert!(decoded.options().is_history());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(ChatEvent::from_payload(&[0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn header_lookup() {
        let raw = RawEvent {
            key: "g1".to_string(),
            payload: Bytes::new(),
            headers: vec![("operation_id".to_string(), "op-7".to_string())],
            partition: 0,
            offset: 12,
        };
        assert_eq!(raw.header("operation_id"), Some("op-7"));
        assert_eq!(raw.header("missing"), None);
    }

    #[test]
    fn reaction_detection() {
        let mut event = ChatEvent::default();
        event.content_type = content_type::REACTION_ADD;
        assert!(event.is_reaction());
        event.content_type = content_type::REACTION_DELETE;
        assert!(event.is_reaction());
        event.content_type = content_type::TEXT;
        assert!(!event.is_reaction());
    }
}
