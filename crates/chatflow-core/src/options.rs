//! Per-event delivery/storage option flags.
//!
//! Every chat event carries an `options` bitmask on the wire. The flags are
//! independent: an event can be a notification that also wraps a user-visible
//! message (`IS_NOTIFICATION | IS_SEND_MSG`), a durable history entry
//! (`IS_HISTORY`), or any combination.

use bitflags::bitflags;

bitflags! {
    /// Option bitmask carried on every [`ChatEvent`](crate::ChatEvent).
    ///
    /// Unknown bits received on the wire are preserved round-trip but ignored
    /// by classification.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Options: u32 {
        /// The event must be durably stored and sequence-numbered.
        const IS_HISTORY = 1 << 0;
        /// Echo the event back to the sender's own sessions.
        const IS_SENDER_SYNC = 1 << 1;
        /// The event is a system notification wrapping an inner message.
        const IS_NOTIFICATION = 1 << 2;
        /// The notification also carries a user-visible message that must be
        /// split out into the message stream.
        const IS_SEND_MSG = 1 << 3;
    }
}

impl Options {
    pub fn is_history(self) -> bool {
        self.contains(Options::IS_HISTORY)
    }

    pub fn is_sender_sync(self) -> bool {
        self.contains(Options::IS_SENDER_SYNC)
    }

    pub fn is_notification(self) -> bool {
        self.contains(Options::IS_NOTIFICATION)
    }

    pub fn is_send_msg(self) -> bool {
        self.contains(Options::IS_SEND_MSG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_independent() {
        let opts = Options::IS_NOTIFICATION | Options::IS_SEND_MSG | Options::IS_HISTORY;
        assert!(opts.is_notification());
        assert!(opts.is_send_msg());
        assert!(opts.is_history());
        assert!(!opts.is_sender_sync());
    }

    #[test]
    fn clearing_notification_flags_keeps_history() {
        let opts = Options::IS_NOTIFICATION | Options::IS_SEND_MSG | Options::IS_HISTORY;
        let cleared = opts.difference(Options::IS_NOTIFICATION | Options::IS_SEND_MSG);
        assert!(cleared.is_history());
        assert!(!cleared.is_notification());
        assert!(!cleared.is_send_msg());
    }

    #[test]
    fn unknown_wire_bits_survive_retain() {
        // Bit 8 is not a known flag; from_bits_retain must keep it so the
        // mask can be written back to the wire unchanged.
        let raw = (Options::IS_HISTORY.bits()) | (1 << 8);
        let opts = Options::from_bits_retain(raw);
        assert!(opts.is_history());
        assert_eq!(opts.bits(), raw);
    }
}
