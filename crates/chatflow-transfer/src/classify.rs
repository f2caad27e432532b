//! Per-conversation event classification.
//!
//! Pure functions: given a conversation key and the events that arrived for
//! it, split them into the five lists the fan-out writer consumes. No
//! hidden state, so the same inputs always classify the same way.
//!
//! Classification rules, applied once per event in arrival order:
//!
//! - A notification (`IS_NOTIFICATION`) is duplicated into a notification
//!   copy; if it also carries `IS_SEND_MSG`, the original has both flags
//!   cleared and re-enters the message stream under the post-clear flags.
//! - The storage rule ([`is_storable`]) places each aspect copy into its
//!   storage or non-storage list.
//! - Reactions additionally land, with their original flags, in the modify
//!   list; this is independent of the aspect placement.

use chatflow_core::{ChatEvent, Options};

/// The five ordered lists derived from one conversation's batch.
///
/// Relative order within each list matches arrival order.
#[derive(Debug, Default)]
pub struct ClassifiedSet {
    pub storage_msgs: Vec<ChatEvent>,
    pub non_storage_msgs: Vec<ChatEvent>,
    pub storage_notifications: Vec<ChatEvent>,
    pub non_storage_notifications: Vec<ChatEvent>,
    pub modify_msgs: Vec<ChatEvent>,
}

impl ClassifiedSet {
    /// Total entries across the four aspect lists (excludes modify, which
    /// duplicates events already counted).
    pub fn aspect_len(&self) -> usize {
        self.storage_msgs.len()
            + self.non_storage_msgs.len()
            + self.storage_notifications.len()
            + self.non_storage_notifications.len()
    }
}

/// Storage rule for one event with respect to conversation key `key`.
///
/// Storable when the event is marked history, or when it is the sender's
/// own single-user mirror copy: sender-sync disabled and the conversation
/// key equal to the sender id.
pub fn is_storable(key: &str, event: &ChatEvent) -> bool {
    let opts = event.options();
    if opts.is_history() {
        return true;
    }
    !opts.is_sender_sync() && key == event.send_id
}

/// Classifies one conversation's events in arrival order.
pub fn classify(key: &str, events: Vec<ChatEvent>) -> ClassifiedSet {
    let mut set = ClassifiedSet::default();
    for mut event in events {
        // Reactions ride the modify list with their flags untouched, in
        // addition to whatever aspect list they land in below.
        if event.is_reaction() {
            set.modify_msgs.push(event.clone());
        }

        let opts = event.options();
        if opts.is_notification() {
            let notification = event.clone();
            if is_storable(key, &notification) {
                set.storage_notifications.push(notification);
            } else {
                set.non_storage_notifications.push(notification);
            }
            if opts.is_send_msg() {
                // Split the wrapped message out: it re-enters the message
                // stream as an ordinary event, judged on the cleared flags.
                event.set_options(opts.difference(Options::IS_NOTIFICATION | Options::IS_SEND_MSG));
                if is_storable(key, &event) {
                    set.storage_msgs.push(event);
                } else {
                    set.non_storage_msgs.push(event);
                }
            }
        } else if is_storable(key, &event) {
            set.storage_msgs.push(event);
        } else {
            set.non_storage_msgs.push(event);
        }
    }
    set
}
