use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Prefix that reclassifies a message as a third-person action.
const ACTION_PREFIX: &str = "/me ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Normal,
    Action,
}

/// A single log entry in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    /// Displayed sender. For actions this is the sender's alias.
    pub sender: String,
    pub sender_alias: String,
    /// Unix seconds.
    pub timestamp: u64,
    pub direction: Direction,
    pub kind: MessageKind,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl Message {
    /// Wrap raw message text, applying the `/me ` action convention.
    ///
    /// A leading action prefix is stripped, the kind becomes [`MessageKind::Action`]
    /// and the displayed sender is rewritten to `sender_alias`. All other text is
    /// a normal message with the sender left unchanged. A missing timestamp
    /// defaults to now.
    pub fn wrapped(
        text: &str,
        sender: &str,
        sender_alias: &str,
        timestamp: Option<u64>,
        direction: Direction,
    ) -> Self {
        let timestamp = timestamp.unwrap_or_else(now_secs);
        let (kind, text, sender) = if let Some(rest) = text.strip_prefix(ACTION_PREFIX) {
            (MessageKind::Action, rest, sender_alias)
        } else {
            (MessageKind::Normal, text, sender)
        };
        Self {
            text: text.to_string(),
            sender: sender.to_string(),
            sender_alias: sender_alias.to_string(),
            timestamp,
            direction,
            kind,
        }
    }
}
