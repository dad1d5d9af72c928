use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::clock::wall_clock_time;

/// Recipient meaning "everyone in the room"
pub const BROADCAST_TARGET: &str = "Todos";

/// Kind of chat event stored in the message log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageType {
    /// Public message, readable by everyone
    Message,
    /// Message addressed to a single participant
    PrivateMessage,
    /// System-generated join/leave notice
    Status,
}

/// A single entry of the message log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageModel {
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub time: String, // HH:mm:ss at creation
}

impl MessageModel {
    /// Creates a message stamped with the current wall-clock time
    pub fn new(from: String, to: String, text: String, message_type: MessageType) -> Self {
        Self {
            from,
            to,
            text,
            message_type,
            time: wall_clock_time(),
        }
    }

    /// Creates a broadcast status notice on behalf of `name`
    pub fn status(name: &str, text: &str) -> Self {
        Self::new(
            name.to_string(),
            BROADCAST_TARGET.to_string(),
            text.to_string(),
            MessageType::Status,
        )
    }
}
