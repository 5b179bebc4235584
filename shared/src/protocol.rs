//! Wire protocol between the game client and the relay.
//!
//! Every frame is a UTF-8 JSON object whose `t` field names the message type.
//! The relay only inspects `t` (and `code` for joins); `move` and `score`
//! frames are forwarded as received, so peers may add fields freely.

use serde::{Deserialize, Serialize};

pub const INVALID_OR_FULL_CODE: &str = "Invalid or full code";
pub const PEER_DISCONNECTED: &str = "Peer disconnected";

/// Messages a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "lowercase")]
pub enum ClientMessage {
    Create,
    Join { code: String },
    Move(MoveUpdate),
    Score { who: Scorer },
}

/// Messages the relay sends to a client, including relayed peer frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "lowercase")]
pub enum ServerMessage {
    Created { code: String },
    Start,
    Error { message: String },
    Move(MoveUpdate),
    Score { who: Scorer },
}

/// Sender's mallet and puck, already mirrored into the receiver's frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ox: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oy: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub px: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub py: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvx: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvy: Option<f32>,
}

/// Who scored, from the point of view of the sender of a `score` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scorer {
    Me,
    #[serde(other)]
    Opp,
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
