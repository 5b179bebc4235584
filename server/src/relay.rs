//! Single-dispatch relay logic.
//!
//! Socket tasks turn frames into [`RelayEvent`]s; one task feeds them to a
//! [`Relay`] in arrival order. Nothing here awaits, so every event is handled
//! to completion before the next one starts.

use crate::registry::{Departure, SessionRegistry};
use crate::session::{ConnectionId, SessionCode};
use log::{debug, error, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use shared::protocol::{INVALID_OR_FULL_CODE, PEER_DISCONNECTED};
use shared::ServerMessage;
use tokio::sync::mpsc;

/// Events sent from socket tasks to the dispatcher
#[derive(Debug)]
pub enum RelayEvent {
    Connected {
        conn_id: ConnectionId,
        sender: mpsc::UnboundedSender<String>,
    },
    Text {
        conn_id: ConnectionId,
        text: String,
    },
    Closed {
        conn_id: ConnectionId,
    },
}

/// What an inbound frame asks the relay to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Create,
    Join { code: SessionCode },
    /// `move` and `score`, forwarded as received.
    Forward,
}

impl Inbound {
    /// Classifies a text frame. Returns None for anything that is not a JSON
    /// object with a known string `t`.
    pub fn parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        let kind = value.get("t")?.as_str()?;

        match kind {
            "create" => Some(Inbound::Create),
            "join" => {
                let raw = match value.get("code") {
                    Some(Value::String(code)) => code.clone(),
                    Some(Value::Number(code)) => code.to_string(),
                    _ => String::new(),
                };
                Some(Inbound::Join {
                    code: SessionCode::normalize(&raw),
                })
            }
            "move" | "score" => Some(Inbound::Forward),
            _ => None,
        }
    }
}

pub struct Relay {
    registry: SessionRegistry,
    rng: StdRng,
}

impl Relay {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Relay drawing session codes from `rng`.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            registry: SessionRegistry::new(),
            rng,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn handle_event(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Connected { conn_id, sender } => {
                debug!("Connection {} opened", conn_id);
                self.registry.register_connection(conn_id, sender);
            }
            RelayEvent::Text { conn_id, text } => self.handle_text(conn_id, text),
            RelayEvent::Closed { conn_id } => {
                debug!("Connection {} closed", conn_id);
                if let Some(departure) = self.registry.remove_connection(conn_id) {
                    self.notify_departure(departure);
                }
            }
        }
    }

    fn handle_text(&mut self, conn_id: ConnectionId, text: String) {
        let Some(inbound) = Inbound::parse(&text) else {
            debug!("Dropping malformed frame from connection {}", conn_id);
            return;
        };

        match inbound {
            Inbound::Create => {
                let Some(created) = self.registry.create_session(conn_id, &mut self.rng) else {
                    return;
                };
                if let Some(departure) = created.left {
                    self.notify_departure(departure);
                }
                self.send(
                    conn_id,
                    &ServerMessage::Created {
                        code: created.code.to_string(),
                    },
                );
            }

            Inbound::Join { code } => match self.registry.join_session(conn_id, &code) {
                Ok(joined) => {
                    if let Some(departure) = joined.left {
                        self.notify_departure(departure);
                    }
                    for member in joined.members {
                        self.send(member, &ServerMessage::Start);
                    }
                }
                Err(e) => {
                    warn!("Connection {} failed to join: {}", conn_id, e);
                    self.send(conn_id, &ServerMessage::error(INVALID_OR_FULL_CODE));
                }
            },

            Inbound::Forward => match self.registry.peer_of(conn_id) {
                Some(peer) => {
                    debug!("Relaying {} -> {}", conn_id, peer);
                    if !self.registry.send_to(peer, text) {
                        debug!("Connection {} is gone, relayed frame dropped", peer);
                    }
                }
                None => debug!("No peer for connection {}, dropping frame", conn_id),
            },
        }
    }

    fn notify_departure(&self, departure: Departure) {
        if let Some(peer) = departure.peer {
            self.send(peer, &ServerMessage::error(PEER_DISCONNECTED));
        }
    }

    fn send(&self, conn_id: ConnectionId, msg: &ServerMessage) {
        match msg.encode() {
            Ok(text) => {
                if !self.registry.send_to(conn_id, text) {
                    debug!("Connection {} is gone, message dropped", conn_id);
                }
            }
            Err(e) => error!("Failed to encode message for {}: {}", conn_id, e),
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}
