//! Session codes and the two-seat session record.

use rand::Rng;
use shared::SESSION_CODE_LEN;
use std::fmt;

/// Connection identifier assigned by the network layer.
pub type ConnectionId = u32;

/// Seats in a session.
pub const MAX_MEMBERS: usize = 2;

const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Short share code naming a session, e.g. `A1B2C`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionCode(String);

impl SessionCode {
    /// Draws a fresh base-36 code.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..SESSION_CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        SessionCode(code)
    }

    /// Normalizes user input into a code; lookups are case-insensitive.
    ///
    /// Surrounding whitespace is dropped too, the same cleanup the client
    /// applies to a typed code before sending it.
    pub fn normalize(raw: &str) -> Self {
        SessionCode(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A waiting or active pairing of connections, creator first.
#[derive(Debug, Clone)]
pub struct Session {
    pub code: SessionCode,
    pub members: Vec<ConnectionId>,
}

impl Session {
    pub fn new(code: SessionCode, creator: ConnectionId) -> Self {
        Self {
            code,
            members: vec![creator],
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.members.len() == 1
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_MEMBERS
    }

    pub fn contains(&self, conn_id: ConnectionId) -> bool {
        self.members.contains(&conn_id)
    }

    /// The other member, if `conn_id` belongs here and has company.
    pub fn peer_of(&self, conn_id: ConnectionId) -> Option<ConnectionId> {
        if !self.contains(conn_id) {
            return None;
        }
        self.members.iter().copied().find(|id| *id != conn_id)
    }
}
