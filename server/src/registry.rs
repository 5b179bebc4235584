//! Connection and session bookkeeping for the relay
//!
//! This module owns all relay state:
//! - Open connections with their outbound channel and bound session code
//! - Sessions keyed by share code, holding at most two members
//! - Transitions between unbound, waiting and active connections
//!
//! The registry is owned by a single dispatcher task, so none of its methods
//! lock. Removing any member of a session removes the whole session.

use crate::session::{ConnectionId, Session, SessionCode};
use log::info;
use rand::Rng;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::mpsc;

/// An open connection as seen by the relay
///
/// Holds the sending half of the connection's outbound queue and the code of
/// the session it currently belongs to, if any.
#[derive(Debug)]
pub struct Connection {
    /// Identifier assigned when the socket was accepted
    pub id: ConnectionId,
    /// Outbound text frames, drained by the socket writer task
    pub sender: mpsc::UnboundedSender<String>,
    /// Session this connection is bound to
    pub session: Option<SessionCode>,
}

impl Connection {
    pub fn new(id: ConnectionId, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            sender,
            session: None,
        }
    }

    /// True while the socket writer is still draining this connection's queue.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Why a join was refused. Every variant is reported to the client with the
/// same "Invalid or full code" text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("no session with code {0}")]
    NotFound(SessionCode),
    #[error("session {0} already has two players")]
    Full(SessionCode),
    #[error("connection is already a member of session {0}")]
    AlreadyMember(SessionCode),
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
}

/// A session torn down because one of its members left it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// Code of the removed session
    pub code: SessionCode,
    /// Remaining member that should hear about it
    pub peer: Option<ConnectionId>,
}

/// Result of a successful `create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub code: SessionCode,
    /// Session the creator was bound to before, now removed
    pub left: Option<Departure>,
}

/// Result of a successful `join`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub code: SessionCode,
    /// Both members in seat order, creator first
    pub members: Vec<ConnectionId>,
    /// Session the joiner was bound to before, now removed
    pub left: Option<Departure>,
}

/// Owned registry of connections and the sessions pairing them
///
/// Every mutation goes through an explicit operation here, keeping the
/// per-connection session tag and the session member lists consistent:
/// a connection's `session` is `Some(code)` exactly when it is listed in the
/// members of the session stored under `code`.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Open connections indexed by their identifier
    connections: HashMap<ConnectionId, Connection>,
    /// Live sessions indexed by share code
    sessions: HashMap<SessionCode, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a newly accepted connection, initially unbound.
    pub fn register_connection(
        &mut self,
        conn_id: ConnectionId,
        sender: mpsc::UnboundedSender<String>,
    ) {
        self.connections
            .insert(conn_id, Connection::new(conn_id, sender));
    }

    /// Forgets a closed connection
    ///
    /// If it was bound to a session, that session is removed and the departure
    /// is returned so the caller can notify the remaining member.
    pub fn remove_connection(&mut self, conn_id: ConnectionId) -> Option<Departure> {
        let departure = self.leave_session(conn_id);
        self.connections.remove(&conn_id);
        departure
    }

    /// Opens a new waiting session with `conn_id` as its only member
    ///
    /// Codes are drawn from `rng` until one is not in use. A connection
    /// already bound to a session leaves it first. Returns None for unknown
    /// connections.
    pub fn create_session<R: Rng + ?Sized>(
        &mut self,
        conn_id: ConnectionId,
        rng: &mut R,
    ) -> Option<Created> {
        if !self.connections.contains_key(&conn_id) {
            return None;
        }

        let left = self.leave_session(conn_id);

        let code = loop {
            let candidate = SessionCode::generate(rng);
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        self.sessions
            .insert(code.clone(), Session::new(code.clone(), conn_id));
        if let Some(conn) = self.connections.get_mut(&conn_id) {
            conn.session = Some(code.clone());
        }

        info!("Connection {} created session {}", conn_id, code);
        Some(Created { code, left })
    }

    /// Seats `conn_id` in the waiting session named `code`
    ///
    /// Refusals leave every session untouched, including the one the
    /// connection may already be bound to. On success that previous binding
    /// is released first.
    pub fn join_session(
        &mut self,
        conn_id: ConnectionId,
        code: &SessionCode,
    ) -> Result<Joined, JoinError> {
        if !self.connections.contains_key(&conn_id) {
            return Err(JoinError::UnknownConnection(conn_id));
        }

        let session = self
            .sessions
            .get(code)
            .ok_or_else(|| JoinError::NotFound(code.clone()))?;
        if session.contains(conn_id) {
            return Err(JoinError::AlreadyMember(code.clone()));
        }
        if session.is_full() {
            return Err(JoinError::Full(code.clone()));
        }

        let left = self.leave_session(conn_id);

        let session = self
            .sessions
            .get_mut(code)
            .ok_or_else(|| JoinError::NotFound(code.clone()))?;
        session.members.push(conn_id);
        let members = session.members.clone();

        if let Some(conn) = self.connections.get_mut(&conn_id) {
            conn.session = Some(code.clone());
        }

        info!("Connection {} joined session {}", conn_id, code);
        Ok(Joined {
            code: code.clone(),
            members,
            left,
        })
    }

    /// Removes the session `conn_id` is bound to, unbinding every member.
    pub fn leave_session(&mut self, conn_id: ConnectionId) -> Option<Departure> {
        let code = self.connections.get_mut(&conn_id)?.session.take()?;
        let session = self.sessions.remove(&code)?;

        for member in &session.members {
            if let Some(conn) = self.connections.get_mut(member) {
                conn.session = None;
            }
        }

        if session.is_waiting() {
            info!("Session {} closed before anyone joined", code);
        } else {
            info!("Session {} closed", code);
        }
        Some(Departure {
            peer: session.peer_of(conn_id),
            code,
        })
    }

    /// The other member of `conn_id`'s session.
    pub fn peer_of(&self, conn_id: ConnectionId) -> Option<ConnectionId> {
        let code = self.session_of(conn_id)?;
        self.sessions.get(code)?.peer_of(conn_id)
    }

    pub fn session_of(&self, conn_id: ConnectionId) -> Option<&SessionCode> {
        self.connections.get(&conn_id)?.session.as_ref()
    }

    pub fn session(&self, code: &SessionCode) -> Option<&Session> {
        self.sessions.get(code)
    }

    pub fn is_open(&self, conn_id: ConnectionId) -> bool {
        self.connections
            .get(&conn_id)
            .map_or(false, Connection::is_open)
    }

    /// Queues a text frame for `conn_id`. Returns false if the connection is
    /// unknown or its writer has gone away.
    pub fn send_to(&self, conn_id: ConnectionId, text: String) -> bool {
        match self.connections.get(&conn_id) {
            Some(conn) if conn.is_open() => conn.sender.send(text).is_ok(),
            _ => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn registry_with(ids: &[ConnectionId]) -> (SessionRegistry, Vec<mpsc::UnboundedReceiver<String>>) {
        let mut registry = SessionRegistry::new();
        let mut receivers = Vec::new();
        for id in ids {
            let (tx, rx) = mpsc::unbounded_channel();
            registry.register_connection(*id, tx);
            receivers.push(rx);
        }
        (registry, receivers)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_create_binds_creator() {
        let (mut registry, _rx) = registry_with(&[1]);
        let created = registry.create_session(1, &mut rng()).unwrap();

        assert_eq!(created.left, None);
        assert_eq!(registry.session_of(1), Some(&created.code));
        let session = registry.session(&created.code).unwrap();
        assert_eq!(session.members, vec![1]);
        assert!(session.is_waiting());
        assert_eq!(registry.peer_of(1), None);
    }

    #[test]
    fn test_create_for_unknown_connection() {
        let (mut registry, _rx) = registry_with(&[]);
        assert!(registry.create_session(9, &mut rng()).is_none());
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn test_codes_are_unique_among_live_sessions() {
        let ids: Vec<ConnectionId> = (1..=200).collect();
        let (mut registry, _rx) = registry_with(&ids);
        let mut rng = rng();

        for id in &ids {
            registry.create_session(*id, &mut rng).unwrap();
        }
        assert_eq!(registry.session_count(), ids.len());
    }

    #[test]
    fn test_join_activates_session() {
        let (mut registry, _rx) = registry_with(&[1, 2]);
        let code = registry.create_session(1, &mut rng()).unwrap().code;

        let joined = registry.join_session(2, &code).unwrap();
        assert_eq!(joined.members, vec![1, 2]);
        assert_eq!(joined.left, None);
        assert_eq!(registry.peer_of(1), Some(2));
        assert_eq!(registry.peer_of(2), Some(1));
        assert!(registry.session(&code).unwrap().is_full());
    }

    #[test]
    fn test_join_is_case_insensitive() {
        let (mut registry, _rx) = registry_with(&[1, 2]);
        let code = registry.create_session(1, &mut rng()).unwrap().code;
        let typed = SessionCode::normalize(&code.as_str().to_ascii_lowercase());

        assert!(registry.join_session(2, &typed).is_ok());
    }

    #[test]
    fn test_join_unknown_code_changes_nothing() {
        let (mut registry, _rx) = registry_with(&[1, 2]);
        let code = registry.create_session(1, &mut rng()).unwrap().code;
        let missing = SessionCode::normalize("ZZZZZ");
        assert_ne!(code, missing);

        let err = registry.join_session(2, &missing).unwrap_err();
        assert_eq!(err, JoinError::NotFound(missing));
        assert_eq!(registry.session_count(), 1);
        assert_eq!(registry.session(&code).unwrap().members, vec![1]);
        assert_eq!(registry.session_of(2), None);
    }

    #[test]
    fn test_join_full_session_changes_nothing() {
        let (mut registry, _rx) = registry_with(&[1, 2, 3]);
        let code = registry.create_session(1, &mut rng()).unwrap().code;
        registry.join_session(2, &code).unwrap();

        let err = registry.join_session(3, &code).unwrap_err();
        assert_eq!(err, JoinError::Full(code.clone()));
        assert_eq!(registry.session(&code).unwrap().members, vec![1, 2]);
        assert_eq!(registry.session_of(3), None);
    }

    #[test]
    fn test_join_own_session_is_refused() {
        let (mut registry, _rx) = registry_with(&[1]);
        let code = registry.create_session(1, &mut rng()).unwrap().code;

        let err = registry.join_session(1, &code).unwrap_err();
        assert_eq!(err, JoinError::AlreadyMember(code.clone()));
        assert_eq!(registry.session(&code).unwrap().members, vec![1]);
    }

    #[test]
    fn test_failed_join_keeps_existing_binding() {
        let (mut registry, _rx) = registry_with(&[1]);
        let code = registry.create_session(1, &mut rng()).unwrap().code;

        assert!(registry
            .join_session(1, &SessionCode::normalize("00000"))
            .is_err());
        assert_eq!(registry.session_of(1), Some(&code));
    }

    #[test]
    fn test_rejoin_elsewhere_releases_old_session() {
        let (mut registry, _rx) = registry_with(&[1, 2, 3]);
        let mut rng = rng();
        let first = registry.create_session(1, &mut rng).unwrap().code;
        registry.join_session(2, &first).unwrap();
        let second = registry.create_session(3, &mut rng).unwrap().code;

        let joined = registry.join_session(2, &second).unwrap();
        assert_eq!(
            joined.left,
            Some(Departure {
                code: first.clone(),
                peer: Some(1),
            })
        );
        assert!(registry.session(&first).is_none());
        assert_eq!(registry.session_of(1), None);
        assert_eq!(registry.peer_of(2), Some(3));
    }

    #[test]
    fn test_recreate_releases_old_session() {
        let (mut registry, _rx) = registry_with(&[1]);
        let mut rng = rng();
        let first = registry.create_session(1, &mut rng).unwrap().code;
        let created = registry.create_session(1, &mut rng).unwrap();

        assert_eq!(
            created.left,
            Some(Departure {
                code: first.clone(),
                peer: None,
            })
        );
        assert!(registry.session(&first).is_none());
        assert_eq!(registry.session_count(), 1);
    }

    #[test]
    fn test_remove_member_removes_whole_session() {
        let (mut registry, _rx) = registry_with(&[1, 2]);
        let code = registry.create_session(1, &mut rng()).unwrap().code;
        registry.join_session(2, &code).unwrap();

        let departure = registry.remove_connection(2).unwrap();
        assert_eq!(departure.code, code);
        assert_eq!(departure.peer, Some(1));
        assert!(registry.session(&code).is_none());
        assert_eq!(registry.session_of(1), None);
        assert_eq!(registry.peer_of(1), None);
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn test_remove_unbound_connection() {
        let (mut registry, _rx) = registry_with(&[1]);
        assert_eq!(registry.remove_connection(1), None);
        assert_eq!(registry.remove_connection(1), None);
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn test_send_to_open_and_closed_connections() {
        let (registry, mut receivers) = registry_with(&[1, 2]);

        assert!(registry.send_to(1, "hello".to_string()));
        assert_eq!(receivers[0].try_recv().unwrap(), "hello");

        let closed = receivers.remove(1);
        drop(closed);
        assert!(!registry.is_open(2));
        assert!(!registry.send_to(2, "lost".to_string()));
        assert!(!registry.send_to(3, "nobody".to_string()));
    }
}
