//! Session registry: the live-connection identity table.
//!
//! Every connected client owns exactly one [`Session`]: a display glyph, a
//! reward-points balance, a status tag and (while fighting) the id of its
//! match. The registry is the leaf component of the core; the lobby
//! aggregator, matchmaking queue and match engine all query or mutate it
//! through the orchestrator's single lock domain.

use std::collections::HashMap;

use arena_wire::ServerEvent;
use tokio::sync::mpsc;

use crate::{MatchId, StateError};

/// Session identifier (server-internal, never on the wire).
pub type SessionId = u64;

/// Per-session outbound queue handed over by the transport adapter at
/// registration. Sends are fire-and-forget `try_send`; a full or closed
/// queue is treated as a disconnect.
pub type Outbound = mpsc::Sender<ServerEvent>;

/// Where a session currently sits in the lobby/match lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Searching,
    InCombat,
    Spectating,
}

impl Status {
    /// The legal transition matrix. Everything else is an
    /// [`StateError::InvalidTransition`].
    fn can_transition(self, to: Status) -> bool {
        matches!(
            (self, to),
            (Status::Idle, Status::Searching)
                | (Status::Searching, Status::Idle)
                | (Status::Searching, Status::InCombat)
                | (Status::InCombat, Status::Idle)
                | (Status::Idle, Status::Spectating)
                | (Status::Spectating, Status::Idle)
        )
    }
}

/// One connected client's live state.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    /// Display avatar chosen at login. Unique among live sessions only;
    /// account-level uniqueness is the login collaborator's job.
    pub glyph: String,
    /// Cached reward-points balance, refreshed from the ledger on
    /// registration and after every credit.
    pub points: u32,
    pub status: Status,
    /// Set while `status == InCombat` (and transiently while the match is
    /// being torn down).
    pub match_id: Option<MatchId>,
    pub outbound: Outbound,
}

/// The registry of all currently connected sessions.
#[derive(Debug)]
pub struct Registry {
    sessions: HashMap<SessionId, Session>,
    next_id: SessionId,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Register a new live session under `glyph`.
    ///
    /// Fails with `DuplicateGlyphInUse` if the glyph is already bound to a
    /// different live connection. The caller supplies the ledger balance.
    pub fn register(
        &mut self,
        glyph: &str,
        points: u32,
        outbound: Outbound,
    ) -> Result<SessionId, StateError> {
        if self.sessions.values().any(|s| s.glyph == glyph) {
            return Err(StateError::DuplicateGlyphInUse(glyph.to_string()));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.sessions.insert(
            id,
            Session {
                id,
                glyph: glyph.to_string(),
                points,
                status: Status::Idle,
                match_id: None,
                outbound,
            },
        );
        Ok(id)
    }

    /// Remove a session, returning it for match/queue cleanup by the
    /// orchestrator.
    pub fn deregister(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// The only status mutator. Returns the previous status on success.
    ///
    /// The caller is responsible for rebroadcasting the lobby after any
    /// successful mutation.
    pub fn set_status(&mut self, id: SessionId, to: Status) -> Result<Status, StateError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(StateError::UnknownSession)?;
        if !session.status.can_transition(to) {
            return Err(StateError::InvalidTransition {
                from: session.status,
                to,
            });
        }
        let from = session.status;
        session.status = to;
        Ok(from)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbound() -> Outbound {
        mpsc::channel(8).0
    }

    #[test]
    fn test_register_assigns_unique_ids() {
        let mut registry = Registry::new();
        let a = registry.register("🦊", 0, outbound()).unwrap();
        let b = registry.register("👾", 0, outbound()).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_glyph_rejected_while_live() {
        let mut registry = Registry::new();
        let a = registry.register("🦊", 0, outbound()).unwrap();
        assert!(matches!(
            registry.register("🦊", 0, outbound()),
            Err(StateError::DuplicateGlyphInUse(_))
        ));

        // After the holder disconnects the glyph is free again.
        registry.deregister(a);
        assert!(registry.register("🦊", 0, outbound()).is_ok());
    }

    #[test]
    fn test_legal_transition_cycle() {
        let mut registry = Registry::new();
        let id = registry.register("🦊", 0, outbound()).unwrap();

        assert_eq!(registry.set_status(id, Status::Searching).unwrap(), Status::Idle);
        assert_eq!(
            registry.set_status(id, Status::InCombat).unwrap(),
            Status::Searching
        );
        assert_eq!(registry.set_status(id, Status::Idle).unwrap(), Status::InCombat);
        assert_eq!(
            registry.set_status(id, Status::Spectating).unwrap(),
            Status::Idle
        );
        assert_eq!(
            registry.set_status(id, Status::Idle).unwrap(),
            Status::Spectating
        );
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut registry = Registry::new();
        let id = registry.register("🦊", 0, outbound()).unwrap();

        // Idle cannot jump straight into combat.
        assert!(matches!(
            registry.set_status(id, Status::InCombat),
            Err(StateError::InvalidTransition { .. })
        ));

        // A searcher cannot become a spectator without cancelling first.
        registry.set_status(id, Status::Searching).unwrap();
        assert!(matches!(
            registry.set_status(id, Status::Spectating),
            Err(StateError::InvalidTransition { .. })
        ));

        // A combatant cannot re-enter the queue.
        registry.set_status(id, Status::InCombat).unwrap();
        assert!(matches!(
            registry.set_status(id, Status::Searching),
            Err(StateError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_set_status_unknown_session() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.set_status(99, Status::Searching),
            Err(StateError::UnknownSession)
        ));
    }
}
