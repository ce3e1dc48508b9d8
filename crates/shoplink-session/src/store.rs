//! # Session Store
//!
//! In-memory registry of active sessions, keyed by session id.
//!
//! ## Concurrency
//! A single async RwLock over the map. Reads clone the session out, so
//! callers never hold the lock across an HTTP round trip; writers
//! re-check state inside the lock, which makes state transitions the
//! only commit point. Two actors racing to complete the same session
//! resolve at `take_if`: exactly one gets the session, the other
//! sees it as already gone.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::state::Session;

/// Shared session registry.
///
/// A missing session is never an error condition here: continuations of
/// external calls re-enter the store after arbitrary delays, and the
/// session may have been completed or cancelled by a racing operation
/// in the meantime. Whichever operation removed the entry won.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session, replacing any previous entry under its id.
    pub async fn insert(&self, session: Session) {
        debug!(session_id = %session.id, player_id = %session.player_id, "Session registered");
        self.sessions.write().await.insert(session.id, session);
    }

    /// A clone of the session, if it exists.
    pub async fn get(&self, id: Uuid) -> Option<Session> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// The open-or-later session belonging to `player_id`, if any.
    /// A player has at most one; insertion replaces by session id, and
    /// the workflow cancels the old session before opening a new one.
    pub async fn find_for_player(&self, player_id: &str) -> Option<Session> {
        self.sessions
            .read()
            .await
            .values()
            .find(|s| s.player_id == player_id)
            .cloned()
    }

    /// Applies `mutate` to the stored session under the write lock.
    /// Returns None if the session is gone.
    pub async fn update<T>(
        &self,
        id: Uuid,
        mutate: impl FnOnce(&mut Session) -> T,
    ) -> Option<T> {
        self.sessions.write().await.get_mut(&id).map(mutate)
    }

    /// Removes and returns the session.
    pub async fn remove(&self, id: Uuid) -> Option<Session> {
        let removed = self.sessions.write().await.remove(&id);
        if removed.is_some() {
            debug!(session_id = %id, "Session removed");
        }
        removed
    }

    /// Removes the session only if `predicate` holds for it.
    ///
    /// This is the winner-takes-the-session primitive: of two actors
    /// racing to finish a session, exactly one take succeeds, and the
    /// loser sees the session as already gone.
    pub async fn take_if(
        &self,
        id: Uuid,
        predicate: impl FnOnce(&Session) -> bool,
    ) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        if sessions.get(&id).is_some_and(predicate) {
            sessions.remove(&id)
        } else {
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
