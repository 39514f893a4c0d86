//! The session registry: the single source of truth for player state.
//!
//! One registry per room, owned by that room's actor. Player fields
//! (`map`, `x`, `y`) change only through the owning client's relay
//! events, routed here by the actor — no other session can touch them.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is a plain `HashMap` with no interior locking.
//! This is intentional: it lives inside a single actor task, which
//! processes each command to completion before the next, so a snapshot
//! can never observe a half-applied update.

use std::collections::HashMap;

use tilemates_protocol::{PlayerSession, SessionId};

use crate::{RoomError, SpawnPoint};

/// All `PlayerSession` records for one room.
pub struct SessionRegistry {
    sessions: HashMap<SessionId, PlayerSession>,
    spawn: SpawnPoint,
}

impl SessionRegistry {
    /// Creates an empty registry whose new sessions start at `spawn`.
    pub fn new(spawn: SpawnPoint) -> Self {
        Self {
            sessions: HashMap::new(),
            spawn,
        }
    }

    /// Inserts a new record at the spawn defaults.
    ///
    /// # Errors
    /// Returns [`RoomError::DuplicateSession`] if the id is already
    /// registered. Admission runs before this, and the connection layer
    /// guarantees id uniqueness, so a duplicate here is an invariant
    /// violation to surface loudly — never to paper over.
    pub fn create(
        &mut self,
        session_id: SessionId,
        wallet: Option<String>,
    ) -> Result<&PlayerSession, RoomError> {
        if self.sessions.contains_key(&session_id) {
            return Err(RoomError::DuplicateSession(session_id));
        }

        let record = PlayerSession {
            session_id: session_id.clone(),
            wallet,
            map: self.spawn.map.clone(),
            x: self.spawn.x,
            y: self.spawn.y,
        };
        self.sessions.insert(session_id.clone(), record);

        // Just inserted above.
        Ok(self.sessions.get(&session_id).expect("just inserted"))
    }

    /// Moves a session to a new position on its current map.
    ///
    /// # Errors
    /// Returns [`RoomError::UnknownSession`] if no record exists — the
    /// caller decides whether that means "drop the message" (desynced
    /// client) or a logic error.
    pub fn update_position(
        &mut self,
        session_id: &SessionId,
        x: f32,
        y: f32,
    ) -> Result<&PlayerSession, RoomError> {
        let record = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| RoomError::UnknownSession(session_id.clone()))?;
        record.x = x;
        record.y = y;
        Ok(record)
    }

    /// Moves a session to a different map, resetting its coordinates to
    /// the given re-entry point. Coordinates never carry across maps.
    pub fn update_map(
        &mut self,
        session_id: &SessionId,
        map: String,
        x: f32,
        y: f32,
    ) -> Result<&PlayerSession, RoomError> {
        let record = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| RoomError::UnknownSession(session_id.clone()))?;
        record.map = map;
        record.x = x;
        record.y = y;
        Ok(record)
    }

    /// Deletes and returns a record. `None` if already gone — duplicate
    /// removes are expected under racing leave notifications and are
    /// not an error.
    pub fn remove(&mut self, session_id: &SessionId) -> Option<PlayerSession> {
        self.sessions.remove(session_id)
    }

    /// Looks up a record by session id.
    pub fn get(&self, session_id: &SessionId) -> Option<&PlayerSession> {
        self.sessions.get(session_id)
    }

    /// A full copy of every record, for `CURRENT_PLAYERS` snapshots.
    ///
    /// The actor never yields mid-mutation, so the copy always reflects
    /// a single consistent point in time.
    pub fn snapshot(&self) -> HashMap<SessionId, PlayerSession> {
        self.sessions.clone()
    }

    /// Returns `true` if any active session holds this wallet identity.
    pub fn wallet_active(&self, wallet: &str) -> bool {
        self.sessions
            .values()
            .any(|p| p.wallet.as_deref() == Some(wallet))
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::from(s)
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(SpawnPoint::default())
    }

    // =====================================================================
    // create()
    // =====================================================================

    #[test]
    fn test_create_uses_spawn_defaults() {
        let mut reg = registry();

        let record = reg.create(sid("s1"), Some("W1".into())).unwrap();

        assert_eq!(record.session_id, sid("s1"));
        assert_eq!(record.wallet.as_deref(), Some("W1"));
        assert_eq!(record.map, "town");
        assert_eq!(record.x, 352.0);
        assert_eq!(record.y, 1216.0);
    }

    #[test]
    fn test_create_duplicate_session_id_is_an_error() {
        let mut reg = registry();
        reg.create(sid("s1"), None).unwrap();

        let result = reg.create(sid("s1"), None);

        assert!(matches!(result, Err(RoomError::DuplicateSession(_))));
        assert_eq!(reg.len(), 1, "failed create must not mutate");
    }

    #[test]
    fn test_create_anonymous_wallet_is_allowed() {
        let mut reg = registry();
        let record = reg.create(sid("s1"), None).unwrap();
        assert!(record.wallet.is_none());
    }

    // =====================================================================
    // update_position() / update_map()
    // =====================================================================

    #[test]
    fn test_update_position_changes_only_coordinates() {
        let mut reg = registry();
        reg.create(sid("s1"), Some("W1".into())).unwrap();

        let record = reg.update_position(&sid("s1"), 360.0, 1220.0).unwrap();

        assert_eq!(record.x, 360.0);
        assert_eq!(record.y, 1220.0);
        assert_eq!(record.map, "town", "map must be untouched");
        assert_eq!(record.wallet.as_deref(), Some("W1"));
    }

    #[test]
    fn test_update_position_unknown_session_is_an_error() {
        let mut reg = registry();
        let result = reg.update_position(&sid("ghost"), 1.0, 2.0);
        assert!(matches!(result, Err(RoomError::UnknownSession(_))));
    }

    #[test]
    fn test_update_position_last_write_wins() {
        let mut reg = registry();
        reg.create(sid("s1"), None).unwrap();

        reg.update_position(&sid("s1"), 10.0, 20.0).unwrap();
        reg.update_position(&sid("s1"), 30.0, 40.0).unwrap();

        let record = reg.get(&sid("s1")).unwrap();
        assert_eq!((record.x, record.y), (30.0, 40.0));
    }

    #[test]
    fn test_update_map_resets_coordinates_to_reentry_point() {
        let mut reg = registry();
        reg.create(sid("s1"), None).unwrap();
        reg.update_position(&sid("s1"), 500.0, 600.0).unwrap();

        let record = reg
            .update_map(&sid("s1"), "shop".into(), 300.0, 75.0)
            .unwrap();

        assert_eq!(record.map, "shop");
        assert_eq!((record.x, record.y), (300.0, 75.0));
    }

    // =====================================================================
    // remove()
    // =====================================================================

    #[test]
    fn test_remove_returns_prior_record() {
        let mut reg = registry();
        reg.create(sid("s1"), Some("W1".into())).unwrap();

        let removed = reg.remove(&sid("s1")).expect("should return record");

        assert_eq!(removed.wallet.as_deref(), Some("W1"));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut reg = registry();
        reg.create(sid("s1"), None).unwrap();
        reg.remove(&sid("s1"));

        assert!(reg.remove(&sid("s1")).is_none());
    }

    // =====================================================================
    // snapshot() / wallet_active()
    // =====================================================================

    #[test]
    fn test_snapshot_contains_every_session_at_spawn() {
        let mut reg = registry();
        for i in 1..=3 {
            reg.create(sid(&format!("s{i}")), None).unwrap();
        }

        let snap = reg.snapshot();

        assert_eq!(snap.len(), 3);
        for record in snap.values() {
            assert_eq!(record.map, "town");
            assert_eq!((record.x, record.y), (352.0, 1216.0));
        }
    }

    #[test]
    fn test_snapshot_is_a_copy_not_a_view() {
        let mut reg = registry();
        reg.create(sid("s1"), None).unwrap();
        let snap = reg.snapshot();

        reg.update_position(&sid("s1"), 999.0, 999.0).unwrap();

        assert_eq!(snap[&sid("s1")].x, 352.0, "snapshot must not move");
    }

    #[test]
    fn test_wallet_active_tracks_create_and_remove() {
        let mut reg = registry();
        assert!(!reg.wallet_active("W1"));

        reg.create(sid("s1"), Some("W1".into())).unwrap();
        assert!(reg.wallet_active("W1"));
        assert!(!reg.wallet_active("W2"));

        reg.remove(&sid("s1"));
        assert!(!reg.wallet_active("W1"), "leave frees the wallet slot");
    }

    #[test]
    fn test_wallet_active_ignores_anonymous_sessions() {
        let mut reg = registry();
        reg.create(sid("s1"), None).unwrap();
        // An anonymous session must never match any wallet string.
        assert!(!reg.wallet_active(""));
    }
}
