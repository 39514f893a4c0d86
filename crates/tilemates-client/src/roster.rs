//! The remote roster: which mirrors exist, and how broadcast events
//! mutate them.

use std::collections::HashMap;

use tilemates_protocol::{PlayerSession, ServerEvent, SessionId};
use tracing::debug;

use crate::mirror::{MirrorVisual, RemotePlayerMirror};

/// Fallback coordinates when a mirror has to be created from an event
/// that carries no position. Matches the server's spawn point.
const DEFAULT_SPAWN: (f32, f32) = (352.0, 1216.0);

/// Creates visuals for newly discovered remote players.
///
/// Called by the roster whenever a mirror needs to exist and doesn't —
/// on snapshots, joins, map arrivals, and defensive recreation after an
/// out-of-order event.
pub trait VisualFactory {
    type Visual: MirrorVisual;

    /// Builds a visual for `session`, placed at the record's position.
    fn create(&mut self, session: &PlayerSession) -> Self::Visual;
}

/// The set of remote player mirrors on the client's current map.
///
/// Feed every decoded [`ServerEvent`] through [`apply`](Self::apply).
/// The roster never assumes delivery order: an event naming a session
/// it has no mirror for recreates the mirror rather than dropping the
/// player from view.
pub struct RemoteRoster<F: VisualFactory> {
    local_id: SessionId,
    local_map: String,
    factory: F,
    mirrors: HashMap<SessionId, RemotePlayerMirror<F::Visual>>,
}

impl<F: VisualFactory> RemoteRoster<F> {
    pub fn new(local_id: SessionId, local_map: impl Into<String>, factory: F) -> Self {
        Self {
            local_id,
            local_map: local_map.into(),
            factory,
            mirrors: HashMap::new(),
        }
    }

    /// Applies one broadcast event to the roster.
    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::CurrentPlayers { players } => {
                for (session_id, session) in players {
                    if session_id == self.local_id {
                        continue;
                    }
                    if !self.mirrors.contains_key(&session_id) {
                        self.create_if_on_map(session);
                    }
                }
            }
            ServerEvent::PlayerJoined { session } => {
                if session.session_id == self.local_id
                    || self.mirrors.contains_key(&session.session_id)
                {
                    return;
                }
                self.create_if_on_map(session);
            }
            ServerEvent::PlayerMoved { session, position } => {
                if session.session_id == self.local_id {
                    return;
                }
                let session_id = session.session_id.clone();
                let (x, y) = (session.x, session.y);
                if !self.mirrors.contains_key(&session_id) {
                    // The join for this player never landed here —
                    // rebuild the mirror from the full record the move
                    // carries.
                    debug!(%session_id, "recreating mirror for unseen mover");
                    self.create_if_on_map(session);
                }
                if let Some(mirror) = self.mirrors.get_mut(&session_id) {
                    mirror.apply_move(x, y, position);
                }
            }
            ServerEvent::PlayerMovementEnded {
                session_id,
                map,
                position,
            } => {
                if session_id == self.local_id {
                    return;
                }
                if !self.mirrors.contains_key(&session_id) {
                    // No position travels with this event, so the
                    // recreated mirror lands at the spawn point until
                    // the next move corrects it.
                    debug!(%session_id, "recreating mirror for unseen idler");
                    let (x, y) = DEFAULT_SPAWN;
                    self.create_if_on_map(PlayerSession {
                        session_id: session_id.clone(),
                        wallet: None,
                        map,
                        x,
                        y,
                    });
                }
                if let Some(mirror) = self.mirrors.get_mut(&session_id) {
                    mirror.apply_stop(position);
                }
            }
            ServerEvent::PlayerChangedMap {
                session_id,
                map,
                x,
                y,
                players: _,
            } => {
                if session_id == self.local_id {
                    return;
                }
                // The old mirror is gone either way; a new one appears
                // only if the player arrived on this client's map.
                self.mirrors.remove(&session_id);
                self.create_if_on_map(PlayerSession {
                    session_id,
                    wallet: None,
                    map,
                    x,
                    y,
                });
            }
            ServerEvent::PlayerLeft { session_id, map: _ } => {
                if self.mirrors.remove(&session_id).is_some() {
                    debug!(%session_id, "removed mirror for departed player");
                }
            }
        }
    }

    /// Call when the local player changes map: every mirror belongs to
    /// the old scene and is torn down. The refreshed `CURRENT_PLAYERS`
    /// snapshot rebuilds the roster for the new map.
    pub fn set_local_map(&mut self, map: impl Into<String>) {
        self.local_map = map.into();
        self.mirrors.clear();
    }

    pub fn local_map(&self) -> &str {
        &self.local_map
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&RemotePlayerMirror<F::Visual>> {
        self.mirrors.get(session_id)
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.mirrors.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    fn create_if_on_map(&mut self, session: PlayerSession) {
        if session.map != self.local_map {
            debug!(
                session_id = %session.session_id,
                map = %session.map,
                "skipping mirror for player on another map"
            );
            return;
        }
        let visual = self.factory.create(&session);
        self.mirrors.insert(
            session.session_id.clone(),
            RemotePlayerMirror::new(session, visual),
        );
    }
}
