//! Room manager: creates, tracks, and routes sessions to rooms.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tilemates_protocol::{ClientEvent, RoomId, SessionId};

use crate::room::spawn_room;
use crate::{PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Manages all active rooms and tracks which session is in which room.
///
/// Each room owns its registry inside its actor — the manager holds only
/// handles and an index, so there is no process-wide player state to
/// leak across rooms.
pub struct RoomManager {
    /// Template applied to every room this manager spawns.
    config: RoomConfig,

    /// Active rooms, keyed by room ID.
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each session to the room it's currently in.
    /// A session is in at most ONE room at a time (key invariant).
    session_rooms: HashMap<SessionId, RoomId>,
}

impl RoomManager {
    /// Creates a manager that spawns rooms with the given config.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: HashMap::new(),
            session_rooms: HashMap::new(),
        }
    }

    /// Creates a new room and returns its ID.
    pub fn create_room(&mut self) -> RoomId {
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_room(room_id, self.config.clone());
        self.rooms.insert(room_id, handle);
        tracing::info!(%room_id, "room created");
        room_id
    }

    /// Admits a session into a specific room.
    pub async fn join_room(
        &mut self,
        session_id: SessionId,
        room_id: RoomId,
        wallet: Option<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.session_rooms.get(&session_id) {
            return Err(RoomError::AlreadyInRoom(session_id, *current));
        }

        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        handle.join(session_id.clone(), wallet, sender).await?;
        self.session_rooms.insert(session_id, room_id);
        Ok(())
    }

    /// Finds a room with a free slot or creates one, then admits the
    /// session.
    ///
    /// Full rooms are skipped and a fresh room is spun up when every
    /// existing one is occupied. A duplicate-wallet rejection, though,
    /// is terminal for the whole attempt: the identity is already
    /// playing, and seating it in a second room would defeat the guard.
    pub async fn join_or_create(
        &mut self,
        session_id: SessionId,
        wallet: Option<String>,
        sender: PlayerSender,
    ) -> Result<RoomId, RoomError> {
        if let Some(current) = self.session_rooms.get(&session_id) {
            return Err(RoomError::AlreadyInRoom(session_id, *current));
        }

        for handle in self.rooms.values() {
            let Ok(info) = handle.info().await else {
                continue;
            };
            if !info.has_capacity() {
                continue;
            }
            match handle
                .join(session_id.clone(), wallet.clone(), sender.clone())
                .await
            {
                Ok(()) => {
                    self.session_rooms
                        .insert(session_id, info.room_id);
                    return Ok(info.room_id);
                }
                // Filled up between info() and join() — keep scanning.
                Err(RoomError::RoomFull(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        // No joinable room found — create one.
        let room_id = self.create_room();
        let handle = self.rooms.get(&room_id).expect("just created this room");
        handle.join(session_id.clone(), wallet, sender).await?;
        self.session_rooms.insert(session_id, room_id);
        Ok(room_id)
    }

    /// Removes a session from its current room, disposing the room if
    /// it was the last one.
    ///
    /// Safe to call twice (drop guards race explicit leaves): the second
    /// call finds no index entry and reports [`RoomError::NotInRoom`],
    /// which callers on the disconnect path ignore.
    pub async fn leave(
        &mut self,
        session_id: SessionId,
    ) -> Result<(), RoomError> {
        let room_id = self
            .session_rooms
            .remove(&session_id)
            .ok_or_else(|| RoomError::NotInRoom(session_id.clone()))?;

        if let Some(handle) = self.rooms.get(&room_id) {
            handle.leave(session_id).await?;

            // Rooms auto-dispose when their last session leaves; an
            // unreachable actor counts as empty.
            let occupancy = match handle.info().await {
                Ok(info) => info.occupancy,
                Err(_) => 0,
            };
            if occupancy == 0 {
                if let Some(handle) = self.rooms.remove(&room_id) {
                    let _ = handle.shutdown().await;
                }
                tracing::info!(%room_id, "empty room disposed");
            }
        }

        Ok(())
    }

    /// Routes a relay event from a session to its current room.
    pub async fn route_event(
        &self,
        session_id: SessionId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        let room_id = self
            .session_rooms
            .get(&session_id)
            .ok_or_else(|| RoomError::NotInRoom(session_id.clone()))?;

        let handle = self
            .rooms
            .get(room_id)
            .ok_or(RoomError::NotFound(*room_id))?;

        handle.send_event(session_id, event).await
    }

    /// Returns info about a specific room.
    pub async fn room_info(
        &self,
        room_id: RoomId,
    ) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        handle.info().await
    }

    /// Shuts down a room and drops every session index entry for it.
    pub async fn destroy_room(
        &mut self,
        room_id: RoomId,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        let _ = handle.shutdown().await;
        self.session_rooms.retain(|_, rid| *rid != room_id);

        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// Returns the room ID a session is currently in, if any.
    pub fn session_room(&self, session_id: &SessionId) -> Option<RoomId> {
        self.session_rooms.get(session_id).copied()
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
