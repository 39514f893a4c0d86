//! Error types for the room layer.

use tilemates_protocol::{RoomId, SessionId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room is at its session capacity.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The supplied wallet identity already has an active session in
    /// this room. At most one session per wallet per room.
    #[error("wallet already active in room {0}")]
    DuplicateWallet(RoomId),

    /// A session id was registered twice. The connection layer assigns
    /// unique ids, so this indicates a broken invariant, not bad input.
    #[error("session {0} already registered")]
    DuplicateSession(SessionId),

    /// The session is not present in the registry.
    #[error("no session {0} in registry")]
    UnknownSession(SessionId),

    /// The session is already in a room.
    #[error("session {0} already in room {1}")]
    AlreadyInRoom(SessionId, RoomId),

    /// The session is not in any room.
    #[error("session {0} not in any room")]
    NotInRoom(SessionId),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
