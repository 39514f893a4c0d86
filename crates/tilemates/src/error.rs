//! Unified error type for the Tilemates server.

use tilemates_protocol::ProtocolError;
use tilemates_room::RoomError;
use tilemates_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tilemates` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TilematesError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, duplicate wallet, not found).
    #[error(transparent)]
    Room(#[from] RoomError),
}
