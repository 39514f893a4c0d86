//! Wire protocol for Tilemates.
//!
//! This crate defines the "language" that clients and the room server speak:
//!
//! - **Types** ([`PlayerSession`], [`ClientEvent`], [`ServerEvent`], etc.) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the room layer
//! (authoritative player state). It doesn't know about connections or
//! registries — it only knows how to name and serialize events.
//!
//! ```text
//! Transport (bytes) → Protocol (events) → Room (registry + broadcast)
//! ```
//!
//! Every event is an internally tagged JSON object whose `event` field
//! carries the SCREAMING_SNAKE_CASE name the browser client matches on
//! (`"PLAYER_MOVED"`, `"CURRENT_PLAYERS"`, …).

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, ClientMessage, ControlMessage, Facing, PlayerSession,
    RoomId, ServerControl, ServerEvent, ServerMessage, SessionId,
};
