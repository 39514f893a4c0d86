//! Client-side mirror of the server's session registry.
//!
//! A connected client renders every other session in its room as a
//! remote player sprite. This crate keeps that set of sprites — the
//! [`RemoteRoster`] — consistent with the broadcast stream, including
//! when messages arrive out of the expected order: a move for a mirror
//! that was never created (a dropped or late `PLAYER_JOINED`) recreates
//! the mirror on the spot instead of panicking or losing the player.
//!
//! Rendering itself stays out of this crate. The game supplies a
//! [`MirrorVisual`] (how one remote player is drawn and animated) and a
//! [`VisualFactory`] (how a visual is created from a session record);
//! the roster decides *when* to create, move, and destroy them.

mod mirror;
mod roster;

pub use mirror::{MirrorVisual, RemotePlayerMirror};
pub use roster::{RemoteRoster, VisualFactory};
