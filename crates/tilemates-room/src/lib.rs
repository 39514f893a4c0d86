//! Authoritative room layer for Tilemates.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! single source of truth for "who is where, on which map": the
//! [`SessionRegistry`]. Inbound relay events mutate the registry and fan
//! out as broadcasts; no state is shared across rooms.
//!
//! # Key types
//!
//! - [`SessionRegistry`] — per-room player records, exclusively
//!   server-owned
//! - [`AdmissionPolicy`] — capacity and wallet-uniqueness checks run
//!   before any session exists
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomManager`] — creates rooms and routes sessions to them
//! - [`RoomConfig`] — capacity, spawn point, snapshot delay

mod admission;
mod config;
mod error;
mod manager;
mod registry;
mod room;

pub use admission::{AdmissionPolicy, AdmissionRejection};
pub use config::{RoomConfig, SpawnPoint};
pub use error::RoomError;
pub use manager::RoomManager;
pub use registry::SessionRegistry;
pub use room::{PlayerSender, RoomHandle, RoomInfo};
