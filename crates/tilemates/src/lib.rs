//! # Tilemates
//!
//! WebSocket room server for shared tile-map worlds.
//!
//! Tilemates runs small authoritative rooms (five sessions each) and
//! relays player movement between them: a client joins, receives a
//! `CURRENT_PLAYERS` snapshot of everyone already in the room, and from
//! then on every move, stop, and map change it sends is fanned out to
//! the other members. The server keeps the canonical position record;
//! clients mirror it (see the `tilemates-client` crate).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tilemates::Server;
//!
//! # async fn run() -> Result<(), tilemates::TilematesError> {
//! let server = Server::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::TilematesError;
pub use server::{Server, ServerBuilder};

pub use tilemates_protocol as protocol;
pub use tilemates_room as room;
pub use tilemates_transport as transport;
