//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where newly admitted players appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// The map every session starts on.
    pub map: String,
    pub x: f32,
    pub y: f32,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self {
            map: "town".to_string(),
            x: 352.0,
            y: 1216.0,
        }
    }
}

/// Configuration for a room instance.
///
/// The defaults match the reference deployment: five sessions per room,
/// spawning in the town square, with the join snapshot delayed half a
/// second so the joining client finishes its scene setup first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum concurrent sessions per room instance.
    pub max_clients: usize,

    /// Default map and position for new sessions.
    pub spawn: SpawnPoint,

    /// Canonical re-entry coordinates after a map change. Prior
    /// coordinates are never carried across maps.
    pub reentry_x: f32,
    pub reentry_y: f32,

    /// How long to wait before sending `CURRENT_PLAYERS` to a joiner.
    /// Zero sends it synchronously.
    pub snapshot_delay: Duration,

    /// Command channel capacity for the room actor (backpressure bound).
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_clients: 5,
            spawn: SpawnPoint::default(),
            reentry_x: 300.0,
            reentry_y: 75.0,
            snapshot_delay: Duration::from_millis(500),
            channel_size: 64,
        }
    }
}
