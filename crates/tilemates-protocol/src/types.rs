//! Core protocol types for the Tilemates wire format.
//!
//! Everything here travels between the browser client and the room server
//! as JSON. The event enums are internally tagged on an `event` field, so
//! a move broadcast looks like:
//!
//! ```json
//! { "event": "PLAYER_MOVED", "sessionId": "kQ3fA9x1c",
//!   "map": "town", "x": 360.0, "y": 1220.0, "wallet": null,
//!   "position": "left" }
//! ```
//!
//! The field names are camelCase and the event names SCREAMING_SNAKE_CASE
//! because that is what the deployed client matches on — changing either
//! is a protocol break.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// An opaque identifier for one client's connection lifetime in a room.
///
/// Assigned by the server when the connection is admitted, stable until
/// the connection closes, and never shared by two live sessions in the
/// same room. Clients treat it as an opaque string; the server generates
/// a short random alphanumeric id (see [`SessionId::generate`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Length of generated session ids.
    const LEN: usize = 9;

    /// Generates a fresh random session id (9 alphanumeric characters,
    /// ~53 bits of entropy — collision within one room's handful of
    /// concurrent sessions is not a practical concern, and the registry
    /// treats a duplicate as a fatal invariant violation anyway).
    pub fn generate() -> Self {
        use rand::Rng;
        use rand::distr::Alphanumeric;

        let id: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(Self::LEN)
            .map(char::from)
            .collect();
        Self(id)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unique identifier for a room instance.
///
/// Rooms are server-internal; the id never crosses the wire to clients,
/// but it shows up in logs and manager bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Facing
// ---------------------------------------------------------------------------

/// The direction a player sprite is facing.
///
/// Lowercase on the wire (`"left"`, `"front"`, …) — these double as the
/// client's animation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    Right,
    /// Facing the camera (moving down the map).
    Front,
    /// Facing away from the camera (moving up the map).
    Back,
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Front => write!(f, "front"),
            Self::Back => write!(f, "back"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerSession
// ---------------------------------------------------------------------------

/// The authoritative record of one connected player.
///
/// Owned exclusively by the server-side session registry; clients only
/// ever see copies inside snapshots and broadcasts. The wallet is an
/// opaque identity string supplied at join — verification happens
/// entirely outside this system, and `None` means an anonymous session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSession {
    pub session_id: SessionId,
    /// Opaque wallet identity, or `None` for anonymous sessions.
    /// Serialized as an explicit `null` so the client can test it.
    pub wallet: Option<String>,
    /// Name of the tile map the player currently occupies.
    pub map: String,
    /// Last known world-coordinate position in the map's space.
    pub x: f32,
    pub y: f32,
}

// ---------------------------------------------------------------------------
// Relay events (client → server)
// ---------------------------------------------------------------------------

/// Gameplay events a client sends while in a room.
///
/// These are the only messages that mutate the registry; everything else
/// on the wire is connection control. The set is closed on purpose — the
/// room actor matches it exhaustively, so adding an event kind is a
/// compile-time checked change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientEvent {
    /// The local player moved to a new position while facing `position`.
    PlayerMoved { x: f32, y: f32, position: Facing },

    /// The local player stopped moving. Position is unchanged — only the
    /// resting facing travels.
    PlayerMovementEnded { position: Facing },

    /// The local player walked through a map transition.
    PlayerChangedMap { map: String },
}

// ---------------------------------------------------------------------------
// Relay events (server → client)
// ---------------------------------------------------------------------------

/// Room broadcasts and snapshots delivered to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    /// Full registry snapshot. Sent to a joiner (after a short settle
    /// delay) and to a player who changed maps. Includes the recipient's
    /// own session — clients skip themselves by id.
    CurrentPlayers {
        players: HashMap<SessionId, PlayerSession>,
    },

    /// A new player was admitted. Broadcast to everyone except the joiner;
    /// carries the joiner's full session record, flattened.
    PlayerJoined {
        #[serde(flatten)]
        session: PlayerSession,
    },

    /// A player moved. Broadcast to everyone except the mover; carries the
    /// updated session record plus the movement-facing direction.
    PlayerMoved {
        #[serde(flatten)]
        session: PlayerSession,
        position: Facing,
    },

    /// A player stopped moving.
    #[serde(rename_all = "camelCase")]
    PlayerMovementEnded {
        session_id: SessionId,
        map: String,
        position: Facing,
    },

    /// A player switched maps. `x`/`y` are the canonical re-entry point
    /// for the new map (prior coordinates are not preserved), and
    /// `players` is a fresh snapshot so peers can rebuild their view.
    #[serde(rename_all = "camelCase")]
    PlayerChangedMap {
        session_id: SessionId,
        map: String,
        x: f32,
        y: f32,
        players: HashMap<SessionId, PlayerSession>,
    },

    /// A player disconnected or left. Broadcast to all remaining sessions.
    #[serde(rename_all = "camelCase")]
    PlayerLeft { session_id: SessionId, map: String },
}

// ---------------------------------------------------------------------------
// Connection control
// ---------------------------------------------------------------------------

/// Connection-level requests from the client.
///
/// `JoinRoom` must be the first frame on a fresh connection; the wallet
/// identity rides along out-of-band from the relay events, consumed only
/// by admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// "Put me in the town." Carries the optional wallet identity.
    JoinRoom { wallet: Option<String> },

    /// Voluntary leave. Closing the socket has the same effect.
    LeaveRoom,
}

/// Connection-level replies from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerControl {
    /// Admission succeeded; here is the session id the server assigned.
    /// Clients need it to skip themselves in `CURRENT_PLAYERS`.
    #[serde(rename_all = "camelCase")]
    RoomJoined { session_id: SessionId },

    /// Something went wrong (admission rejection, malformed request).
    /// Rejection is terminal for the attempt — retry is a user decision.
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Frame unions
// ---------------------------------------------------------------------------

/// Any frame a client may send: control or relay event.
///
/// Untagged — serde tries control first, then relay. The inner enums are
/// each tagged on `event`, and their variant names don't overlap, so a
/// frame decodes unambiguously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    Control(ControlMessage),
    Event(ClientEvent),
}

/// Any frame the server may send: control or relay event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Control(ServerControl),
    Event(ServerEvent),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The deployed client matches on exact JSON shapes — event names,
    //! camelCase fields, explicit null wallets. These tests pin every
    //! shape so a serde attribute regression shows up here, not in a
    //! browser console.

    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::from(s)
    }

    fn session(s: &str) -> PlayerSession {
        PlayerSession {
            session_id: sid(s),
            wallet: None,
            map: "town".into(),
            x: 352.0,
            y: 1216.0,
        }
    }

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&sid("kQ3fA9x1c")).unwrap();
        assert_eq!(json, "\"kQ3fA9x1c\"");
    }

    #[test]
    fn test_session_id_generate_is_nine_alphanumeric_chars() {
        let id = SessionId::generate();
        assert_eq!(id.as_str().len(), 9);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_session_id_generate_is_unique_enough() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId(3).to_string(), "R-3");
    }

    // =====================================================================
    // Facing
    // =====================================================================

    #[test]
    fn test_facing_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Facing::Left).unwrap(), "\"left\"");
        assert_eq!(serde_json::to_string(&Facing::Back).unwrap(), "\"back\"");
    }

    #[test]
    fn test_facing_display_matches_wire_form() {
        assert_eq!(Facing::Front.to_string(), "front");
    }

    // =====================================================================
    // PlayerSession
    // =====================================================================

    #[test]
    fn test_player_session_json_is_camel_case_with_null_wallet() {
        let json: serde_json::Value =
            serde_json::to_value(session("s1")).unwrap();

        assert_eq!(json["sessionId"], "s1");
        assert!(json["wallet"].is_null(), "anonymous wallet must be null");
        assert_eq!(json["map"], "town");
        assert_eq!(json["x"], 352.0);
        assert_eq!(json["y"], 1216.0);
    }

    #[test]
    fn test_player_session_round_trip_with_wallet() {
        let mut s = session("s1");
        s.wallet = Some("W1".into());
        let bytes = serde_json::to_vec(&s).unwrap();
        let decoded: PlayerSession = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(s, decoded);
    }

    // =====================================================================
    // ClientEvent
    // =====================================================================

    #[test]
    fn test_client_event_player_moved_json_format() {
        let ev = ClientEvent::PlayerMoved {
            x: 360.0,
            y: 1220.0,
            position: Facing::Left,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "PLAYER_MOVED");
        assert_eq!(json["x"], 360.0);
        assert_eq!(json["y"], 1220.0);
        assert_eq!(json["position"], "left");
    }

    #[test]
    fn test_client_event_movement_ended_json_format() {
        let ev = ClientEvent::PlayerMovementEnded {
            position: Facing::Right,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "PLAYER_MOVEMENT_ENDED");
        assert_eq!(json["position"], "right");
    }

    #[test]
    fn test_client_event_changed_map_round_trip() {
        let ev = ClientEvent::PlayerChangedMap { map: "shop".into() };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    // =====================================================================
    // ServerEvent
    // =====================================================================

    #[test]
    fn test_server_event_current_players_keys_map_by_session_id() {
        let mut players = HashMap::new();
        players.insert(sid("s1"), session("s1"));
        let ev = ServerEvent::CurrentPlayers { players };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "CURRENT_PLAYERS");
        assert_eq!(json["players"]["s1"]["map"], "town");
    }

    #[test]
    fn test_server_event_player_joined_flattens_session_fields() {
        // The client reads sessionId/map/x/y directly off the event
        // object, not from a nested struct.
        let ev = ServerEvent::PlayerJoined {
            session: session("s1"),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "PLAYER_JOINED");
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["x"], 352.0);
        assert!(json.get("session").is_none(), "fields must be flattened");
    }

    #[test]
    fn test_server_event_player_moved_carries_session_and_facing() {
        let mut s = session("s1");
        s.x = 360.0;
        s.y = 1220.0;
        let ev = ServerEvent::PlayerMoved {
            session: s,
            position: Facing::Left,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "PLAYER_MOVED");
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["x"], 360.0);
        assert_eq!(json["position"], "left");
    }

    #[test]
    fn test_server_event_changed_map_json_format() {
        let ev = ServerEvent::PlayerChangedMap {
            session_id: sid("s1"),
            map: "shop".into(),
            x: 300.0,
            y: 75.0,
            players: HashMap::new(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "PLAYER_CHANGED_MAP");
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["map"], "shop");
        assert_eq!(json["x"], 300.0);
        assert_eq!(json["y"], 75.0);
        assert!(json["players"].is_object());
    }

    #[test]
    fn test_server_event_player_left_round_trip() {
        let ev = ServerEvent::PlayerLeft {
            session_id: sid("s1"),
            map: "town".into(),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    // =====================================================================
    // Control messages
    // =====================================================================

    #[test]
    fn test_control_join_room_json_format() {
        let msg = ControlMessage::JoinRoom {
            wallet: Some("W1".into()),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["event"], "JOIN_ROOM");
        assert_eq!(json["wallet"], "W1");
    }

    #[test]
    fn test_control_join_room_anonymous() {
        let msg = ControlMessage::JoinRoom { wallet: None };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert!(json["wallet"].is_null());
    }

    #[test]
    fn test_server_control_room_joined_json_format() {
        let msg = ServerControl::RoomJoined {
            session_id: sid("kQ3fA9x1c"),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["event"], "ROOM_JOINED");
        assert_eq!(json["sessionId"], "kQ3fA9x1c");
    }

    #[test]
    fn test_server_control_error_json_format() {
        let msg = ServerControl::Error {
            code: 4403,
            message: "wallet already in room".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["event"], "ERROR");
        assert_eq!(json["code"], 4403);
    }

    // =====================================================================
    // Frame unions
    // =====================================================================

    #[test]
    fn test_client_message_decodes_control_frame() {
        let frame = r#"{"event":"JOIN_ROOM","wallet":"W1"}"#;
        let msg: ClientMessage = serde_json::from_str(frame).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Control(ControlMessage::JoinRoom { .. })
        ));
    }

    #[test]
    fn test_client_message_decodes_relay_event_frame() {
        let frame =
            r#"{"event":"PLAYER_MOVED","x":1.0,"y":2.0,"position":"back"}"#;
        let msg: ClientMessage = serde_json::from_str(frame).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Event(ClientEvent::PlayerMoved { .. })
        ));
    }

    #[test]
    fn test_server_message_round_trips_both_arms() {
        let control = ServerMessage::Control(ServerControl::Error {
            code: 4000,
            message: "bad frame".into(),
        });
        let event = ServerMessage::Event(ServerEvent::PlayerLeft {
            session_id: sid("s1"),
            map: "town".into(),
        });
        for msg in [control, event] {
            let bytes = serde_json::to_vec(&msg).unwrap();
            let decoded: ServerMessage =
                serde_json::from_slice(&bytes).unwrap();
            assert_eq!(msg, decoded);
        }
    }

    // =====================================================================
    // Error cases — malformed input
    // =====================================================================

    #[test]
    fn test_decode_unknown_event_returns_error() {
        let unknown = r#"{"event":"FLY_TO_MOON","speed":9000}"#;
        let result: Result<ClientMessage, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<ClientMessage, _> =
            serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_fields_returns_error() {
        // PLAYER_MOVED without coordinates must not decode.
        let wrong = r#"{"event":"PLAYER_MOVED","position":"left"}"#;
        let result: Result<ClientMessage, _> = serde_json::from_str(wrong);
        assert!(result.is_err());
    }
}
