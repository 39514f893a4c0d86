//! Per-connection handler: join request, admission, and frame pumping.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive JOIN_ROOM → admit via the room manager (or reject)
//!   2. Send ROOM_JOINED with the assigned session id
//!   3. Loop: pump room broadcasts out, route relay events in
//!
//! Disconnection — clean close, error, or task panic — always ends in a
//! leave, so the registry entry and the wallet slot never outlive the
//! socket.

use std::sync::Arc;
use std::time::Duration;

use tilemates_protocol::{
    ClientMessage, Codec, ControlMessage, ProtocolError, ServerControl,
    ServerMessage, SessionId,
};
use tilemates_room::RoomError;
use tilemates_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::TilematesError;
use crate::server::ServerState;

/// How long a fresh connection gets to send its JOIN_ROOM frame.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Close codes sent in the ERROR frame before dropping a rejected
/// connection.
const CODE_BAD_REQUEST: u16 = 4000;
const CODE_ROOM_FULL: u16 = 4402;
const CODE_DUPLICATE_WALLET: u16 = 4403;

/// Drop guard that removes a session from its room when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct SessionGuard {
    session_id: SessionId,
    state: Arc<ServerState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let session_id = self.session_id.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut rooms = state.rooms.lock().await;
            // NotInRoom here just means an explicit LEAVE_ROOM already
            // ran.
            let _ = rooms.leave(session_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), TilematesError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Join request ---
    let wallet = await_join_request(&conn, &state).await?;

    let session_id = SessionId::generate();
    let (sender, mut broadcasts) = mpsc::unbounded_channel();

    let join_result = {
        let mut rooms = state.rooms.lock().await;
        rooms
            .join_or_create(session_id.clone(), wallet, sender)
            .await
    };

    let room_id = match join_result {
        Ok(room_id) => room_id,
        Err(e) => {
            let code = rejection_code(&e);
            send_control(
                &conn,
                &state.codec,
                &ServerControl::Error {
                    code,
                    message: e.to_string(),
                },
            )
            .await?;
            let _ = conn.close().await;
            tracing::info!(%conn_id, code, error = %e, "join rejected");
            return Ok(());
        }
    };

    tracing::info!(%conn_id, %session_id, %room_id, "session joined");

    // The guard is active from here: any exit path leaves the room.
    let _guard = SessionGuard {
        session_id: session_id.clone(),
        state: Arc::clone(&state),
    };

    send_control(
        &conn,
        &state.codec,
        &ServerControl::RoomJoined {
            session_id: session_id.clone(),
        },
    )
    .await?;

    // --- Step 2: Frame loop ---
    // Outbound room broadcasts and inbound client frames are pumped from
    // the same task; the connection supports concurrent send/recv.
    loop {
        tokio::select! {
            broadcast = broadcasts.recv() => {
                let Some(event) = broadcast else {
                    // Room actor gone (destroyed or shut down).
                    tracing::debug!(%session_id, "room channel closed");
                    break;
                };
                let bytes = state.codec.encode(&ServerMessage::Event(event))?;
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(%session_id, error = %e, "send failed");
                    break;
                }
            }

            inbound = conn.recv() => {
                match inbound {
                    Ok(Some(data)) => {
                        if handle_frame(&conn, &state, &session_id, &data)
                            .await?
                        {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::info!(%session_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%session_id, error = %e, "recv error");
                        break;
                    }
                }
            }
        }
    }

    // _guard drops here → leave fires.
    Ok(())
}

/// Waits for the JOIN_ROOM frame and returns the wallet it carries.
async fn await_join_request(
    conn: &WebSocketConnection,
    state: &Arc<ServerState>,
) -> Result<Option<String>, TilematesError> {
    let data = match tokio::time::timeout(JOIN_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before join request".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(TilematesError::Transport(e)),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage(
                "join request timed out".into(),
            )
            .into());
        }
    };

    match state.codec.decode(&data) {
        Ok(ClientMessage::Control(ControlMessage::JoinRoom { wallet })) => {
            Ok(wallet)
        }
        Ok(_) => {
            send_control(
                conn,
                &state.codec,
                &ServerControl::Error {
                    code: CODE_BAD_REQUEST,
                    message: "expected JOIN_ROOM".to_string(),
                },
            )
            .await?;
            Err(ProtocolError::InvalidMessage(
                "first frame must be JOIN_ROOM".into(),
            )
            .into())
        }
        Err(e) => {
            send_control(
                conn,
                &state.codec,
                &ServerControl::Error {
                    code: CODE_BAD_REQUEST,
                    message: "malformed join request".to_string(),
                },
            )
            .await?;
            Err(TilematesError::Protocol(e))
        }
    }
}

/// Processes one inbound frame. Returns `true` if the connection should
/// close.
async fn handle_frame(
    conn: &WebSocketConnection,
    state: &Arc<ServerState>,
    session_id: &SessionId,
    data: &[u8],
) -> Result<bool, TilematesError> {
    let message: ClientMessage = match state.codec.decode(data) {
        Ok(message) => message,
        Err(e) => {
            // A malformed frame is the client's problem, not grounds to
            // drop the connection.
            tracing::debug!(%session_id, error = %e, "dropping undecodable frame");
            return Ok(false);
        }
    };

    match message {
        ClientMessage::Event(event) => {
            let result = {
                let rooms = state.rooms.lock().await;
                rooms.route_event(session_id.clone(), event).await
            };
            if let Err(e) = result {
                tracing::debug!(%session_id, error = %e, "event not routed");
            }
            Ok(false)
        }

        ClientMessage::Control(ControlMessage::LeaveRoom) => {
            tracing::info!(%session_id, "client left the room");
            Ok(true)
        }

        ClientMessage::Control(ControlMessage::JoinRoom { .. }) => {
            send_control(
                conn,
                &state.codec,
                &ServerControl::Error {
                    code: CODE_BAD_REQUEST,
                    message: "already in a room".to_string(),
                },
            )
            .await?;
            Ok(false)
        }
    }
}

/// Maps an admission failure to the close code the client expects.
fn rejection_code(error: &RoomError) -> u16 {
    match error {
        RoomError::RoomFull(_) => CODE_ROOM_FULL,
        RoomError::DuplicateWallet(_) => CODE_DUPLICATE_WALLET,
        _ => CODE_BAD_REQUEST,
    }
}

/// Sends a connection-level control frame to the client.
async fn send_control(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    control: &ServerControl,
) -> Result<(), TilematesError> {
    let bytes = codec.encode(&ServerMessage::Control(control.clone()))?;
    conn.send(&bytes).await.map_err(TilematesError::Transport)?;
    Ok(())
}
