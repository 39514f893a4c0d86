//! Room actor: an isolated Tokio task that owns one session registry.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. No shared mutable state — per-room isolation
//! is structural, not a discipline the rest of the server has to keep.
//!
//! Per connection, the actor implements the relay state machine:
//!
//! ```text
//! CONNECTING ──(admission accepts)──→ ADMITTED ──(first event)──→ ACTIVE
//!                                         │                          │
//!                                         └───────(disconnect)───────┴──→ LEFT
//! ```
//!
//! Commands from one session are processed and broadcast in receipt
//! order; across sessions there is no global ordering — concurrent moves
//! may be observed differently by different peers, which the domain
//! (visual position sync) tolerates.

use tilemates_protocol::{ClientEvent, RoomId, ServerEvent, SessionId};
use tokio::sync::{mpsc, oneshot};

use crate::{AdmissionPolicy, RoomConfig, RoomError, SessionRegistry};

/// Channel sender for delivering room broadcasts to one session's
/// connection handler.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Admit a session into the room.
    Join {
        session_id: SessionId,
        wallet: Option<String>,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a session from the room. Idempotent.
    Leave {
        session_id: SessionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Deliver a relay event from a session.
    Event {
        sender_id: SessionId,
        event: ClientEvent,
    },

    /// Request current room occupancy metadata.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// A snapshot of room metadata (occupancy, not player state).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's unique ID.
    pub room_id: RoomId,
    /// Number of sessions currently in the room.
    pub occupancy: usize,
    /// Maximum sessions allowed.
    pub max_clients: usize,
}

impl RoomInfo {
    /// Returns `true` if another session could be admitted on capacity
    /// grounds (wallet uniqueness is still checked at join).
    pub fn has_capacity(&self) -> bool {
        self.occupancy < self.max_clients
    }
}

/// Handle to a running room actor. Cheap to clone — it's an
/// `mpsc::Sender` wrapper. The `RoomManager` holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Requests admission for a session. Resolves once the actor has
    /// run admission and, on success, registered the session.
    pub async fn join(
        &self,
        session_id: SessionId,
        wallet: Option<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                session_id,
                wallet,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Sends a leave request to the room.
    pub async fn leave(&self, session_id: SessionId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                session_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Sends a relay event to the room (fire-and-forget).
    pub async fn send_event(
        &self,
        sender_id: SessionId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Event { sender_id, event })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    config: RoomConfig,
    policy: AdmissionPolicy,
    registry: SessionRegistry,
    /// Per-session outbound channels.
    senders: std::collections::HashMap<SessionId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    session_id,
                    wallet,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(session_id, wallet, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { session_id, reply } => {
                    let result = self.handle_leave(session_id);
                    let _ = reply.send(result);
                }
                RoomCommand::Event { sender_id, event } => {
                    self.handle_event(sender_id, event);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_id = %self.room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    /// Admission → registry create → `PLAYER_JOINED` to everyone else →
    /// `CURRENT_PLAYERS` to the joiner after the configured delay.
    fn handle_join(
        &mut self,
        session_id: SessionId,
        wallet: Option<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        // Reject before any state exists; a turned-away join leaves no
        // trace in the registry or the sender map.
        self.policy
            .review(&self.registry, wallet.as_deref())
            .map_err(|r| r.into_room_error(self.room_id))?;

        let record = self.registry.create(session_id.clone(), wallet)?.clone();
        self.senders.insert(session_id.clone(), sender);

        tracing::info!(
            room_id = %self.room_id,
            %session_id,
            occupancy = self.registry.len(),
            "session joined"
        );

        self.broadcast_except(
            &session_id,
            ServerEvent::PlayerJoined { session: record },
        );

        // Snapshot taken now, delivered after the settle delay so the
        // joining client finishes scene setup first. The snapshot is
        // consistent as of the join; later changes reach the joiner as
        // ordinary broadcasts on the same channel.
        let snapshot = self.registry.snapshot();
        if let Some(tx) = self.senders.get(&session_id) {
            let event = ServerEvent::CurrentPlayers { players: snapshot };
            if self.config.snapshot_delay.is_zero() {
                let _ = tx.send(event);
            } else {
                let tx = tx.clone();
                let delay = self.config.snapshot_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(event);
                });
            }
        }

        Ok(())
    }

    /// Registry remove + `PLAYER_LEFT` broadcast. A second leave for the
    /// same session is a no-op, not an error.
    fn handle_leave(&mut self, session_id: SessionId) -> Result<(), RoomError> {
        self.senders.remove(&session_id);

        let Some(record) = self.registry.remove(&session_id) else {
            tracing::debug!(
                room_id = %self.room_id,
                %session_id,
                "duplicate leave ignored"
            );
            return Ok(());
        };

        tracing::info!(
            room_id = %self.room_id,
            %session_id,
            occupancy = self.registry.len(),
            "session left"
        );

        self.broadcast_all(ServerEvent::PlayerLeft {
            session_id,
            map: record.map,
        });

        Ok(())
    }

    /// Applies a relay event to the registry and broadcasts the result.
    ///
    /// Events from sessions absent from the registry are dropped: the
    /// sender is desynchronized, and any auto-repair here would race its
    /// future messages. Nothing a single client sends can take the room
    /// down.
    fn handle_event(&mut self, sender_id: SessionId, event: ClientEvent) {
        match event {
            ClientEvent::PlayerMoved { x, y, position } => {
                let record =
                    match self.registry.update_position(&sender_id, x, y) {
                        Ok(r) => r.clone(),
                        Err(_) => {
                            self.warn_unknown(&sender_id, "PLAYER_MOVED");
                            return;
                        }
                    };
                self.broadcast_except(
                    &sender_id,
                    ServerEvent::PlayerMoved {
                        session: record,
                        position,
                    },
                );
            }

            ClientEvent::PlayerMovementEnded { position } => {
                // No registry mutation — position is unchanged, only the
                // resting facing travels to peers.
                let Some(record) = self.registry.get(&sender_id) else {
                    self.warn_unknown(&sender_id, "PLAYER_MOVEMENT_ENDED");
                    return;
                };
                let event = ServerEvent::PlayerMovementEnded {
                    session_id: sender_id.clone(),
                    map: record.map.clone(),
                    position,
                };
                self.broadcast_except(&sender_id, event);
            }

            ClientEvent::PlayerChangedMap { map } => {
                let (x, y) = (self.config.reentry_x, self.config.reentry_y);
                let record =
                    match self.registry.update_map(&sender_id, map, x, y) {
                        Ok(r) => r.clone(),
                        Err(_) => {
                            self.warn_unknown(&sender_id, "PLAYER_CHANGED_MAP");
                            return;
                        }
                    };

                let snapshot = self.registry.snapshot();

                // The mover repopulates its mirror set from a fresh
                // snapshot; everyone else learns the new map and the
                // canonical re-entry point.
                self.send_to(
                    &sender_id,
                    ServerEvent::CurrentPlayers {
                        players: snapshot.clone(),
                    },
                );
                self.broadcast_except(
                    &sender_id,
                    ServerEvent::PlayerChangedMap {
                        session_id: sender_id.clone(),
                        map: record.map,
                        x,
                        y,
                        players: snapshot,
                    },
                );
            }
        }
    }

    fn warn_unknown(&self, session_id: &SessionId, kind: &str) {
        tracing::warn!(
            room_id = %self.room_id,
            %session_id,
            kind,
            "event from unknown session, dropping"
        );
    }

    /// Sends an event to every session except `excluded`.
    fn broadcast_except(&self, excluded: &SessionId, event: ServerEvent) {
        for (session_id, sender) in &self.senders {
            if session_id != excluded {
                let _ = sender.send(event.clone());
            }
        }
    }

    /// Sends an event to every remaining session.
    fn broadcast_all(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }

    /// Sends an event to a single session. Silently drops if the
    /// receiver is gone (connection already closed).
    fn send_to(&self, session_id: &SessionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(session_id) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            occupancy: self.registry.len(),
            max_clients: self.config.max_clients,
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate
/// with it. The command channel is bounded by `config.channel_size`.
pub(crate) fn spawn_room(room_id: RoomId, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let actor = RoomActor {
        room_id,
        policy: AdmissionPolicy::new(config.max_clients),
        registry: SessionRegistry::new(config.spawn.clone()),
        senders: std::collections::HashMap::new(),
        config,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
