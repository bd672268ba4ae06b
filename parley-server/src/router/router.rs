use crate::error::RouteError;
use crate::registry::{ConnectionRegistry, RoomDirectory};
use crate::router::router_command::{RouterCommand, RouterStats};
use crate::signaling::SignalingOutput;
use parley_core::{ClientSignal, ConnId, RoomId, ServerSignal};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The signaling router.
///
/// A single actor owns the registry and the directory, so every join, leave
/// and unregister is applied atomically with respect to all other commands,
/// and fan-out always uses the member snapshot taken by the same mutation.
pub struct Router {
    registry: ConnectionRegistry,
    directory: RoomDirectory,
    command_rx: mpsc::Receiver<RouterCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

impl Router {
    pub fn new(command_rx: mpsc::Receiver<RouterCommand>, signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            directory: RoomDirectory::new(),
            command_rx,
            signaling,
        }
    }

    pub async fn run(mut self) {
        info!("Router event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Router event loop finished");
    }

    async fn handle_command(&mut self, cmd: RouterCommand) {
        match cmd {
            RouterCommand::Connect { conn_id } => {
                if !self.registry.register(conn_id.clone()) {
                    warn!("Connection {} registered twice", conn_id);
                }
            }

            RouterCommand::Signal { conn_id, signal } => {
                let event = signal.event_name();
                if let Err(e) = self.handle_signal(&conn_id, signal).await {
                    warn!("Dropped '{}' from {}: {}", event, conn_id, e);
                }
            }

            RouterCommand::Disconnect { conn_id } => self.disconnect(&conn_id).await,

            RouterCommand::Stats { reply } => {
                let _ = reply.send(RouterStats {
                    connections: self.registry.len(),
                    rooms: self.directory.room_count(),
                });
            }
        }
    }

    async fn handle_signal(&mut self, sender: &ConnId, signal: ClientSignal) -> Result<(), RouteError> {
        if !self.registry.contains(sender) {
            return Err(RouteError::NotRegistered(sender.clone()));
        }

        match signal {
            ClientSignal::JoinRoom { room_id } => self.join(sender, room_id).await,
            ClientSignal::LeaveRoom => {
                if let Some(room_id) = self.registry.set_room(sender, None)? {
                    self.leave(sender, &room_id).await;
                }
                Ok(())
            }
            ClientSignal::Offer {
                target,
                caller,
                sdp,
            } => self.offer(sender, target, caller, sdp).await,
            ClientSignal::Answer { caller, sdp } => self.answer(sender, caller, sdp).await,
            ClientSignal::IceCandidate { target, candidate } => {
                self.ice_candidate(sender, target, candidate).await;
                Ok(())
            }
            ClientSignal::HangUp { room_id } => self.hang_up(sender, room_id).await,
        }
    }

    async fn join(&mut self, sender: &ConnId, room_id: RoomId) -> Result<(), RouteError> {
        let current = self.registry.room_of(sender).cloned();
        if current.as_ref() == Some(&room_id) {
            debug!("{} is already in room '{}'", sender, room_id);
            return Ok(());
        }

        if let Some(old_room) = current {
            info!("{} switches from room '{}' to '{}'", sender, old_room, room_id);
            self.leave(sender, &old_room).await;
        }

        self.registry.set_room(sender, Some(room_id.clone()))?;
        let previous = self.directory.join(&room_id, sender);
        info!(
            "{} joined room '{}' ({} already there)",
            sender,
            room_id,
            previous.len()
        );

        self.signaling
            .broadcast(
                &previous,
                ServerSignal::UserJoined {
                    conn_id: sender.clone(),
                },
            )
            .await;
        self.signaling
            .deliver(sender, ServerSignal::AllUsers { conn_ids: previous })
            .await;

        Ok(())
    }

    /// Takes `conn_id` out of the directory and tells whoever remains.
    /// The registry entry is the caller's business.
    async fn leave(&mut self, conn_id: &ConnId, room_id: &RoomId) {
        let Some(remaining) = self.directory.leave(room_id, conn_id) else {
            return;
        };
        info!("{} left room '{}'", conn_id, room_id);

        self.signaling
            .broadcast(
                &remaining,
                ServerSignal::UserLeft {
                    conn_id: conn_id.clone(),
                },
            )
            .await;
    }

    async fn offer(
        &mut self,
        sender: &ConnId,
        target: ConnId,
        caller: ConnId,
        sdp: Value,
    ) -> Result<(), RouteError> {
        if &caller != sender {
            warn!("{} sent an offer claiming caller {}; using sender id", sender, caller);
        }
        self.ensure_target(sender, &target, "offer").await?;

        self.signaling
            .deliver(
                &target,
                ServerSignal::Offer {
                    caller: sender.clone(),
                    sdp,
                },
            )
            .await;
        Ok(())
    }

    async fn answer(&mut self, sender: &ConnId, caller: ConnId, sdp: Value) -> Result<(), RouteError> {
        self.ensure_target(sender, &caller, "answer").await?;

        self.signaling
            .deliver(
                &caller,
                ServerSignal::Answer {
                    answerer: sender.clone(),
                    sdp,
                },
            )
            .await;
        Ok(())
    }

    async fn ice_candidate(&mut self, sender: &ConnId, target: ConnId, candidate: Value) {
        // Late candidates for a peer that already left are routine.
        if !self.registry.contains(&target) {
            debug!("Dropping ICE candidate from {} for unknown {}", sender, target);
            return;
        }

        self.signaling
            .deliver(
                &target,
                ServerSignal::IceCandidate {
                    from: sender.clone(),
                    candidate,
                },
            )
            .await;
    }

    async fn hang_up(&mut self, sender: &ConnId, room_id: RoomId) -> Result<(), RouteError> {
        if self.registry.room_of(sender) != Some(&room_id) {
            return Err(RouteError::RoomMismatch {
                conn_id: sender.clone(),
                room_id,
            });
        }

        let others: Vec<ConnId> = self
            .directory
            .members(&room_id)
            .into_iter()
            .filter(|m| m != sender)
            .collect();

        self.signaling
            .broadcast(
                &others,
                ServerSignal::UserHungUp {
                    conn_id: sender.clone(),
                },
            )
            .await;
        Ok(())
    }

    async fn disconnect(&mut self, conn_id: &ConnId) {
        if let Some(room_id) = self.registry.unregister(conn_id) {
            self.leave(conn_id, &room_id).await;
        }
        debug!("{} unregistered", conn_id);
    }

    /// Checks that `target` is live; otherwise tells `sender` the relay failed.
    async fn ensure_target(&self, sender: &ConnId, target: &ConnId, event: &str) -> Result<(), RouteError> {
        if self.registry.contains(target) {
            return Ok(());
        }

        self.signaling
            .deliver(
                sender,
                ServerSignal::DeliveryFailed {
                    target: target.clone(),
                    event: event.to_owned(),
                },
            )
            .await;
        Err(RouteError::UnknownTarget(target.clone()))
    }
}
