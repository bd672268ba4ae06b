use crate::config::ClientConfig;
use crate::error::{ClientError, NegotiationError};
use crate::media::{LocalStream, MediaEngine, RemoteStream};
use crate::negotiation::{NegotiationEvent, Role};
use crate::session::{PeerSession, SessionHandle, SessionSetup};
use crate::transport::SignalSink;
use parley_core::{ClientSignal, ConnId, IceServerConfig, RoomId, ServerSignal};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What the application hears about.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    Welcome { conn_id: ConnId },
    /// Members that were in the room when we joined.
    RoomMembers { conn_ids: Vec<ConnId> },
    PeerJoined { conn_id: ConnId },
    PeerLeft { conn_id: ConnId },
    PeerHungUp { conn_id: ConnId },
    /// An offer is waiting for [`CallManager::answer`]. Only emitted when
    /// auto-answer is off.
    IncomingCall { caller: ConnId },
    RemoteStream { remote: ConnId, stream: RemoteStream },
    Connected { remote: ConnId },
    Failed { remote: ConnId, error: NegotiationError },
    Closed { remote: ConnId },
    DeliveryFailed { target: ConnId, event: String },
}

/// Client-side call bookkeeping: one [`PeerSession`] per remote peer.
pub struct CallManager {
    config: ClientConfig,
    engine: Arc<dyn MediaEngine>,
    signals: Arc<dyn SignalSink>,
    events: mpsc::UnboundedSender<CallEvent>,
    sessions: HashMap<ConnId, SessionHandle>,
    local_id: Option<ConnId>,
    room: Option<RoomId>,
    ice_servers: Vec<IceServerConfig>,
}

impl CallManager {
    pub fn new(
        config: ClientConfig,
        engine: Arc<dyn MediaEngine>,
        signals: Arc<dyn SignalSink>,
    ) -> (Self, mpsc::UnboundedReceiver<CallEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let ice_servers = config.ice_servers.clone().unwrap_or_default();

        let manager = Self {
            config,
            engine,
            signals,
            events,
            sessions: HashMap::new(),
            local_id: None,
            room: None,
            ice_servers,
        };
        (manager, events_rx)
    }

    pub fn local_id(&self) -> Option<&ConnId> {
        self.local_id.as_ref()
    }

    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Remote peers with a live session, sorted.
    pub fn peers(&self) -> Vec<ConnId> {
        let mut peers: Vec<ConnId> = self
            .sessions
            .iter()
            .filter(|(_, handle)| !handle.is_closed())
            .map(|(id, _)| id.clone())
            .collect();
        peers.sort();
        peers
    }

    /// Captures local media; later sessions send it to their peer.
    pub async fn start_media(&self) -> Result<LocalStream, ClientError> {
        Ok(self.engine.create_local_media(self.config.constraints).await?)
    }

    pub async fn handle_signal(&mut self, signal: ServerSignal) -> Result<(), ClientError> {
        match signal {
            ServerSignal::Welcome { conn_id, ice_servers } => {
                info!("Assigned connection id {}", conn_id);
                if self.config.ice_servers.is_none() {
                    self.ice_servers = ice_servers;
                }
                self.local_id = Some(conn_id.clone());
                self.emit(CallEvent::Welcome { conn_id });

                if let Some(room) = self.config.room.clone() {
                    self.join_room(room)?;
                }
            }

            ServerSignal::AllUsers { conn_ids } => {
                // Existing members call us once they see `user-joined`.
                debug!("Room has {} other member(s)", conn_ids.len());
                self.emit(CallEvent::RoomMembers { conn_ids });
            }

            ServerSignal::UserJoined { conn_id } => {
                self.emit(CallEvent::PeerJoined {
                    conn_id: conn_id.clone(),
                });
                if self.config.auto_connect {
                    self.call(conn_id).await?;
                }
            }

            ServerSignal::Offer { caller, sdp } => self.on_offer(caller, sdp).await?,

            ServerSignal::Answer { answerer, sdp } => {
                self.forward(&answerer, NegotiationEvent::RemoteAnswer(sdp));
            }

            ServerSignal::IceCandidate { from, candidate } => {
                self.forward(&from, NegotiationEvent::RemoteCandidate(candidate));
            }

            ServerSignal::UserLeft { conn_id } => {
                self.close_session(&conn_id);
                self.emit(CallEvent::PeerLeft { conn_id });
            }

            ServerSignal::UserHungUp { conn_id } => {
                self.close_session(&conn_id);
                self.emit(CallEvent::PeerHungUp { conn_id });
            }

            ServerSignal::DeliveryFailed { target, event } => {
                warn!("Server could not deliver '{}' to {}", event, target);
                self.close_session(&target);
                self.emit(CallEvent::DeliveryFailed { target, event });
            }
        }
        Ok(())
    }

    /// Joins `room`, hanging up every call from the previous room first.
    pub fn join_room(&mut self, room: RoomId) -> Result<(), ClientError> {
        if self.room.as_ref() == Some(&room) {
            return Ok(());
        }
        if self.room.is_some() {
            self.hang_up_all()?;
        }

        info!("Joining room '{}'", room);
        self.signals.send(ClientSignal::JoinRoom {
            room_id: room.clone(),
        })?;
        self.room = Some(room);
        Ok(())
    }

    pub fn leave_room(&mut self) -> Result<(), ClientError> {
        self.close_all();
        if self.room.take().is_some() {
            self.signals.send(ClientSignal::LeaveRoom)?;
        }
        Ok(())
    }

    /// Starts a negotiation as initiator. A live session with `remote` is
    /// reused.
    pub async fn call(&mut self, remote: ConnId) -> Result<(), ClientError> {
        if let Some(handle) = self.live_session(&remote) {
            handle.send(NegotiationEvent::CreateOffer);
            return Ok(());
        }

        let handle = self.spawn_session(remote.clone(), Role::Initiator).await?;
        handle.send(NegotiationEvent::CreateOffer);
        self.sessions.insert(remote, handle);
        Ok(())
    }

    /// Accepts the pending offer from `caller`.
    pub fn answer(&mut self, caller: &ConnId) -> bool {
        match self.live_session(caller) {
            Some(handle) => handle.send(NegotiationEvent::CreateAnswer),
            None => false,
        }
    }

    /// Ends the call with one peer without telling the rest of the room.
    pub fn hang_up(&mut self, remote: &ConnId) {
        self.close_session(remote);
    }

    /// Ends every call and announces `hang-up` to the current room.
    pub fn hang_up_all(&mut self) -> Result<(), ClientError> {
        self.close_all();
        if let Some(room_id) = self.room.clone() {
            self.signals.send(ClientSignal::HangUp { room_id })?;
        }
        Ok(())
    }

    async fn on_offer(&mut self, caller: ConnId, sdp: serde_json::Value) -> Result<(), ClientError> {
        if let Some(handle) = self.live_session(&caller) {
            handle.send(NegotiationEvent::RemoteOffer(sdp));
            return Ok(());
        }

        let handle = self.spawn_session(caller.clone(), Role::Responder).await?;
        handle.send(NegotiationEvent::RemoteOffer(sdp));

        if self.config.auto_answer {
            handle.send(NegotiationEvent::CreateAnswer);
        } else {
            self.emit(CallEvent::IncomingCall {
                caller: caller.clone(),
            });
        }
        self.sessions.insert(caller, handle);
        Ok(())
    }

    async fn spawn_session(&self, remote: ConnId, role: Role) -> Result<SessionHandle, ClientError> {
        let local_id = self.local_id.clone().ok_or(ClientError::NotWelcomed)?;
        let setup = SessionSetup {
            local_id,
            remote_id: remote,
            role,
            trickle: self.config.trickle,
            timeout: self.config.negotiation_timeout,
        };

        let handle = PeerSession::spawn(
            setup,
            self.engine.as_ref(),
            &self.ice_servers,
            Arc::clone(&self.signals),
            self.events.clone(),
        )
        .await?;
        Ok(handle)
    }

    fn live_session(&self, remote: &ConnId) -> Option<&SessionHandle> {
        self.sessions.get(remote).filter(|handle| !handle.is_closed())
    }

    fn forward(&self, remote: &ConnId, event: NegotiationEvent) {
        match self.live_session(remote) {
            Some(handle) => {
                handle.send(event);
            }
            None => debug!("No session with {}; dropping {:?}", remote, event),
        }
    }

    fn close_session(&mut self, remote: &ConnId) {
        if let Some(handle) = self.sessions.remove(remote) {
            handle.send(NegotiationEvent::Close);
        }
    }

    fn close_all(&mut self) {
        for (_, handle) in self.sessions.drain() {
            handle.send(NegotiationEvent::Close);
        }
    }

    fn emit(&self, event: CallEvent) {
        let _ = self.events.send(event);
    }
}
