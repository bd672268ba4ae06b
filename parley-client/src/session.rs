use crate::error::EngineError;
use crate::manager::CallEvent;
use crate::media::{EngineEvent, MediaEngine, PeerConnection};
use crate::negotiation::{Effect, Negotiation, NegotiationEvent, NegotiationState, Role};
use crate::transport::SignalSink;
use parley_core::{ClientSignal, ConnId, IceServerConfig};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct SessionSetup {
    pub local_id: ConnId,
    pub remote_id: ConnId,
    pub role: Role,
    pub trickle: bool,
    pub timeout: Duration,
}

/// Sender side of a running [`PeerSession`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<NegotiationEvent>,
    role: Role,
}

impl SessionHandle {
    /// Returns `false` once the session has finished.
    pub fn send(&self, event: NegotiationEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Drives one [`Negotiation`] against one media-engine peer connection.
///
/// Inputs from the handle and callbacks from the engine are applied one at a
/// time, so the state machine sees a single ordered stream per remote peer.
pub struct PeerSession {
    remote_id: ConnId,
    local_id: ConnId,
    negotiation: Negotiation,
    peer: Box<dyn PeerConnection>,
    input_rx: mpsc::UnboundedReceiver<NegotiationEvent>,
    engine_rx: mpsc::UnboundedReceiver<EngineEvent>,
    signals: Arc<dyn SignalSink>,
    call_events: mpsc::UnboundedSender<CallEvent>,
    timeout: Duration,
}

impl PeerSession {
    /// Creates the peer connection and starts the session task.
    pub async fn spawn(
        setup: SessionSetup,
        engine: &dyn MediaEngine,
        ice_servers: &[IceServerConfig],
        signals: Arc<dyn SignalSink>,
        call_events: mpsc::UnboundedSender<CallEvent>,
    ) -> Result<SessionHandle, EngineError> {
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let peer = engine
            .create_peer_connection(setup.role, ice_servers, setup.trickle, engine_tx)
            .await?;

        let (tx, input_rx) = mpsc::unbounded_channel();
        let session = Self {
            remote_id: setup.remote_id,
            local_id: setup.local_id,
            negotiation: Negotiation::new(setup.trickle),
            peer,
            input_rx,
            engine_rx,
            signals,
            call_events,
            timeout: setup.timeout,
        };
        tokio::spawn(session.run());

        Ok(SessionHandle {
            tx,
            role: setup.role,
        })
    }

    pub async fn run(mut self) {
        info!("Session with {} started", self.remote_id);

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);
        let mut timer_armed = true;
        let mut engine_open = true;

        while !self.negotiation.is_closed() {
            let event = tokio::select! {
                input = self.input_rx.recv() => input.unwrap_or(NegotiationEvent::Close),

                engine = self.engine_rx.recv(), if engine_open => match engine {
                    Some(engine) => match self.on_engine_event(engine) {
                        Some(event) => event,
                        None => continue,
                    },
                    None => {
                        engine_open = false;
                        continue;
                    }
                },

                _ = &mut deadline, if timer_armed => {
                    timer_armed = false;
                    NegotiationEvent::Timeout
                }
            };

            self.apply(event).await;

            if self.negotiation.state() == NegotiationState::Connected {
                timer_armed = false;
            }
        }

        let _ = self.call_events.send(CallEvent::Closed {
            remote: self.remote_id.clone(),
        });
        info!("Session with {} finished", self.remote_id);
    }

    fn on_engine_event(&self, event: EngineEvent) -> Option<NegotiationEvent> {
        match event {
            EngineEvent::LocalDescription(sdp) => Some(NegotiationEvent::LocalDescriptionReady(sdp)),
            EngineEvent::LocalCandidate(candidate) => Some(NegotiationEvent::LocalCandidateReady(candidate)),
            EngineEvent::Connected => Some(NegotiationEvent::MediaConnected),
            EngineEvent::Failed(reason) => Some(NegotiationEvent::MediaFailed(reason)),
            EngineEvent::RemoteStream(stream) => {
                let _ = self.call_events.send(CallEvent::RemoteStream {
                    remote: self.remote_id.clone(),
                    stream,
                });
                None
            }
        }
    }

    /// Feeds `event` to the state machine and executes the resulting effects.
    /// A failing effect turns into a follow-up event for the same machine,
    /// whose effects replace whatever was still queued.
    async fn apply(&mut self, event: NegotiationEvent) {
        let mut queue: VecDeque<Effect> = self.negotiation.handle(event).into();

        while let Some(effect) = queue.pop_front() {
            if let Err(follow_up) = self.execute(effect).await {
                queue.clear();
                queue.extend(self.negotiation.handle(follow_up));
            }
        }
    }

    async fn execute(&mut self, effect: Effect) -> Result<(), NegotiationEvent> {
        debug!("{} -> {}: {:?}", self.local_id, self.remote_id, effect);

        match effect {
            Effect::GenerateOffer => self
                .peer
                .create_offer()
                .await
                .map_err(|e| NegotiationEvent::MediaFailed(e.to_string())),

            Effect::GenerateAnswer => self
                .peer
                .create_answer()
                .await
                .map_err(|e| NegotiationEvent::MediaFailed(e.to_string())),

            Effect::SendOffer(sdp) => self.signal(ClientSignal::Offer {
                target: self.remote_id.clone(),
                caller: self.local_id.clone(),
                sdp,
            }),

            Effect::SendAnswer(sdp) => self.signal(ClientSignal::Answer {
                caller: self.remote_id.clone(),
                sdp,
            }),

            Effect::SendCandidate(candidate) => self.signal(ClientSignal::IceCandidate {
                target: self.remote_id.clone(),
                candidate,
            }),

            Effect::ApplyRemoteDescription(sdp) => self
                .peer
                .set_remote_description(sdp)
                .await
                .map_err(|e| NegotiationEvent::RemoteDescriptionRejected(e.to_string())),

            Effect::ApplyRemoteCandidate(candidate) => {
                // One unusable candidate does not sink the negotiation.
                if let Err(e) = self.peer.add_remote_candidate(candidate).await {
                    warn!("Rejected ICE candidate from {}: {}", self.remote_id, e);
                }
                Ok(())
            }

            Effect::Connected => {
                info!("Connected to {}", self.remote_id);
                let _ = self.call_events.send(CallEvent::Connected {
                    remote: self.remote_id.clone(),
                });
                Ok(())
            }

            Effect::Failed(error) => {
                warn!("Negotiation with {} failed: {}", self.remote_id, error);
                let _ = self.call_events.send(CallEvent::Failed {
                    remote: self.remote_id.clone(),
                    error,
                });
                Ok(())
            }

            Effect::Teardown => {
                if let Err(e) = self.peer.close().await {
                    debug!("Teardown for {} reported: {}", self.remote_id, e);
                }
                Ok(())
            }
        }
    }

    fn signal(&self, signal: ClientSignal) -> Result<(), NegotiationEvent> {
        self.signals
            .send(signal)
            .map_err(|e| NegotiationEvent::MediaFailed(e.to_string()))
    }
}
