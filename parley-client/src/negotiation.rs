//! Offer/answer/ICE negotiation with one remote peer.
//!
//! [`Negotiation`] is a plain state machine: it consumes discrete
//! [`NegotiationEvent`]s and returns the [`Effect`]s the caller must carry
//! out (talk to the media engine, send a signal, notify the application).
//! It never touches the network itself, which keeps ordering and candidate
//! buffering testable without a real peer connection.

use crate::error::NegotiationError;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferSent,
    OfferReceived,
    AnswerExchanged,
    Connected,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationEvent {
    /// Application wants to call the remote peer.
    CreateOffer,
    /// Application accepts the buffered remote offer.
    CreateAnswer,
    LocalDescriptionReady(Value),
    LocalCandidateReady(Value),
    RemoteOffer(Value),
    RemoteAnswer(Value),
    RemoteCandidate(Value),
    RemoteDescriptionRejected(String),
    MediaConnected,
    MediaFailed(String),
    Timeout,
    /// Local hang-up or transport loss.
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    GenerateOffer,
    GenerateAnswer,
    SendOffer(Value),
    SendAnswer(Value),
    SendCandidate(Value),
    ApplyRemoteDescription(Value),
    ApplyRemoteCandidate(Value),
    Connected,
    Failed(NegotiationError),
    /// Release every media-engine resource held for this peer.
    Teardown,
}

#[derive(Debug)]
pub struct Negotiation {
    state: NegotiationState,
    role: Option<Role>,
    trickle: bool,
    remote_offer: Option<Value>,
    remote_description_set: bool,
    pending_remote: Vec<Value>,
    pending_local: Vec<Value>,
    local_requested: bool,
    local_sent: bool,
}

impl Negotiation {
    pub fn new(trickle: bool) -> Self {
        Self {
            state: NegotiationState::Idle,
            role: None,
            trickle,
            remote_offer: None,
            remote_description_set: false,
            pending_remote: Vec::new(),
            pending_local: Vec::new(),
            local_requested: false,
            local_sent: false,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn is_closed(&self) -> bool {
        self.state == NegotiationState::Closed
    }

    /// Remote candidates waiting for a remote description.
    pub fn buffered_candidates(&self) -> usize {
        self.pending_remote.len()
    }

    pub fn handle(&mut self, event: NegotiationEvent) -> Vec<Effect> {
        use NegotiationEvent as E;
        use NegotiationState as S;

        if self.state == S::Closed {
            debug!("Ignoring {:?} on closed negotiation", event);
            return Vec::new();
        }

        match event {
            E::Close => self.close(),

            E::CreateOffer => {
                if self.state != S::Idle {
                    return Vec::new();
                }
                self.state = S::OfferSent;
                self.role = Some(Role::Initiator);
                self.local_requested = true;
                vec![Effect::GenerateOffer]
            }

            E::RemoteOffer(sdp) => {
                if self.state != S::Idle {
                    debug!("Ignoring remote offer in {:?}; renegotiation is not supported", self.state);
                    return Vec::new();
                }
                self.state = S::OfferReceived;
                self.role = Some(Role::Responder);
                self.remote_offer = Some(sdp);
                Vec::new()
            }

            E::CreateAnswer => {
                if self.state != S::OfferReceived || self.local_requested {
                    return Vec::new();
                }
                let Some(offer) = self.remote_offer.take() else {
                    return Vec::new();
                };
                self.local_requested = true;

                let mut effects = self.apply_remote_description(offer);
                effects.push(Effect::GenerateAnswer);
                effects
            }

            E::LocalDescriptionReady(sdp) => {
                if self.local_sent || !self.local_requested {
                    return Vec::new();
                }
                let send = match self.state {
                    S::OfferSent => Effect::SendOffer(sdp),
                    S::OfferReceived => {
                        self.state = S::AnswerExchanged;
                        Effect::SendAnswer(sdp)
                    }
                    _ => return Vec::new(),
                };
                self.local_sent = true;

                let mut effects = vec![send];
                effects.extend(self.pending_local.drain(..).map(Effect::SendCandidate));
                effects
            }

            E::LocalCandidateReady(candidate) => {
                if !self.trickle {
                    return Vec::new();
                }
                if !self.local_sent {
                    self.pending_local.push(candidate);
                    return Vec::new();
                }
                vec![Effect::SendCandidate(candidate)]
            }

            E::RemoteAnswer(sdp) => {
                if self.state != S::OfferSent || !self.local_sent {
                    debug!("Ignoring remote answer in {:?}", self.state);
                    return Vec::new();
                }
                self.state = S::AnswerExchanged;
                self.apply_remote_description(sdp)
            }

            E::RemoteCandidate(candidate) => {
                if self.remote_description_set {
                    vec![Effect::ApplyRemoteCandidate(candidate)]
                } else {
                    self.pending_remote.push(candidate);
                    Vec::new()
                }
            }

            E::MediaConnected => {
                if self.state != S::AnswerExchanged {
                    return Vec::new();
                }
                self.state = S::Connected;
                vec![Effect::Connected]
            }

            E::RemoteDescriptionRejected(reason) | E::MediaFailed(reason) => {
                self.fail(NegotiationError::NegotiationFailed(reason))
            }

            E::Timeout => {
                if self.state == S::Connected {
                    return Vec::new();
                }
                self.fail(NegotiationError::Timeout)
            }
        }
    }

    fn apply_remote_description(&mut self, sdp: Value) -> Vec<Effect> {
        self.remote_description_set = true;

        let mut effects = vec![Effect::ApplyRemoteDescription(sdp)];
        effects.extend(self.pending_remote.drain(..).map(Effect::ApplyRemoteCandidate));
        effects
    }

    fn fail(&mut self, err: NegotiationError) -> Vec<Effect> {
        let mut effects = vec![Effect::Failed(err)];
        effects.extend(self.close());
        effects
    }

    fn close(&mut self) -> Vec<Effect> {
        self.state = NegotiationState::Closed;
        self.remote_offer = None;
        self.pending_remote.clear();
        self.pending_local.clear();
        vec![Effect::Teardown]
    }
}
