mod config;
mod error;
mod manager;
pub mod media;
pub mod negotiation;
mod session;
mod transport;

pub use config::ClientConfig;
pub use error::{ClientError, EngineError, NegotiationError};
pub use manager::{CallEvent, CallManager};
pub use media::{
    EngineEvent, EngineEvents, LocalStream, MediaConstraints, MediaEngine, PeerConnection,
    RemoteStream, WebRtcEngine,
};
pub use negotiation::{Effect, Negotiation, NegotiationEvent, NegotiationState, Role};
pub use session::{PeerSession, SessionHandle, SessionSetup};
pub use transport::{SignalSink, SignalingClient};
