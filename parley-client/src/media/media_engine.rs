use crate::error::EngineError;
use crate::negotiation::Role;
use async_trait::async_trait;
use parley_core::IceServerConfig;
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Handle to the local capture, attached to every peer connection made
/// after it was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStream {
    pub id: String,
    pub audio: bool,
    pub video: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub stream_id: String,
    pub track_id: String,
    pub kind: String,
}

/// Callbacks from a peer connection, in the order the engine produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Local description ready to be signaled. With trickle off this is
    /// only emitted after ICE gathering has completed.
    LocalDescription(Value),
    LocalCandidate(Value),
    RemoteStream(RemoteStream),
    Connected,
    Failed(String),
}

pub type EngineEvents = mpsc::UnboundedSender<EngineEvent>;

#[async_trait]
pub trait MediaEngine: Send + Sync {
    async fn create_local_media(&self, constraints: MediaConstraints) -> Result<LocalStream, EngineError>;

    async fn create_peer_connection(
        &self,
        role: Role,
        ice_servers: &[IceServerConfig],
        trickle: bool,
        events: EngineEvents,
    ) -> Result<Box<dyn PeerConnection>, EngineError>;
}

/// One media-level connection to a remote peer.
///
/// `create_offer` and `create_answer` return as soon as the description is
/// applied locally; the description itself arrives later as
/// [`EngineEvent::LocalDescription`].
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> Result<(), EngineError>;

    async fn create_answer(&self) -> Result<(), EngineError>;

    async fn set_remote_description(&self, sdp: Value) -> Result<(), EngineError>;

    async fn add_remote_candidate(&self, candidate: Value) -> Result<(), EngineError>;

    async fn close(&self) -> Result<(), EngineError>;
}
