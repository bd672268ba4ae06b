use thiserror::Error;

/// Why a negotiation ended without a connection. Surfaced to the
/// application; the usual recovery is a fresh attempt from `Idle`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("negotiation failed: {0}")]
    NegotiationFailed(String),

    #[error("negotiation timed out")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("webrtc error: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("invalid session payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("local description unavailable")]
    MissingLocalDescription,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("signaling connection closed")]
    Disconnected,

    #[error("no welcome received from the server yet")]
    NotWelcomed,
}
