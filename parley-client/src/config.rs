use crate::media::MediaConstraints;
use parley_core::utils::DEFAULT_SIGNALING_PORT;
use parley_core::{IceServerConfig, RoomId};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the rendezvous server.
    pub url: String,
    /// Joined right after the server's welcome, if set.
    pub room: Option<RoomId>,
    /// Overrides whatever the server hands out in `welcome`.
    pub ice_servers: Option<Vec<IceServerConfig>>,
    /// Send candidates one by one instead of waiting for gathering to finish.
    pub trickle: bool,
    /// Call every peer that joins our room.
    pub auto_connect: bool,
    /// Answer incoming offers without asking the application.
    pub auto_answer: bool,
    pub negotiation_timeout: Duration,
    pub constraints: MediaConstraints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: format!("ws://127.0.0.1:{}/ws", DEFAULT_SIGNALING_PORT),
            room: None,
            ice_servers: None,
            trickle: false,
            auto_connect: true,
            auto_answer: true,
            negotiation_timeout: Duration::from_secs(30),
            constraints: MediaConstraints::default(),
        }
    }
}
