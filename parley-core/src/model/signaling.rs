use crate::model::conn::ConnId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Messages a client sends to the rendezvous server.
///
/// `sdp` and `candidate` are carried verbatim; the server routes on ids only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientSignal {
    JoinRoom {
        room_id: RoomId,
    },
    LeaveRoom,
    Offer {
        target: ConnId,
        caller: ConnId,
        sdp: Value,
    },
    Answer {
        caller: ConnId,
        sdp: Value,
    },
    IceCandidate {
        target: ConnId,
        candidate: Value,
    },
    HangUp {
        room_id: RoomId,
    },
}

impl ClientSignal {
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientSignal::JoinRoom { .. } => "join-room",
            ClientSignal::LeaveRoom => "leave-room",
            ClientSignal::Offer { .. } => "offer",
            ClientSignal::Answer { .. } => "answer",
            ClientSignal::IceCandidate { .. } => "ice-candidate",
            ClientSignal::HangUp { .. } => "hang-up",
        }
    }
}

/// Messages the rendezvous server sends to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerSignal {
    /// First frame on every socket: the id the transport assigned.
    Welcome {
        conn_id: ConnId,
        ice_servers: Vec<IceServerConfig>,
    },
    UserJoined {
        conn_id: ConnId,
    },
    AllUsers {
        conn_ids: Vec<ConnId>,
    },
    Offer {
        caller: ConnId,
        sdp: Value,
    },
    Answer {
        answerer: ConnId,
        sdp: Value,
    },
    IceCandidate {
        from: ConnId,
        candidate: Value,
    },
    UserLeft {
        conn_id: ConnId,
    },
    UserHungUp {
        conn_id: ConnId,
    },
    /// A relay addressed to `target` could not be delivered.
    DeliveryFailed {
        target: ConnId,
        event: String,
    },
}

impl ServerSignal {
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerSignal::Welcome { .. } => "welcome",
            ServerSignal::UserJoined { .. } => "user-joined",
            ServerSignal::AllUsers { .. } => "all-users",
            ServerSignal::Offer { .. } => "offer",
            ServerSignal::Answer { .. } => "answer",
            ServerSignal::IceCandidate { .. } => "ice-candidate",
            ServerSignal::UserLeft { .. } => "user-left",
            ServerSignal::UserHungUp { .. } => "user-hung-up",
            ServerSignal::DeliveryFailed { .. } => "delivery-failed",
        }
    }
}
