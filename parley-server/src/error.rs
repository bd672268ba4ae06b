use parley_core::{ConnId, RoomId};
use thiserror::Error;

/// Reasons the router refuses to act on a message.
///
/// None of these are fatal: the router logs them and keeps serving every
/// other connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("target connection {0} is not registered")]
    UnknownTarget(ConnId),

    #[error("connection {0} sent a signal before registering")]
    NotRegistered(ConnId),

    #[error("connection {conn_id} is not in room '{room_id}'")]
    RoomMismatch { conn_id: ConnId, room_id: RoomId },

    #[error("malformed message: {0}")]
    MalformedMessage(String),
}
