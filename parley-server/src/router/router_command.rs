use parley_core::{ClientSignal, ConnId};
use serde::Serialize;
use tokio::sync::oneshot;

/// Commands the transport layer feeds into the router.
#[derive(Debug)]
pub enum RouterCommand {
    /// A socket opened and was assigned `conn_id`.
    Connect { conn_id: ConnId },

    /// A well-formed signal arrived on `conn_id`'s socket.
    Signal {
        conn_id: ConnId,
        signal: ClientSignal,
    },

    /// The socket closed. Safe to send more than once.
    Disconnect { conn_id: ConnId },

    Stats { reply: oneshot::Sender<RouterStats> },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RouterStats {
    pub connections: usize,
    pub rooms: usize,
}
