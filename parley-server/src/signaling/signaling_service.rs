use crate::router::{RouterCommand, RouterStats};
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use parley_core::{ConnId, IceServerConfig, ServerSignal};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<ConnId, mpsc::UnboundedSender<Message>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Holds one unbounded outbound queue per open socket and the router's
/// command sender. Cheap to clone.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) router_tx: mpsc::Sender<RouterCommand>,
}

impl SignalingService {
    pub fn new(router_tx: mpsc::Sender<RouterCommand>, ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
                ice_servers,
            }),
            router_tx,
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn add_peer(&self, conn_id: ConnId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(conn_id, tx);
    }

    /// Drops the queue; anything still buffered for this peer is discarded.
    pub fn remove_peer(&self, conn_id: &ConnId) {
        self.inner.peers.remove(conn_id);
    }

    pub fn send_signal(&self, conn_id: &ConnId, msg: &ServerSignal) {
        if let Some(peer) = self.inner.peers.get(conn_id) {
            match serde_json::to_string(msg) {
                Ok(json) => {
                    if let Err(e) = peer.send(Message::Text(json.into())) {
                        error!("Failed to send WS message to {}: {:?}", conn_id, e);
                    }
                }
                Err(e) => error!("Failed to serialize signal message: {}", e),
            }
        } else {
            warn!(
                "Attempted to send '{}' to disconnected connection {}",
                msg.event_name(),
                conn_id
            );
        }
    }

    /// Asks the router for a snapshot. `None` if the router is gone.
    pub async fn stats(&self) -> Option<RouterStats> {
        let (reply, rx) = oneshot::channel();
        self.router_tx.send(RouterCommand::Stats { reply }).await.ok()?;
        rx.await.ok()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn deliver(&self, conn_id: &ConnId, signal: ServerSignal) {
        self.send_signal(conn_id, &signal);
    }
}
