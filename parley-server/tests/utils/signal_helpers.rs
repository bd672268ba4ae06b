use parley_core::{ClientSignal, ConnId, RoomId, ServerSignal};
use parley_server::{Router, RouterCommand, RouterStats};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::mock_signaling::MockSignalingOutput;

/// A router actor running on the test runtime with a recording output.
pub struct TestRouter {
    pub cmd_tx: mpsc::Sender<RouterCommand>,
    pub output: MockSignalingOutput,
}

impl TestRouter {
    pub fn spawn() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RouterCommand>(100);
        let output = MockSignalingOutput::new();

        let router = Router::new(cmd_rx, Arc::new(output.clone()));
        tokio::spawn(router.run());

        Self { cmd_tx, output }
    }

    pub async fn connect(&self, name: &str) -> ConnId {
        let conn_id = ConnId::from(name);
        self.cmd_tx
            .send(RouterCommand::Connect {
                conn_id: conn_id.clone(),
            })
            .await
            .expect("router alive");
        conn_id
    }

    pub async fn send(&self, conn_id: &ConnId, signal: ClientSignal) {
        self.cmd_tx
            .send(RouterCommand::Signal {
                conn_id: conn_id.clone(),
                signal,
            })
            .await
            .expect("router alive");
    }

    pub async fn join(&self, conn_id: &ConnId, room: &str) {
        self.send(
            conn_id,
            ClientSignal::JoinRoom {
                room_id: RoomId::from(room),
            },
        )
        .await;
    }

    pub async fn offer(&self, from: &ConnId, target: &ConnId, sdp: Value) {
        self.send(
            from,
            ClientSignal::Offer {
                target: target.clone(),
                caller: from.clone(),
                sdp,
            },
        )
        .await;
    }

    pub async fn disconnect(&self, conn_id: &ConnId) {
        self.cmd_tx
            .send(RouterCommand::Disconnect {
                conn_id: conn_id.clone(),
            })
            .await
            .expect("router alive");
    }

    /// Round-trips a stats request; every earlier command has been applied
    /// once this returns.
    pub async fn sync(&self) -> RouterStats {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(RouterCommand::Stats { reply })
            .await
            .expect("router alive");
        rx.await.expect("router replied")
    }

    pub async fn received(&self, conn_id: &ConnId) -> Vec<ServerSignal> {
        self.sync().await;
        self.output.signals_for(conn_id).await
    }

    /// Forgets everything delivered so far.
    pub async fn reset(&self) {
        self.sync().await;
        self.output.clear().await;
    }
}

pub fn ids(names: &[&str]) -> Vec<ConnId> {
    names.iter().map(|n| ConnId::from(*n)).collect()
}
