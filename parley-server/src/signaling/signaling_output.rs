use async_trait::async_trait;
use parley_core::{ConnId, ServerSignal};

/// Outbound side of the router: whatever owns the client sockets implements
/// this so the router can address connections by id.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue `signal` for `conn_id`. Must never wait on the client.
    async fn deliver(&self, conn_id: &ConnId, signal: ServerSignal);

    async fn broadcast(&self, targets: &[ConnId], signal: ServerSignal) {
        for target in targets {
            self.deliver(target, signal.clone()).await;
        }
    }
}
