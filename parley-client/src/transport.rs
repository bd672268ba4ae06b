use crate::error::ClientError;
use futures::{SinkExt, StreamExt};
use parley_core::{ClientSignal, ServerSignal};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Outbound half of the signaling channel.
pub trait SignalSink: Send + Sync {
    fn send(&self, signal: ClientSignal) -> Result<(), ClientError>;
}

enum Outbound {
    Signal(ClientSignal),
    Close,
}

/// WebSocket connection to the rendezvous server.
///
/// Writes go through an unbounded queue drained by a writer task, so
/// [`SignalSink::send`] never blocks the caller. Call [`SignalingClient::close`]
/// before exiting to make sure queued signals reach the server.
#[derive(Clone)]
pub struct SignalingClient {
    outbound: mpsc::UnboundedSender<Outbound>,
    writer: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SignalingClient {
    /// Connects to `url` and returns the sink together with the stream of
    /// decoded server signals. The stream ends when the socket closes.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::UnboundedReceiver<ServerSignal>), ClientError> {
        let (ws, _) = connect_async(url).await?;
        info!("Connected to signaling server at {}", url);

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerSignal>();

        let writer = tokio::spawn(async move {
            while let Some(Outbound::Signal(signal)) = out_rx.recv().await {
                let text = match serde_json::to_string(&signal) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode '{}': {}", signal.event_name(), e);
                        continue;
                    }
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
            debug!("Signaling writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Signaling socket error: {}", e);
                        break;
                    }
                };

                match serde_json::from_str::<ServerSignal>(text.as_str()) {
                    Ok(signal) => {
                        if in_tx.send(signal).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Skipping undecodable server frame: {}", e),
                }
            }
            debug!("Signaling reader finished");
        });

        let client = Self {
            outbound: out_tx,
            writer: Arc::new(Mutex::new(Some(writer))),
        };
        Ok((client, in_rx))
    }

    /// Flushes everything queued so far, then closes the socket. Later sends
    /// fail with [`ClientError::Disconnected`]. Calling it again is a no-op.
    pub async fn close(&self) {
        let _ = self.outbound.send(Outbound::Close);

        let Some(writer) = self.writer.lock().await.take() else {
            return;
        };
        if let Err(e) = writer.await {
            warn!("Signaling writer aborted: {}", e);
        }
    }

    /// `true` once the writer has stopped and sends are refused.
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

impl SignalSink for SignalingClient {
    fn send(&self, signal: ClientSignal) -> Result<(), ClientError> {
        self.outbound
            .send(Outbound::Signal(signal))
            .map_err(|_| ClientError::Disconnected)
    }
}
