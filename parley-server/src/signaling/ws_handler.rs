use crate::error::RouteError;
use crate::router::RouterCommand;
use crate::signaling::SignalingService;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use parley_core::{ClientSignal, ConnId, ServerSignal};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let conn_id = ConnId::new();
    info!("New WebSocket connection: {}", conn_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(conn_id.clone(), tx);
    service.send_signal(
        &conn_id,
        &ServerSignal::Welcome {
            conn_id: conn_id.clone(),
            ice_servers: service.get_ice_servers(),
        },
    );

    if let Err(e) = service
        .router_tx
        .send(RouterCommand::Connect {
            conn_id: conn_id.clone(),
        })
        .await
    {
        error!("Router died: {}", e);
        service.remove_peer(&conn_id);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let conn_id = conn_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        let signal = match parse_signal(&text) {
                            Ok(signal) => signal,
                            Err(e) => {
                                warn!("Dropped frame from {}: {}", conn_id, e);
                                continue;
                            }
                        };

                        let cmd = RouterCommand::Signal {
                            conn_id: conn_id.clone(),
                            signal,
                        };
                        if let Err(e) = service.router_tx.send(cmd).await {
                            error!("Router died: {}", e);
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    Message::Binary(_) => debug!("Ignoring binary frame from {}", conn_id),
                    _ => {}
                }
            }

            let _ = service
                .router_tx
                .send(RouterCommand::Disconnect {
                    conn_id: conn_id.clone(),
                })
                .await;
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // An aborted reader never reached its own Disconnect; the router treats
    // a repeat as a no-op.
    let _ = service
        .router_tx
        .send(RouterCommand::Disconnect {
            conn_id: conn_id.clone(),
        })
        .await;

    service.remove_peer(&conn_id);
    info!("WebSocket disconnected: {}", conn_id);
}

fn parse_signal(text: &str) -> Result<ClientSignal, RouteError> {
    serde_json::from_str(text).map_err(|e| RouteError::MalformedMessage(e.to_string()))
}
