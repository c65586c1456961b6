use crate::router::SignalingRouter;
use crate::signaling::{SignalingOutput, SignalingService};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use switchboard_core::{ClientMessage, ServerEvent};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// State shared with the axum WebSocket route.
#[derive(Clone)]
pub struct RelayState {
    pub service: SignalingService,
    pub router: SignalingRouter,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<RelayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: RelayState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let peer_id = state.service.register(tx);
    info!("New WebSocket connection: {}", peer_id);

    state
        .service
        .deliver(
            &peer_id,
            ServerEvent::Welcome {
                peer: peer_id.clone(),
            },
        )
        .await;

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();
        let peer_id = peer_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => {
                            // Routing failures never tear the connection
                            // down; the offending message is dropped and the
                            // relevant party was already notified.
                            if let Err(e) = state.router.dispatch(&peer_id, client_msg).await {
                                warn!("Dropped message from {}: {}", peer_id, e);
                            }
                        }
                        Err(e) => {
                            warn!("Malformed message from {}: {:?}", peer_id, e);
                            state
                                .service
                                .deliver(
                                    &peer_id,
                                    ServerEvent::Error {
                                        message: format!("malformed message: {e}"),
                                    },
                                )
                                .await;
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Cascades into room membership and call-session cleanup before the
    // identity itself is forgotten.
    state.router.disconnect(&peer_id).await;
    state.service.unregister(&peer_id);
    info!("WebSocket disconnected: {}", peer_id);
}
