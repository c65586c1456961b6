use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::sync::Arc;
use switchboard_core::{PeerId, ServerEvent};
use tokio::sync::mpsc;
use tracing::{debug, error};

struct SignalingInner {
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
}

/// The connection registry: maps each live transport connection to the
/// participant identity the relay assigned to it, and owns the outbound
/// sender for that connection.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    /// Assign a fresh identity to a newly opened connection.
    pub fn register(&self, tx: mpsc::UnboundedSender<Message>) -> PeerId {
        let peer_id = PeerId::new();
        self.inner.peers.insert(peer_id.clone(), tx);
        peer_id
    }

    /// Forget a closed connection. A no-op for unknown ids.
    pub fn unregister(&self, peer_id: &PeerId) {
        self.inner.peers.remove(peer_id);
    }

    pub fn is_connected(&self, peer_id: &PeerId) -> bool {
        self.inner.peers.contains_key(peer_id)
    }

    pub fn connected_peers(&self) -> usize {
        self.inner.peers.len()
    }

    fn send_event(&self, peer_id: &PeerId, event: &ServerEvent) {
        if let Some(peer) = self.inner.peers.get(peer_id) {
            match serde_json::to_string(event) {
                Ok(json) => {
                    if let Err(e) = peer.send(Message::Text(json.into())) {
                        // The socket task is gone; the disconnect path will
                        // tear the peer down shortly.
                        error!("Failed to queue event for {}: {:?}", peer_id, e);
                    }
                }
                Err(e) => error!("Failed to serialize server event: {}", e),
            }
        } else {
            debug!("Dropping event for disconnected peer {}", peer_id);
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn deliver(&self, peer: &PeerId, event: ServerEvent) {
        self.send_event(peer, &event);
    }
}
