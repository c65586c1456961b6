use async_trait::async_trait;
use switchboard_core::{PeerId, ServerEvent};

/// Outbound half of the transport boundary. Every notification the relay
/// produces leaves through this trait, so tests can swap the WebSocket
/// layer for a capturing mock.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Deliver one event to one participant. Delivery to a participant that
    /// is no longer connected is a no-op; cleanup belongs to the disconnect
    /// path, not to senders.
    async fn deliver(&self, peer: &PeerId, event: ServerEvent);
}
