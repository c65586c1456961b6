use crate::call::{CallTable, DescriptionKind, spawn_ring_sweeper};
use crate::config::RelayConfig;
use crate::room::RoomDirectory;
use crate::signaling::SignalingOutput;
use std::sync::Arc;
use switchboard_core::{ClientMessage, PeerId, ServerEvent, SignalError, SignalTarget};
use tokio::task::JoinHandle;
use tracing::debug;

/// Validates and routes every inbound signaling message to the room
/// directory or the call table. The router owns all session/room state
/// exclusively; clients only ever see the notifications it emits.
#[derive(Clone)]
pub struct SignalingRouter {
    rooms: Arc<RoomDirectory>,
    calls: Arc<CallTable>,
}

impl SignalingRouter {
    pub fn new(output: Arc<dyn SignalingOutput>, config: RelayConfig) -> Self {
        Self {
            rooms: Arc::new(RoomDirectory::new(output.clone())),
            calls: Arc::new(CallTable::new(output, config)),
        }
    }

    /// Start the ring-timeout supervisor for this router's call table.
    pub fn spawn_supervisor(&self, config: &RelayConfig) -> JoinHandle<()> {
        spawn_ring_sweeper(self.calls.clone(), config.sweep_interval)
    }

    /// Route one message from an authenticated sender. An `Err` means the
    /// message was dropped; any party that needed to hear about the failure
    /// has already been notified by the component that rejected it.
    pub async fn dispatch(&self, sender: &PeerId, msg: ClientMessage) -> Result<(), SignalError> {
        match msg {
            ClientMessage::Join { room } => {
                self.rooms.join(sender, &room).await;
                Ok(())
            }
            ClientMessage::Leave { room } => {
                self.rooms.leave(sender, &room).await;
                Ok(())
            }
            ClientMessage::Offer { target, payload } => match target {
                SignalTarget::Room(room) => {
                    let event = ServerEvent::Offer {
                        target: SignalTarget::Room(room.clone()),
                        from: sender.clone(),
                        payload,
                    };
                    self.rooms.relay(sender, &room, event).await
                }
                SignalTarget::Call(call) => {
                    self.calls
                        .relay_description(&call, sender, DescriptionKind::Offer, payload)
                        .await
                }
            },
            ClientMessage::Answer { target, payload } => match target {
                SignalTarget::Room(room) => {
                    let event = ServerEvent::Answer {
                        target: SignalTarget::Room(room.clone()),
                        from: sender.clone(),
                        payload,
                    };
                    self.rooms.relay(sender, &room, event).await
                }
                SignalTarget::Call(call) => {
                    self.calls
                        .relay_description(&call, sender, DescriptionKind::Answer, payload)
                        .await
                }
            },
            ClientMessage::Candidate { target, payload } => match target {
                // Room mode does not buffer: an already-joined counterpart
                // is the common case and the peer connection queues early
                // candidates locally.
                SignalTarget::Room(room) => {
                    let event = ServerEvent::Candidate {
                        target: SignalTarget::Room(room.clone()),
                        from: sender.clone(),
                        payload,
                    };
                    self.rooms.relay(sender, &room, event).await
                }
                SignalTarget::Call(call) => self.calls.candidate(&call, sender, payload).await,
            },
            ClientMessage::CallRequest { callee, payload } => {
                self.calls.place(sender, &callee, payload).await.map(|_| ())
            }
            ClientMessage::CallAccept { call, payload } => {
                self.calls.accept(&call, sender, payload).await
            }
            ClientMessage::CallReject { call } => self.calls.reject(&call, sender).await,
            ClientMessage::CallEnd { call } => self.calls.end(&call, sender).await,
        }
    }

    /// Transport-level disconnect: cascade into room membership and any
    /// active call of the vanished peer.
    pub async fn disconnect(&self, peer: &PeerId) {
        debug!("Disconnect cascade for {}", peer);
        self.rooms.disconnect(peer).await;
        self.calls.disconnect(peer).await;
    }

    pub fn rooms(&self) -> &Arc<RoomDirectory> {
        &self.rooms
    }

    pub fn calls(&self) -> &Arc<CallTable> {
        &self.calls
    }
}
