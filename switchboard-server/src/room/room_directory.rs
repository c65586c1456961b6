use crate::room::Room;
use crate::signaling::SignalingOutput;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use switchboard_core::{PeerId, RoomId, ServerEvent, SignalError};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Default)]
struct DirectoryState {
    rooms: HashMap<RoomId, Room>,
    /// Which rooms each peer is in, so a disconnect can cascade without
    /// scanning every room.
    memberships: HashMap<PeerId, HashSet<RoomId>>,
}

/// Maps room identifiers to their member connections for the shared-room
/// mode. All structural mutations are serialized behind one narrow lock;
/// broadcast fan-out happens after the lock is released.
pub struct RoomDirectory {
    state: Mutex<DirectoryState>,
    output: Arc<dyn SignalingOutput>,
}

impl RoomDirectory {
    pub fn new(output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            state: Mutex::new(DirectoryState::default()),
            output,
        }
    }

    /// Add a peer to a room, creating the room on first join. Existing
    /// members are told about the newcomer; the newcomer is acknowledged
    /// with the roster that was already present. A duplicate join is a
    /// no-op but is still acknowledged.
    pub async fn join(&self, peer: &PeerId, room_id: &RoomId) {
        let (added, present) = {
            let mut state = self.state.lock().await;
            let room = state.rooms.entry(room_id.clone()).or_insert_with(Room::new);
            let added = room.add(peer);
            let present = room.others(peer);
            state
                .memberships
                .entry(peer.clone())
                .or_default()
                .insert(room_id.clone());
            (added, present)
        };

        if added {
            info!("Peer {} joined room {}", peer, room_id);
        } else {
            debug!("Duplicate join from {} for room {}", peer, room_id);
        }

        self.output
            .deliver(
                peer,
                ServerEvent::RoomJoined {
                    room: room_id.clone(),
                    peers: present.clone(),
                },
            )
            .await;

        if added {
            for other in &present {
                self.output
                    .deliver(
                        other,
                        ServerEvent::PeerJoined {
                            room: room_id.clone(),
                            peer: peer.clone(),
                        },
                    )
                    .await;
            }
        }
    }

    /// Remove a peer from a room, notifying the remaining members. The room
    /// is deleted once its last member leaves. Unknown rooms and
    /// non-members are dropped with a log line only.
    pub async fn leave(&self, peer: &PeerId, room_id: &RoomId) {
        let remaining = {
            let mut state = self.state.lock().await;
            let Some(room) = state.rooms.get_mut(room_id) else {
                debug!("Leave from {} for unknown room {}", peer, room_id);
                return;
            };
            if !room.remove(peer) {
                debug!("Leave from non-member {} for room {}", peer, room_id);
                return;
            }
            let remaining = room.members().to_vec();
            if room.is_empty() {
                state.rooms.remove(room_id);
                info!("Room {} is empty, removed", room_id);
            }
            if let Some(set) = state.memberships.get_mut(peer) {
                set.remove(room_id);
                if set.is_empty() {
                    state.memberships.remove(peer);
                }
            }
            remaining
        };

        info!("Peer {} left room {}", peer, room_id);
        for member in remaining {
            self.output
                .deliver(
                    &member,
                    ServerEvent::PeerLeft {
                        room: room_id.clone(),
                        peer: peer.clone(),
                    },
                )
                .await;
        }
    }

    /// Broadcast a relayed description or candidate to every other member.
    /// A room with no counterpart yet is not an error: a trickled candidate
    /// can legitimately race a join or a leave, so the message is dropped
    /// silently (logged, not surfaced).
    pub async fn relay(
        &self,
        sender: &PeerId,
        room_id: &RoomId,
        event: ServerEvent,
    ) -> Result<(), SignalError> {
        let recipients = {
            let state = self.state.lock().await;
            let Some(room) = state.rooms.get(room_id) else {
                return Err(SignalError::UnknownTarget(room_id.to_string()));
            };
            if !room.contains(sender) {
                return Err(SignalError::InvalidState("sender is not a room member"));
            }
            room.others(sender)
        };

        if recipients.is_empty() {
            debug!("No counterpart in room {} for relay from {}", room_id, sender);
            return Ok(());
        }

        for recipient in recipients {
            self.output.deliver(&recipient, event.clone()).await;
        }
        Ok(())
    }

    /// Disconnect cascade: remove the peer from every room it joined,
    /// notifying remaining members and deleting rooms that empty out.
    pub async fn disconnect(&self, peer: &PeerId) {
        let mut notifications = Vec::new();
        {
            let mut state = self.state.lock().await;
            let Some(joined) = state.memberships.remove(peer) else {
                return;
            };
            for room_id in joined {
                let Some(room) = state.rooms.get_mut(&room_id) else {
                    continue;
                };
                room.remove(peer);
                for member in room.members() {
                    notifications.push((
                        member.clone(),
                        ServerEvent::PeerLeft {
                            room: room_id.clone(),
                            peer: peer.clone(),
                        },
                    ));
                }
                if room.is_empty() {
                    state.rooms.remove(&room_id);
                    info!("Room {} is empty, removed", room_id);
                }
            }
        }

        for (recipient, event) in notifications {
            self.output.deliver(&recipient, event).await;
        }
    }

    /// Current members of a room in join order, if the room exists.
    pub async fn members(&self, room_id: &RoomId) -> Option<Vec<PeerId>> {
        self.state
            .lock()
            .await
            .rooms
            .get(room_id)
            .map(|room| room.members().to_vec())
    }

    pub async fn room_count(&self) -> usize {
        self.state.lock().await.rooms.len()
    }
}
