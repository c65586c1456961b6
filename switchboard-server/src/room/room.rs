use switchboard_core::PeerId;

/// Membership of one room. Order is join order, which is all the "who is
/// already present" notification needs; there is no host/owner asymmetry.
#[derive(Debug, Default)]
pub struct Room {
    members: Vec<PeerId>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the peer was already a member.
    pub fn add(&mut self, peer: &PeerId) -> bool {
        if self.contains(peer) {
            return false;
        }
        self.members.push(peer.clone());
        true
    }

    /// Returns false if the peer was not a member.
    pub fn remove(&mut self, peer: &PeerId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != peer);
        self.members.len() != before
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.members.iter().any(|m| m == peer)
    }

    pub fn members(&self) -> &[PeerId] {
        &self.members
    }

    /// Every member except `peer`, in join order.
    pub fn others(&self, peer: &PeerId) -> Vec<PeerId> {
        self.members.iter().filter(|m| *m != peer).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
