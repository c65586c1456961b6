use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of one connected participant, assigned by the relay when the
/// transport connection opens and dead once it closes.
///
/// The derived `Ord` is the tie-break order used to resolve glare between
/// two simultaneous call attempts.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PeerId(pub Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
