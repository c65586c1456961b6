use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of one direct-dial call attempt, generated by the relay when a
/// `call-request` is admitted.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub struct CallId(pub Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a call attempt was turned down before it connected.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    /// The callee is already in an active call.
    Busy,
    /// Both parties dialed each other at once and this attempt lost the
    /// tie-break. The rejected caller should wait for the incoming call.
    Glare,
    /// The callee explicitly declined.
    Declined,
}

/// Why an established or ringing call ended.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EndReason {
    /// One party hung up.
    Hangup,
    /// The counterpart's transport connection dropped mid-call.
    PeerDisconnected,
}

/// Why a call attempt failed without either party ending it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FailReason {
    /// The callee never answered before the ring deadline.
    NoAnswer,
}
