use crate::model::call::{CallId, EndReason, FailReason, RejectReason};
use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a relayed description or candidate is headed: a shared room or a
/// direct-dial call. On the wire this is `{"room": "..."}` or
/// `{"call": "..."}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SignalTarget {
    Room(RoomId),
    Call(CallId),
}

/// Everything a connected client may send to the relay. The sender identity
/// is implicit from the connection; every variant except `join`/`leave`
/// names an explicit routing target.
///
/// `payload` fields are opaque session-description / network-candidate
/// blobs. The relay never looks inside them and forwards them verbatim.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join { room: RoomId },
    Leave { room: RoomId },
    Offer { target: SignalTarget, payload: Value },
    Answer { target: SignalTarget, payload: Value },
    Candidate { target: SignalTarget, payload: Value },
    CallRequest { callee: PeerId, payload: Value },
    CallAccept { call: CallId, payload: Value },
    CallReject { call: CallId },
    CallEnd { call: CallId },
}

/// Everything the relay may push to a client. Relayed variants carry the
/// original payload byte-for-byte plus the sender's identity in `from`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// First event on every connection: the identity the relay assigned.
    Welcome { peer: PeerId },

    /// Acknowledges a `join` and lists the members already present, in join
    /// order, so the joiner knows whom to offer to.
    RoomJoined { room: RoomId, peers: Vec<PeerId> },
    PeerJoined { room: RoomId, peer: PeerId },
    PeerLeft { room: RoomId, peer: PeerId },

    Offer {
        target: SignalTarget,
        from: PeerId,
        payload: Value,
    },
    Answer {
        target: SignalTarget,
        from: PeerId,
        payload: Value,
    },
    Candidate {
        target: SignalTarget,
        from: PeerId,
        payload: Value,
    },

    IncomingCall {
        call: CallId,
        from: PeerId,
        payload: Value,
    },
    CallAccepted { call: CallId, payload: Value },
    /// `call` is absent when the rejected request never produced a session.
    CallRejected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call: Option<CallId>,
        reason: RejectReason,
    },
    CallEnded { call: CallId, reason: EndReason },
    CallFailed { call: CallId, reason: FailReason },

    /// Diagnostic for a message the relay had to drop.
    Error { message: String },
}
