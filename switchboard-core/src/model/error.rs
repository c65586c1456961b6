use thiserror::Error;

/// Routing failures the relay can produce. All of them are recoverable at
/// the session level: they terminate at most the affected call attempt,
/// never the router itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The named room or call does not exist (any more).
    #[error("unknown target: {0}")]
    UnknownTarget(String),

    /// The message is not valid for the session's current state or sender.
    #[error("invalid for current state: {0}")]
    InvalidState(&'static str),

    /// The callee already has an active call.
    #[error("callee is busy")]
    CalleeBusy,

    /// Simultaneous call attempts between the same two peers; this one lost
    /// the tie-break.
    #[error("glare: counterpart call already ringing")]
    GlareConflict,

    /// The ring deadline passed without an accept.
    #[error("no answer before the ring deadline")]
    NoAnswer,

    /// The counterpart disconnected mid-negotiation.
    #[error("counterpart disconnected")]
    CounterpartGone,
}
