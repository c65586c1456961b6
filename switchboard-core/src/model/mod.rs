mod call;
mod error;
mod peer;
mod room;
mod signaling;

pub use call::{CallId, EndReason, FailReason, RejectReason};
pub use error::SignalError;
pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{ClientMessage, ServerEvent, SignalTarget};
