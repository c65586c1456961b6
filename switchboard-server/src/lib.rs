mod call;
mod config;
mod room;
mod router;
mod signaling;

pub use call::{CallState, CallTable, DescriptionKind, spawn_ring_sweeper};
pub use config::RelayConfig;
pub use room::RoomDirectory;
pub use router::SignalingRouter;
pub use signaling::{RelayState, SignalingOutput, SignalingService, ws_handler};
