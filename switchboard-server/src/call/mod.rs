mod call_session;
mod call_table;
mod supervisor;

pub use call_session::CallState;
pub use call_table::*;
pub use supervisor::*;

pub(crate) use call_session::{CallSession, CandidateDisposition};
