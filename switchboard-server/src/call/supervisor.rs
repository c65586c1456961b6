use crate::call::CallTable;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

/// Spawn the negotiation timeout supervisor: a periodic sweep, independent
/// of message arrival, that expires calls still ringing past their
/// deadline. The sweep takes each session's own lock, so it cannot race a
/// concurrent message-driven transition.
pub fn spawn_ring_sweeper(table: Arc<CallTable>, interval: Duration) -> JoinHandle<()> {
    info!("Ring sweeper running every {:?}", interval);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            table.sweep(Instant::now()).await;
        }
    })
}
