use std::time::Duration;

/// Tunables for the relay's negotiation policy.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// How long a `Ringing` call may wait for an accept before it fails
    /// with `no-answer`.
    pub ring_timeout: Duration,
    /// How often the supervisor scans for expired ring deadlines.
    pub sweep_interval: Duration,
    /// Per-direction cap on candidates buffered while a call is ringing.
    /// Candidates beyond the cap are dropped with a warning.
    pub candidate_cap: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ring_timeout: Duration::from_secs(45),
            sweep_interval: Duration::from_secs(1),
            candidate_cap: 50,
        }
    }
}
