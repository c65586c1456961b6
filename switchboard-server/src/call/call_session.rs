use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use switchboard_core::{CallId, PeerId, SignalError};
use tokio::time::Instant;

/// Lifecycle of a direct-dial call. `Ended` and `Failed` are terminal; the
/// table entry is removed right after the terminal notifications go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// `call-request` delivered, awaiting the callee's response.
    Ringing,
    /// The callee accepted; description/candidate exchange in progress.
    Negotiating,
    /// The accept reached the caller. The relay cannot observe media, so
    /// this is entered heuristically on successful delivery of the accept.
    Connected,
    Ended,
    Failed,
}

/// What became of a candidate the session just took in.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CandidateDisposition {
    /// Held back until the session reaches `Negotiating`.
    Buffered,
    /// Deliver to this counterpart now.
    Forward(PeerId, Value),
    /// The pending queue hit its cap; the candidate was dropped.
    Overflow,
}

/// Negotiation state of one call between exactly two participants. The
/// struct itself is plain data; the table wraps it in a per-session lock so
/// message-, timer- and disconnect-driven transitions never interleave.
pub(crate) struct CallSession {
    id: CallId,
    caller: PeerId,
    callee: PeerId,
    state: CallState,
    /// Candidates from the callee, held until the caller may receive them.
    pending_to_caller: VecDeque<Value>,
    /// Candidates from the caller, held until the callee accepts.
    pending_to_callee: VecDeque<Value>,
    created_at: Instant,
    ring_deadline: Instant,
    candidate_cap: usize,
}

impl CallSession {
    pub fn new(caller: PeerId, callee: PeerId, ring_timeout: Duration, candidate_cap: usize) -> Self {
        let now = Instant::now();
        Self {
            id: CallId::new(),
            caller,
            callee,
            state: CallState::Ringing,
            pending_to_caller: VecDeque::new(),
            pending_to_callee: VecDeque::new(),
            created_at: now,
            ring_deadline: now + ring_timeout,
            candidate_cap,
        }
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn caller(&self) -> &PeerId {
        &self.caller
    }

    pub fn callee(&self) -> &PeerId {
        &self.callee
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, CallState::Ended | CallState::Failed)
    }

    pub fn counterpart(&self, peer: &PeerId) -> Option<&PeerId> {
        if *peer == self.caller {
            Some(&self.callee)
        } else if *peer == self.callee {
            Some(&self.caller)
        } else {
            None
        }
    }

    /// Callee accepts the ringing call. Transitions to `Negotiating` and
    /// hands back both pending queues in submission order so the table can
    /// flush them.
    pub fn accept(&mut self, sender: &PeerId) -> Result<(Vec<Value>, Vec<Value>), SignalError> {
        if self.is_terminal() {
            return Err(SignalError::InvalidState("call is already over"));
        }
        if self.state != CallState::Ringing {
            return Err(SignalError::InvalidState("accept is only valid while ringing"));
        }
        if *sender != self.callee {
            return Err(SignalError::InvalidState("only the callee may accept"));
        }

        self.state = CallState::Negotiating;
        Ok((
            self.pending_to_caller.drain(..).collect(),
            self.pending_to_callee.drain(..).collect(),
        ))
    }

    /// Callee declines the ringing call. Terminal.
    pub fn reject(&mut self, sender: &PeerId) -> Result<(), SignalError> {
        if self.is_terminal() {
            return Err(SignalError::InvalidState("call is already over"));
        }
        if self.state != CallState::Ringing {
            return Err(SignalError::InvalidState("reject is only valid while ringing"));
        }
        if *sender != self.callee {
            return Err(SignalError::InvalidState("only the callee may reject"));
        }

        self.state = CallState::Ended;
        Ok(())
    }

    /// The accept was handed to the transport; assume media follows.
    pub fn mark_connected(&mut self) {
        if self.state == CallState::Negotiating {
            self.state = CallState::Connected;
        }
    }

    /// Take in one trickled candidate. While ringing it is buffered toward
    /// the counterpart (never dropped merely for arriving before the
    /// accept); afterwards it is forwarded immediately.
    pub fn candidate(
        &mut self,
        sender: &PeerId,
        payload: Value,
    ) -> Result<CandidateDisposition, SignalError> {
        let Some(counterpart) = self.counterpart(sender).cloned() else {
            return Err(SignalError::InvalidState("sender is not a party to this call"));
        };

        match self.state {
            CallState::Ringing => {
                let queue = if *sender == self.caller {
                    &mut self.pending_to_callee
                } else {
                    &mut self.pending_to_caller
                };
                if queue.len() >= self.candidate_cap {
                    return Ok(CandidateDisposition::Overflow);
                }
                queue.push_back(payload);
                Ok(CandidateDisposition::Buffered)
            }
            CallState::Negotiating | CallState::Connected => {
                Ok(CandidateDisposition::Forward(counterpart, payload))
            }
            CallState::Ended | CallState::Failed => {
                Err(SignalError::InvalidState("call is already over"))
            }
        }
    }

    /// A renegotiation description (offer/answer targeted at the call) may
    /// flow once the callee has accepted. Returns the counterpart to
    /// forward to.
    pub fn renegotiate(&self, sender: &PeerId) -> Result<PeerId, SignalError> {
        let Some(counterpart) = self.counterpart(sender).cloned() else {
            return Err(SignalError::InvalidState("sender is not a party to this call"));
        };
        match self.state {
            CallState::Negotiating | CallState::Connected => Ok(counterpart),
            CallState::Ringing => Err(SignalError::InvalidState(
                "descriptions travel in call-request/call-accept while ringing",
            )),
            CallState::Ended | CallState::Failed => {
                Err(SignalError::InvalidState("call is already over"))
            }
        }
    }

    /// Graceful termination by either party (hangup or disconnect).
    /// Terminal; buffered candidates are discarded with the session.
    /// Returns the counterpart to notify.
    pub fn end(&mut self, sender: &PeerId) -> Result<PeerId, SignalError> {
        let Some(counterpart) = self.counterpart(sender).cloned() else {
            return Err(SignalError::InvalidState("sender is not a party to this call"));
        };
        if self.is_terminal() {
            return Err(SignalError::InvalidState("call is already over"));
        }
        self.state = CallState::Ended;
        Ok(counterpart)
    }

    /// Force the session into `Failed` (ring timeout or lost glare
    /// tie-break).
    pub fn fail(&mut self) {
        self.state = CallState::Failed;
    }

    pub fn ring_expired(&self, now: Instant) -> bool {
        self.state == CallState::Ringing && self.ring_deadline <= now
    }
}
