use crate::call::{CallSession, CallState, CandidateDisposition};
use crate::config::RelayConfig;
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use switchboard_core::{
    CallId, EndReason, FailReason, PeerId, RejectReason, ServerEvent, SignalError, SignalTarget,
};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

type SharedSession = Arc<Mutex<CallSession>>;

/// Which kind of relayed session description a call-mode message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionKind {
    Offer,
    Answer,
}

/// Maps call identifiers to negotiation state for the direct-dial mode.
///
/// Each session sits behind its own lock, so message-, timer- and
/// disconnect-driven transitions on one call never interleave while
/// different calls proceed in parallel. Call setup and glare teardown must
/// observe both busy-index keys atomically and are serialized behind a
/// narrow setup lock; lock order is always setup before session.
pub struct CallTable {
    sessions: DashMap<CallId, SharedSession>,
    /// Active call per participant. At most one, as caller or callee.
    busy: DashMap<PeerId, CallId>,
    setup: Mutex<()>,
    output: Arc<dyn SignalingOutput>,
    config: RelayConfig,
}

impl CallTable {
    pub fn new(output: Arc<dyn SignalingOutput>, config: RelayConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            busy: DashMap::new(),
            setup: Mutex::new(()),
            output,
            config,
        }
    }

    fn session(&self, call: &CallId) -> Option<SharedSession> {
        self.sessions.get(call).map(|entry| entry.value().clone())
    }

    fn active_of(&self, peer: &PeerId) -> Option<(CallId, SharedSession)> {
        let call = *self.busy.get(peer)?.value();
        match self.session(&call) {
            Some(session) => Some((call, session)),
            None => {
                // Index entry outlived its session; drop it.
                self.busy.remove_if(peer, |_, v| *v == call);
                None
            }
        }
    }

    /// Drop a terminal session's entries. `remove_if` keeps a busy slot a
    /// peer has since reused for a newer call.
    fn remove(&self, call: &CallId, caller: &PeerId, callee: &PeerId) {
        self.sessions.remove(call);
        self.busy.remove_if(caller, |_, v| v == call);
        self.busy.remove_if(callee, |_, v| v == call);
    }

    /// Admit a `call-request`: create a `Ringing` session, arm the ring
    /// deadline and notify the callee. Rejected outright when either party
    /// already has an active call; simultaneous mutual dialing is resolved
    /// by the glare tie-break (lower caller identifier wins).
    pub async fn place(
        &self,
        caller: &PeerId,
        callee: &PeerId,
        payload: Value,
    ) -> Result<CallId, SignalError> {
        let _setup = self.setup.lock().await;

        if caller == callee {
            self.output
                .deliver(
                    caller,
                    ServerEvent::Error {
                        message: "cannot call yourself".into(),
                    },
                )
                .await;
            return Err(SignalError::InvalidState("caller dialed itself"));
        }

        if let Some((call, session)) = self.active_of(caller) {
            let guard = session.lock().await;
            // A counter-dial to the peer whose call is already ringing us
            // is glare, not a busy caller; it falls through to the
            // tie-break below on the callee's side of the same session.
            let counter_dial = guard.state() == CallState::Ringing
                && guard.caller() == callee
                && guard.callee() == caller;
            if !guard.is_terminal() && !counter_dial {
                debug!("Call request from {} while busy in {}", caller, call);
                self.output
                    .deliver(
                        caller,
                        ServerEvent::Error {
                            message: "already in an active call".into(),
                        },
                    )
                    .await;
                return Err(SignalError::InvalidState("caller already has an active call"));
            }
        }

        let mut superseded = None;
        if let Some((existing, session)) = self.active_of(callee) {
            let mut guard = session.lock().await;
            if !guard.is_terminal() {
                let glare = guard.state() == CallState::Ringing
                    && guard.caller() == callee
                    && guard.callee() == caller;
                if !glare {
                    debug!("Call request {} -> {}: callee busy", caller, callee);
                    self.output
                        .deliver(
                            caller,
                            ServerEvent::CallRejected {
                                call: None,
                                reason: RejectReason::Busy,
                            },
                        )
                        .await;
                    return Err(SignalError::CalleeBusy);
                }
                if caller >= guard.caller() {
                    // The already-ringing attempt wins; this caller should
                    // answer the incoming call instead.
                    info!(
                        "Glare between {} and {}: keeping call {}",
                        caller, callee, existing
                    );
                    self.output
                        .deliver(
                            caller,
                            ServerEvent::CallRejected {
                                call: None,
                                reason: RejectReason::Glare,
                            },
                        )
                        .await;
                    return Err(SignalError::GlareConflict);
                }
                guard.fail();
                superseded = Some(existing);
            }
        }

        if let Some(old_call) = superseded {
            // The superseded session's caller is this request's callee.
            info!(
                "Glare between {} and {}: superseding call {}",
                caller, callee, old_call
            );
            self.remove(&old_call, callee, caller);
            // Both parties knew the superseded id: its caller lost the
            // tie-break, and its callee (this request's caller) was already
            // ringing with it.
            self.output
                .deliver(
                    callee,
                    ServerEvent::CallRejected {
                        call: Some(old_call),
                        reason: RejectReason::Glare,
                    },
                )
                .await;
            self.output
                .deliver(
                    caller,
                    ServerEvent::CallRejected {
                        call: Some(old_call),
                        reason: RejectReason::Glare,
                    },
                )
                .await;
        }

        let session = CallSession::new(
            caller.clone(),
            callee.clone(),
            self.config.ring_timeout,
            self.config.candidate_cap,
        );
        let call = session.id();
        self.busy.insert(caller.clone(), call);
        self.busy.insert(callee.clone(), call);
        self.sessions.insert(call, Arc::new(Mutex::new(session)));

        info!("Call {} ringing: {} -> {}", call, caller, callee);
        self.output
            .deliver(
                callee,
                ServerEvent::IncomingCall {
                    call,
                    from: caller.clone(),
                    payload,
                },
            )
            .await;
        Ok(call)
    }

    /// Callee accepts: forward the accept to the caller, flush the
    /// candidates both sides trickled while the call was ringing, then
    /// consider the call connected.
    pub async fn accept(
        &self,
        call: &CallId,
        sender: &PeerId,
        payload: Value,
    ) -> Result<(), SignalError> {
        let session = self
            .session(call)
            .ok_or_else(|| SignalError::UnknownTarget(call.to_string()))?;
        let mut guard = session.lock().await;
        let (to_caller, to_callee) = guard.accept(sender)?;
        let caller = guard.caller().clone();
        let callee = guard.callee().clone();
        info!("Call {} accepted by {}", call, sender);

        self.output
            .deliver(
                &caller,
                ServerEvent::CallAccepted {
                    call: *call,
                    payload,
                },
            )
            .await;

        for payload in to_caller {
            self.output
                .deliver(
                    &caller,
                    ServerEvent::Candidate {
                        target: SignalTarget::Call(*call),
                        from: callee.clone(),
                        payload,
                    },
                )
                .await;
        }
        for payload in to_callee {
            self.output
                .deliver(
                    &callee,
                    ServerEvent::Candidate {
                        target: SignalTarget::Call(*call),
                        from: caller.clone(),
                        payload,
                    },
                )
                .await;
        }

        // The transport is assumed reliable, so a dispatched accept counts
        // as delivered.
        guard.mark_connected();
        Ok(())
    }

    /// Callee declines a ringing call.
    pub async fn reject(&self, call: &CallId, sender: &PeerId) -> Result<(), SignalError> {
        let session = self
            .session(call)
            .ok_or_else(|| SignalError::UnknownTarget(call.to_string()))?;
        let mut guard = session.lock().await;
        guard.reject(sender)?;
        let caller = guard.caller().clone();
        let callee = guard.callee().clone();
        info!("Call {} declined by {}", call, sender);

        self.output
            .deliver(
                &caller,
                ServerEvent::CallRejected {
                    call: Some(*call),
                    reason: RejectReason::Declined,
                },
            )
            .await;
        drop(guard);
        self.remove(call, &caller, &callee);
        Ok(())
    }

    /// Take in one trickled candidate for a call. Buffered while ringing,
    /// forwarded once the callee has accepted.
    pub async fn candidate(
        &self,
        call: &CallId,
        sender: &PeerId,
        payload: Value,
    ) -> Result<(), SignalError> {
        let session = self
            .session(call)
            .ok_or_else(|| SignalError::UnknownTarget(call.to_string()))?;
        let mut guard = session.lock().await;
        match guard.candidate(sender, payload)? {
            CandidateDisposition::Buffered => {
                debug!("Buffered candidate from {} for ringing call {}", sender, call);
            }
            CandidateDisposition::Forward(counterpart, payload) => {
                self.output
                    .deliver(
                        &counterpart,
                        ServerEvent::Candidate {
                            target: SignalTarget::Call(*call),
                            from: sender.clone(),
                            payload,
                        },
                    )
                    .await;
            }
            CandidateDisposition::Overflow => {
                warn!(
                    "Candidate queue full for call {}; dropping candidate from {}",
                    call, sender
                );
            }
        }
        Ok(())
    }

    /// Relay a renegotiation description (offer/answer addressed to the
    /// call) to the counterpart.
    pub async fn relay_description(
        &self,
        call: &CallId,
        sender: &PeerId,
        kind: DescriptionKind,
        payload: Value,
    ) -> Result<(), SignalError> {
        let session = self
            .session(call)
            .ok_or_else(|| SignalError::UnknownTarget(call.to_string()))?;
        let guard = session.lock().await;
        let counterpart = guard.renegotiate(sender)?;

        let target = SignalTarget::Call(*call);
        let from = sender.clone();
        let event = match kind {
            DescriptionKind::Offer => ServerEvent::Offer {
                target,
                from,
                payload,
            },
            DescriptionKind::Answer => ServerEvent::Answer {
                target,
                from,
                payload,
            },
        };
        self.output.deliver(&counterpart, event).await;
        Ok(())
    }

    /// Graceful hangup by either party, from any non-terminal state.
    pub async fn end(&self, call: &CallId, sender: &PeerId) -> Result<(), SignalError> {
        let session = self
            .session(call)
            .ok_or_else(|| SignalError::UnknownTarget(call.to_string()))?;
        let mut guard = session.lock().await;
        let counterpart = guard.end(sender)?;
        let caller = guard.caller().clone();
        let callee = guard.callee().clone();
        info!("Call {} ended by {}", call, sender);

        self.output
            .deliver(
                &counterpart,
                ServerEvent::CallEnded {
                    call: *call,
                    reason: EndReason::Hangup,
                },
            )
            .await;
        drop(guard);
        self.remove(call, &caller, &callee);
        Ok(())
    }

    /// Disconnect cascade: a vanished participant ends its active call, and
    /// the surviving party hears about it exactly once.
    pub async fn disconnect(&self, peer: &PeerId) {
        let Some((call, session)) = self.active_of(peer) else {
            return;
        };
        let mut guard = session.lock().await;
        let Ok(counterpart) = guard.end(peer) else {
            // Already terminal; whoever got there first owns the cleanup.
            return;
        };
        let caller = guard.caller().clone();
        let callee = guard.callee().clone();
        info!("Call {} ended: {} disconnected", call, peer);

        self.output
            .deliver(
                &counterpart,
                ServerEvent::CallEnded {
                    call,
                    reason: EndReason::PeerDisconnected,
                },
            )
            .await;
        drop(guard);
        self.remove(&call, &caller, &callee);
    }

    /// One supervisor pass: fail every call still ringing past its
    /// deadline and tell the caller nobody answered.
    pub async fn sweep(&self, now: Instant) {
        let snapshot: Vec<(CallId, SharedSession)> = self
            .sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        for (call, session) in snapshot {
            let mut guard = session.lock().await;
            if !guard.ring_expired(now) {
                continue;
            }
            guard.fail();
            let caller = guard.caller().clone();
            let callee = guard.callee().clone();
            warn!(
                "Call {} rang out with no answer after {:?}",
                call,
                guard.created_at().elapsed()
            );

            self.output
                .deliver(
                    &caller,
                    ServerEvent::CallFailed {
                        call,
                        reason: FailReason::NoAnswer,
                    },
                )
                .await;
            drop(guard);
            self.remove(&call, &caller, &callee);
        }
    }

    /// Current state of a call, if the table still knows it.
    pub async fn state_of(&self, call: &CallId) -> Option<CallState> {
        let session = self.session(call)?;
        let state = session.lock().await.state();
        Some(state)
    }

    /// The call a peer is currently part of, if any.
    pub fn active_call_of(&self, peer: &PeerId) -> Option<CallId> {
        self.busy.get(peer).map(|entry| *entry.value())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
