use crate::init_tracing;
use crate::utils::{create_relay, ordered_peers};
use serde_json::json;
use switchboard_core::{ClientMessage, RejectReason, ServerEvent, SignalError};
use switchboard_server::CallState;

/// B dials A, then A dials B before answering. A's identifier sorts lower,
/// so A's attempt wins: B's original call is rejected with the glare reason
/// and exactly one session survives, with caller = A.
#[tokio::test]
async fn lower_caller_identifier_supersedes_the_ringing_call() {
    init_tracing();
    let relay = create_relay();
    let (a, b) = ordered_peers();

    relay
        .router
        .dispatch(&b, ClientMessage::CallRequest {
            callee: a.clone(),
            payload: json!({ "sdp": "b offer" }),
        })
        .await
        .unwrap();
    let first_call = relay.router.calls().active_call_of(&b).unwrap();

    relay
        .router
        .dispatch(&a, ClientMessage::CallRequest {
            callee: b.clone(),
            payload: json!({ "sdp": "a offer" }),
        })
        .await
        .unwrap();

    let surviving = relay.router.calls().active_call_of(&a).unwrap();
    assert_ne!(surviving, first_call);
    assert_eq!(relay.router.calls().active_call_of(&b), Some(surviving));
    assert_eq!(relay.router.calls().session_count(), 1);
    assert_eq!(
        relay.router.calls().state_of(&surviving).await,
        Some(CallState::Ringing)
    );

    // B hears exactly one glare rejection, naming its dead call, plus the
    // incoming call it should answer instead.
    let b_events = relay.output.events_for(&b).await;
    let glare_rejections: Vec<_> = b_events
        .iter()
        .filter(|e| {
            matches!(e, ServerEvent::CallRejected { reason: RejectReason::Glare, .. })
        })
        .collect();
    assert_eq!(glare_rejections.len(), 1);
    assert_eq!(
        glare_rejections[0],
        &ServerEvent::CallRejected {
            call: Some(first_call),
            reason: RejectReason::Glare,
        }
    );
    assert!(b_events.iter().any(|e| matches!(
        e,
        ServerEvent::IncomingCall { call, .. } if *call == surviving
    )));

    // A had already been rung with the superseded id, so it too is told
    // that id is dead. And its counter-dial is glare, never a busy caller.
    let a_events = relay.output.events_for(&a).await;
    assert!(a_events.contains(&ServerEvent::CallRejected {
        call: Some(first_call),
        reason: RejectReason::Glare,
    }));
    assert!(
        !a_events.iter().any(|e| matches!(e, ServerEvent::Error { .. })),
        "a counter-dial is resolved by the tie-break, not rejected as busy"
    );
}

/// A dials B first; B's counter-dial has the higher identifier and loses.
/// A's call keeps ringing and B is told to answer it instead.
#[tokio::test]
async fn higher_caller_identifier_is_rejected_and_keeps_the_ringing_call() {
    init_tracing();
    let relay = create_relay();
    let (a, b) = ordered_peers();

    relay
        .router
        .dispatch(&a, ClientMessage::CallRequest {
            callee: b.clone(),
            payload: json!({}),
        })
        .await
        .unwrap();
    let call = relay.router.calls().active_call_of(&a).unwrap();

    let err = relay
        .router
        .dispatch(&b, ClientMessage::CallRequest {
            callee: a.clone(),
            payload: json!({}),
        })
        .await
        .unwrap_err();
    assert_eq!(err, SignalError::GlareConflict);

    assert_eq!(relay.router.calls().session_count(), 1);
    assert_eq!(
        relay.router.calls().state_of(&call).await,
        Some(CallState::Ringing)
    );
    assert!(relay.output.events_for(&b).await.contains(&ServerEvent::CallRejected {
        call: None,
        reason: RejectReason::Glare,
    }));

    // The rejected caller can still simply answer.
    relay
        .router
        .dispatch(&b, ClientMessage::CallAccept {
            call,
            payload: json!({}),
        })
        .await
        .unwrap();
    assert_eq!(
        relay.router.calls().state_of(&call).await,
        Some(CallState::Connected)
    );
}

/// Across both arrival orders there is exactly one glare rejection and one
/// surviving session, always with the lower identifier as caller.
#[tokio::test]
async fn glare_resolution_is_deterministic_either_way() {
    init_tracing();
    for a_first in [true, false] {
        let relay = create_relay();
        let (a, b) = ordered_peers();

        let order: [(&_, &_); 2] = if a_first { [(&a, &b), (&b, &a)] } else { [(&b, &a), (&a, &b)] };
        for (caller, callee) in order {
            let _ = relay
                .router
                .dispatch(caller, ClientMessage::CallRequest {
                    callee: callee.clone(),
                    payload: json!({}),
                })
                .await;
        }

        assert_eq!(relay.router.calls().session_count(), 1);
        let surviving = relay.router.calls().active_call_of(&a).unwrap();
        let b_events = relay.output.events_for(&b).await;
        assert!(
            b_events.iter().any(|e| matches!(
                e,
                ServerEvent::IncomingCall { call, .. } if *call == surviving
            )),
            "the surviving session rings b, so a is the caller"
        );

        // The losing caller hears exactly one glare rejection, and neither
        // party is ever turned away as busy.
        let b_glare_rejections = b_events
            .iter()
            .filter(|e| {
                matches!(e, ServerEvent::CallRejected { reason: RejectReason::Glare, .. })
            })
            .count();
        assert_eq!(b_glare_rejections, 1);
        assert!(
            !relay
                .output
                .all_events()
                .await
                .iter()
                .any(|(_, e)| matches!(e, ServerEvent::Error { .. }))
        );
    }
}
