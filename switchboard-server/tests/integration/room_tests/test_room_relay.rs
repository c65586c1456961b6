use crate::init_tracing;
use crate::utils::{create_relay, ordered_peers};
use serde_json::json;
use switchboard_core::{ClientMessage, RoomId, ServerEvent, SignalError, SignalTarget};

/// The full room-mode handshake: A joins, B joins, A offers, B answers,
/// A trickles a candidate. Every relay carries `from` and the payload
/// verbatim, and the candidate is delivered immediately (no buffering in
/// room mode).
#[tokio::test]
async fn offer_answer_candidate_round_trip() {
    init_tracing();
    let relay = create_relay();
    let (a, b) = ordered_peers();
    let room = RoomId::from("r1");
    let target = SignalTarget::Room(room.clone());

    relay
        .router
        .dispatch(&a, ClientMessage::Join { room: room.clone() })
        .await
        .unwrap();
    relay
        .router
        .dispatch(&b, ClientMessage::Join { room: room.clone() })
        .await
        .unwrap();

    let offer = json!({ "type": "offer", "sdp": "v=0 caller" });
    relay
        .router
        .dispatch(&a, ClientMessage::Offer {
            target: target.clone(),
            payload: offer.clone(),
        })
        .await
        .unwrap();

    let b_events = relay.output.events_for(&b).await;
    assert!(b_events.contains(&ServerEvent::Offer {
        target: target.clone(),
        from: a.clone(),
        payload: offer,
    }));

    let answer = json!({ "type": "answer", "sdp": "v=0 callee" });
    relay
        .router
        .dispatch(&b, ClientMessage::Answer {
            target: target.clone(),
            payload: answer.clone(),
        })
        .await
        .unwrap();

    let a_events = relay.output.events_for(&a).await;
    assert!(a_events.contains(&ServerEvent::Answer {
        target: target.clone(),
        from: b.clone(),
        payload: answer,
    }));

    let candidate = json!({ "candidate": "candidate:0 1 UDP 2122252543 ..." });
    relay
        .router
        .dispatch(&a, ClientMessage::Candidate {
            target: target.clone(),
            payload: candidate.clone(),
        })
        .await
        .unwrap();

    assert_eq!(
        relay.output.candidate_payloads_for(&b).await,
        vec![candidate],
        "room-mode candidates are relayed immediately"
    );
}

#[tokio::test]
async fn relay_without_a_counterpart_fails_silently() {
    init_tracing();
    let relay = create_relay();
    let (a, b) = ordered_peers();
    let room = RoomId::from("solo");

    relay
        .router
        .dispatch(&a, ClientMessage::Join { room: room.clone() })
        .await
        .unwrap();

    // The counterpart may simply not have joined yet; this is not an error.
    relay
        .router
        .dispatch(&a, ClientMessage::Candidate {
            target: SignalTarget::Room(room.clone()),
            payload: json!({ "candidate": "early" }),
        })
        .await
        .unwrap();

    assert!(relay.output.events_for(&b).await.is_empty());
    // No error notification either; the drop is log-only.
    assert!(
        !relay
            .output
            .events_for(&a)
            .await
            .iter()
            .any(|e| matches!(e, ServerEvent::Error { .. }))
    );
}

#[tokio::test]
async fn relay_to_unknown_room_is_dropped() {
    init_tracing();
    let relay = create_relay();
    let (a, _) = ordered_peers();

    let err = relay
        .router
        .dispatch(&a, ClientMessage::Offer {
            target: SignalTarget::Room(RoomId::from("nowhere")),
            payload: json!({}),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SignalError::UnknownTarget(_)));
}

#[tokio::test]
async fn relay_from_non_member_is_dropped() {
    init_tracing();
    let relay = create_relay();
    let (a, b) = ordered_peers();
    let room = RoomId::from("r1");

    relay
        .router
        .dispatch(&a, ClientMessage::Join { room: room.clone() })
        .await
        .unwrap();

    let err = relay
        .router
        .dispatch(&b, ClientMessage::Offer {
            target: SignalTarget::Room(room),
            payload: json!({}),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SignalError::InvalidState(_)));
    assert!(relay.output.events_for(&a).await.len() == 1, "only the join ack");
}
