use crate::init_tracing;
use crate::utils::create_relay;
use switchboard_core::{ClientMessage, PeerId, RoomId, ServerEvent};

#[tokio::test]
async fn disconnect_cascades_across_every_joined_room() {
    init_tracing();
    let relay = create_relay();
    let (a, b, c) = (PeerId::new(), PeerId::new(), PeerId::new());
    let (r1, r2) = (RoomId::from("r1"), RoomId::from("r2"));

    for (peer, room) in [(&a, &r1), (&b, &r1), (&a, &r2), (&c, &r2)] {
        relay
            .router
            .dispatch(peer, ClientMessage::Join { room: room.clone() })
            .await
            .unwrap();
    }

    relay.router.disconnect(&a).await;

    let b_events = relay.output.events_for(&b).await;
    assert!(b_events.contains(&ServerEvent::PeerLeft {
        room: r1.clone(),
        peer: a.clone(),
    }));
    let c_events = relay.output.events_for(&c).await;
    assert!(c_events.contains(&ServerEvent::PeerLeft {
        room: r2.clone(),
        peer: a.clone(),
    }));

    assert_eq!(relay.router.rooms().members(&r1).await.unwrap(), vec![b]);
    assert_eq!(relay.router.rooms().members(&r2).await.unwrap(), vec![c]);
}

#[tokio::test]
async fn disconnect_of_last_member_removes_the_room() {
    init_tracing();
    let relay = create_relay();
    let a = PeerId::new();
    let room = RoomId::from("r1");

    relay
        .router
        .dispatch(&a, ClientMessage::Join { room: room.clone() })
        .await
        .unwrap();
    relay.router.disconnect(&a).await;

    assert!(relay.router.rooms().members(&room).await.is_none());
}

#[tokio::test]
async fn disconnect_of_unknown_peer_is_a_no_op() {
    init_tracing();
    let relay = create_relay();
    relay.router.disconnect(&PeerId::new()).await;
    assert!(relay.output.all_events().await.is_empty());
}
