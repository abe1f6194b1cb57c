use huddle_core::{ClientEvent, PeerId, RoomId, ServerEvent};
use huddle_server::{ConnectionId, ConnectionSession, ConnectionState, Inbound};

use crate::integration::{create_test_registry, init_tracing};

async fn observed_departure(explicit_leave: bool) -> Vec<ServerEvent> {
    let (registry, signaling) = create_test_registry();
    let room = RoomId::from("room");

    let mut watcher = ConnectionSession::new(ConnectionId::new(), registry.clone());
    let mut leaver = ConnectionSession::new(ConnectionId::new(), registry.clone());

    watcher
        .handle(Inbound::Event(ClientEvent::join(room.clone(), PeerId::from("w"))))
        .await
        .unwrap();
    leaver
        .handle(Inbound::Event(ClientEvent::join(room.clone(), PeerId::from("l"))))
        .await
        .unwrap();

    if explicit_leave {
        leaver
            .handle(Inbound::Event(ClientEvent::leave(room.clone(), PeerId::from("l"))))
            .await
            .unwrap();
        assert_eq!(leaver.state(), &ConnectionState::Left);
    }
    leaver.handle(Inbound::TransportClosed).await.unwrap();
    assert_eq!(leaver.state(), &ConnectionState::Disconnected);

    assert_eq!(registry.snapshot(&room).await.unwrap(), vec![PeerId::from("w")]);
    signaling.events_for(watcher.connection()).await
}

#[tokio::test]
async fn test_disconnect_without_leave_broadcasts_like_leave() {
    init_tracing();

    let implicit = observed_departure(false).await;
    let explicit = observed_departure(true).await;

    let expected = vec![
        ServerEvent::UserConnected(PeerId::from("l")),
        ServerEvent::UserDisconnected(PeerId::from("l")),
    ];
    assert_eq!(implicit, expected);
    assert_eq!(explicit, expected);
}

#[tokio::test]
async fn test_disconnect_before_join_is_noop() {
    init_tracing();

    let (registry, signaling) = create_test_registry();
    let mut session = ConnectionSession::new(ConnectionId::new(), registry.clone());

    session.handle(Inbound::TransportClosed).await.unwrap();

    assert_eq!(session.state(), &ConnectionState::Disconnected);
    assert!(registry.rooms().is_empty());
    assert_eq!(signaling.total().await, 0);
}

#[tokio::test]
async fn test_input_after_disconnect_is_ignored() {
    init_tracing();

    let (registry, _signaling) = create_test_registry();
    let room = RoomId::from("late");
    let mut session = ConnectionSession::new(ConnectionId::new(), registry.clone());

    session.handle(Inbound::TransportClosed).await.unwrap();
    session
        .handle(Inbound::Event(ClientEvent::join(room.clone(), PeerId::from("x"))))
        .await
        .unwrap();

    assert!(!registry.contains(&room));
}
