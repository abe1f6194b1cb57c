use huddle_core::{PeerId, RoomId};
use huddle_server::ConnectionId;

use crate::integration::{create_test_registry, init_tracing};

#[tokio::test]
async fn test_stale_socket_cannot_evict_reconnected_peer() {
    init_tracing();

    let (registry, signaling) = create_test_registry();
    let room = RoomId::from("flaky");
    let (a, b) = (PeerId::from("a"), PeerId::from("b"));
    let conn_a = ConnectionId::new();
    let (old_b, new_b) = (ConnectionId::new(), ConnectionId::new());

    registry.join(&room, a.clone(), conn_a).await.unwrap();
    registry.join(&room, b.clone(), old_b).await.unwrap();

    // B reconnects on a fresh socket before the old one is noticed as dead.
    let snapshot = registry.join(&room, b.clone(), new_b).await.unwrap();
    assert_eq!(snapshot, vec![a.clone()]);

    assert!(!registry.leave(&room, &b, old_b).await.unwrap());
    assert_eq!(registry.snapshot(&room).await.unwrap(), vec![a.clone(), b.clone()]);
    assert!(signaling.disconnected_for(conn_a).await.is_empty());

    // Announcements now reach the new socket.
    let c = PeerId::from("c");
    registry.join(&room, c.clone(), ConnectionId::new()).await.unwrap();
    assert!(signaling.connected_for(new_b).await.contains(&c));
    assert!(!signaling.connected_for(old_b).await.contains(&c));
}
