use huddle_client::{CallState, SessionEvent, SessionSnapshot};
use huddle_core::{PeerId, RoomId};
use std::collections::HashSet;

use crate::integration::{TestPeer, init_tracing};
use crate::utils::{FakeCaptureDevice, InProcessRelay, LoopbackNetwork};

fn fully_connected(snapshot: &SessionSnapshot, expected: usize) -> bool {
    snapshot.calls.len() == expected
        && snapshot
            .calls
            .iter()
            .all(|c| c.state == CallState::Connected)
}

async fn join(
    name: &str,
    room: &RoomId,
    relay: &InProcessRelay,
    network: &LoopbackNetwork,
    members_after: usize,
) -> TestPeer {
    let (link, hub_rx) = relay.connect();
    let peer = TestPeer::spawn(
        name,
        room,
        network,
        FakeCaptureDevice::instant(),
        link,
        hub_rx,
    );

    // Wait for the relay to list the peer before the next one joins.
    tokio::time::timeout(crate::integration::WAIT_TIMEOUT, async {
        while relay.registry().snapshot(room).await.unwrap().len() < members_after {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    peer
}

#[tokio::test]
async fn test_three_peers_form_full_mesh() {
    init_tracing();

    let relay = InProcessRelay::new();
    let network = LoopbackNetwork::new();
    let room = RoomId::from("abc123");

    let a = join("A", &room, &relay, &network, 1).await;
    let b = join("B", &room, &relay, &network, 2).await;
    let c = join("C", &room, &relay, &network, 3).await;

    for peer in [&a, &b, &c] {
        let snapshot = peer.wait_until(|s| fully_connected(s, 2)).await;
        let others: HashSet<PeerId> = snapshot.calls.iter().map(|c| c.peer.clone()).collect();
        let expected: HashSet<PeerId> = [&a, &b, &c]
            .iter()
            .filter(|p| p.id != peer.id)
            .map(|p| p.id.clone())
            .collect();
        assert_eq!(others, expected, "{} is connected to the wrong peers", peer.id);
        assert_eq!(snapshot.roster.len(), 2);
    }

    // One surviving connection per unordered pair, shared by both ends.
    let links = network.open_links();
    assert_eq!(links.len(), 3);
    let pairs: HashSet<(PeerId, PeerId)> = links
        .iter()
        .map(|(x, y, _)| {
            if x < y {
                (x.clone(), y.clone())
            } else {
                (y.clone(), x.clone())
            }
        })
        .collect();
    assert_eq!(pairs.len(), 3);

    assert_eq!(
        relay.registry().snapshot(&room).await.unwrap(),
        vec![a.id.clone(), b.id.clone(), c.id.clone()]
    );
}

#[tokio::test]
async fn test_leaving_peer_is_dropped_by_the_others() {
    init_tracing();

    let relay = InProcessRelay::new();
    let network = LoopbackNetwork::new();
    let room = RoomId::from("abc123");

    let mut a = join("A", &room, &relay, &network, 1).await;
    let mut b = join("B", &room, &relay, &network, 2).await;
    let c = join("C", &room, &relay, &network, 3).await;

    for peer in [&a, &b, &c] {
        peer.wait_until(|s| fully_connected(s, 2)).await;
    }

    let dials_before = network.dials().len();
    assert_eq!(c.handle.leave().await.unwrap(), 2);
    assert!(c.capture.audio.is_stopped());
    assert!(c.capture.video.is_stopped());

    for peer in [&mut a, &mut b] {
        let gone = peer
            .wait_for_event(|e| matches!(e, SessionEvent::PeerDisconnected { .. }))
            .await;
        assert_eq!(gone, SessionEvent::PeerDisconnected { peer: c.id.clone() });

        let snapshot = peer.wait_until(|s| fully_connected(s, 1)).await;
        assert!(!snapshot.roster.contains(&c.id));
    }

    assert_eq!(network.open_links().len(), 1);
    assert_eq!(
        relay.registry().snapshot(&room).await.unwrap(),
        vec![a.id.clone(), b.id.clone()]
    );

    // A hang-up is not a failure; nobody calls the departed peer back.
    assert_eq!(network.dials().len(), dials_before);
}

#[tokio::test]
async fn test_last_peer_leaving_removes_room() {
    init_tracing();

    let relay = InProcessRelay::new();
    let network = LoopbackNetwork::new();
    let room = RoomId::from("solo");

    let a = join("A", &room, &relay, &network, 1).await;
    assert!(relay.registry().contains(&room));

    assert_eq!(a.handle.leave().await.unwrap(), 0);

    tokio::time::timeout(crate::integration::WAIT_TIMEOUT, async {
        while relay.registry().contains(&room) {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}
