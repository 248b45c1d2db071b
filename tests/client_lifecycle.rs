//! Connection lifecycle of a `ChatClient` driven over the in-memory
//! transport: presence announcement, reconnect timing and explicit close.

mod common;

use std::time::Duration;

use chatframe::{ClientConfig, ClientError, ConnectionEvent, ConnectionState, TransportError};
use chatframe_testing::memory_transport;
use common::{signed_in, wait_for_state};
use rstest::rstest;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn open_announces_presence_exactly_once() {
    let (connector, mut server) = memory_transport();
    let client = signed_in(ClientConfig::default());
    let mut events = client.subscribe();
    let driver = client.open(connector).expect("open").spawn();

    let mut peer = server.accept().await.expect("connection accepted");
    let hello = peer.recv_json().await.expect("presence announced");
    assert_eq!(hello["type"], "connect");
    assert_eq!(hello["username"], "alice");
    assert_eq!(hello["roomNumber"], "1");

    wait_for_state(&mut events, ConnectionState::Open).await;
    tokio::task::yield_now().await;
    assert!(peer.drain().is_empty(), "connect must be sent once per open");
    assert_eq!(client.state(), ConnectionState::Open);

    client.close();
    driver.await.expect("driver task");
}

#[tokio::test(start_paused = true)]
async fn state_changes_follow_the_connection() {
    let (connector, mut server) = memory_transport();
    let client = signed_in(ClientConfig::default());
    let mut events = client.subscribe();
    let driver = client.open(connector).expect("open").spawn();
    let _peer = server.accept().await.expect("connection accepted");
    wait_for_state(&mut events, ConnectionState::Open).await;
    client.close();
    driver.await.expect("driver task");

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ConnectionEvent::StateChanged { from, to } = event {
            seen.push((from, to));
        }
    }
    assert_eq!(seen, vec![(ConnectionState::Open, ConnectionState::Closed)]);
}

#[tokio::test(start_paused = true)]
async fn server_close_reconnects_after_the_fixed_delay() {
    let (connector, mut server) = memory_transport();
    let client = signed_in(ClientConfig::default());
    let mut events = client.subscribe();
    let driver = client.open(connector).expect("open").spawn();

    let first = server.accept().await.expect("first connection");
    wait_for_state(&mut events, ConnectionState::Open).await;

    let closed_at = Instant::now();
    first.close();
    wait_for_state(&mut events, ConnectionState::Closed).await;
    assert!(matches!(
        client.send_text("lost"),
        Err(ClientError::NotConnected {
            state: ConnectionState::Closed
        })
    ));

    let mut second = server.accept().await.expect("reconnected");
    let waited = closed_at.elapsed();
    assert!(waited >= Duration::from_secs(5), "reconnected after {waited:?}");
    assert!(waited < Duration::from_secs(6), "reconnected after {waited:?}");
    assert_eq!(server.attempts(), 2);

    let hello = second.recv_json().await.expect("presence announced again");
    assert_eq!(hello["type"], "connect");
    wait_for_state(&mut events, ConnectionState::Open).await;
    client.send_text("back").expect("send after reconnect");
    let message = second.recv_json().await.expect("message written");
    assert_eq!(message["message"], "back");

    client.close();
    driver.await.expect("driver task");
}

#[tokio::test(start_paused = true)]
async fn transport_error_reconnects_like_a_close() {
    let (connector, mut server) = memory_transport();
    let client = signed_in(ClientConfig::default());
    let mut events = client.subscribe();
    let driver = client.open(connector).expect("open").spawn();

    let first = server.accept().await.expect("first connection");
    wait_for_state(&mut events, ConnectionState::Open).await;
    first.fail(TransportError::Closed);

    let _second = server.accept().await.expect("reconnected");
    assert_eq!(server.attempts(), 2);
    client.close();
    driver.await.expect("driver task");
}

#[rstest]
#[case::once(1)]
#[case::twice(2)]
#[tokio::test(start_paused = true)]
async fn refused_connects_are_retried(#[case] refusals: usize) {
    let (connector, mut server) = memory_transport();
    server.refuse_next(refusals);
    let client = signed_in(ClientConfig::default());
    let started = Instant::now();
    let driver = client.open(connector).expect("open").spawn();

    let mut peer = server.accept().await.expect("eventually accepted");
    let delays = u32::try_from(refusals).expect("small count");
    assert!(started.elapsed() >= Duration::from_secs(5) * delays);
    assert_eq!(server.attempts(), refusals + 1);
    assert_eq!(peer.recv_json().await.expect("announce")["type"], "connect");

    client.close();
    driver.await.expect("driver task");
}

#[tokio::test(start_paused = true)]
async fn explicit_close_is_terminal() {
    let (connector, mut server) = memory_transport();
    let client = signed_in(ClientConfig::default());
    let mut events = client.subscribe();
    let driver = client.open(connector).expect("open").spawn();
    let mut peer = server.accept().await.expect("connection accepted");
    wait_for_state(&mut events, ConnectionState::Open).await;

    client.close();
    driver.await.expect("driver stops after close");
    peer.recv_json().await.expect("presence");
    assert!(peer.recv().await.is_none(), "client side of the socket closed");

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(server.attempts(), 1);
    assert_eq!(client.state(), ConnectionState::Closed);
    assert!(!client.session().is_authenticated());
    assert!(matches!(
        client.send_text("anyone?"),
        Err(ClientError::NotConnected {
            state: ConnectionState::Closed
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn close_during_reconnect_delay_stops_the_driver() {
    let (connector, mut server) = memory_transport();
    let client = signed_in(ClientConfig::default());
    let mut events = client.subscribe();
    let driver = client.open(connector).expect("open").spawn();
    let peer = server.accept().await.expect("connection accepted");
    wait_for_state(&mut events, ConnectionState::Open).await;

    peer.close();
    wait_for_state(&mut events, ConnectionState::Closed).await;
    client.close();
    driver.await.expect("driver stops");

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(server.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn open_requires_a_signed_in_user() {
    let (connector, server) = memory_transport();
    let client = chatframe::ChatClient::new(ClientConfig::default());
    assert!(matches!(client.open(connector), Err(ClientError::NotAuthenticated)));
    assert_eq!(server.attempts(), 0);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn reopening_after_close_needs_a_new_sign_in() {
    let (connector, mut server) = memory_transport();
    let client = signed_in(ClientConfig::default());
    let mut events = client.subscribe();
    let driver = client.open(connector).expect("open").spawn();
    let _peer = server.accept().await.expect("connection accepted");
    wait_for_state(&mut events, ConnectionState::Open).await;
    client.close();
    driver.await.expect("driver stops");

    let (connector, mut refused) = memory_transport();
    assert!(matches!(client.open(connector), Err(ClientError::NotAuthenticated)));
    assert!(refused.accept().await.is_none(), "rejected connector is dropped");

    client
        .sign_in(chatframe::SessionContext::for_user("bob", "2"))
        .expect("sign in after close");
    let (connector, mut fresh) = memory_transport();
    let driver = client.open(connector).expect("reopen").spawn();
    let mut peer = fresh.accept().await.expect("second session connected");
    let hello = peer.recv_json().await.expect("presence");
    assert_eq!(hello["username"], "bob");
    assert_eq!(hello["roomNumber"], "2");

    client.close();
    driver.await.expect("driver stops");
}

#[tokio::test(start_paused = true)]
async fn logout_then_login_without_waiting_for_the_old_driver() {
    let (connector, mut server) = memory_transport();
    let client = signed_in(ClientConfig::default());
    let mut events = client.subscribe();
    let old_driver = client.open(connector).expect("open").spawn();
    let _old_peer = server.accept().await.expect("connection accepted");
    wait_for_state(&mut events, ConnectionState::Open).await;

    client.close();
    client
        .sign_in(chatframe::SessionContext::for_user("bob", "2"))
        .expect("sign in after close");
    let (connector, mut fresh) = memory_transport();
    let driver = client.open(connector).expect("reopen").spawn();

    let mut peer = fresh.accept().await.expect("second session connected");
    let hello = peer.recv_json().await.expect("presence");
    assert_eq!(hello["type"], "connect");
    assert_eq!(hello["username"], "bob");
    old_driver.await.expect("old driver stops");

    assert_eq!(client.state(), ConnectionState::Open);
    client.send_text("hi").expect("send on the new session");
    assert_eq!(peer.recv_json().await.expect("message")["message"], "hi");
    assert_eq!(server.attempts(), 1);

    client.close();
    driver.await.expect("driver stops");
}
