//! Chunked sends and reassembled deliveries through a live `ChatClient`.

mod common;

use std::time::Duration;

use chatframe::{
    ChatClient,
    ClientConfig,
    ClientError,
    ConnectionEvent,
    ConnectionState,
    EnvelopeKind,
    PayloadKind,
};
use chatframe_testing::{MemoryServer, PeerConnection, memory_transport};
use common::{collect_envelopes, next_envelope, signed_in, small_chunks, wait_for_state};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

struct Session {
    client: ChatClient,
    peer: PeerConnection,
    driver: JoinHandle<()>,
    _server: MemoryServer,
}

impl Session {
    async fn open(config: ClientConfig) -> Self {
        let (connector, mut server) = memory_transport();
        let client = signed_in(config);
        let mut events = client.subscribe();
        let driver = client.open(connector).expect("open").spawn();
        let mut peer = server.accept().await.expect("connection accepted");
        wait_for_state(&mut events, ConnectionState::Open).await;
        let hello = peer.recv_json().await.expect("presence");
        assert_eq!(hello["type"], "connect");
        Self {
            client,
            peer,
            driver,
            _server: server,
        }
    }

    async fn written(&mut self, count: usize) -> Vec<Value> {
        let mut frames = Vec::with_capacity(count);
        for _ in 0..count {
            frames.push(self.peer.recv_json().await.expect("frame written"));
        }
        frames
    }

    async fn finish(self) {
        self.client.close();
        self.driver.await.expect("driver task");
    }
}

fn image_fragment(sender: &str, body: &str, index: u32, total: u32, ts: i64) -> Value {
    json!({
        "type": "image",
        "sender": sender,
        "image": body,
        "roomNumber": "1",
        "chunkIndex": index,
        "chunkTotal": total,
        "timestamp": ts,
    })
}

fn text(sender: &str, body: &str) -> Value {
    json!({ "type": "text", "sender": sender, "message": body, "roomNumber": "1" })
}

#[tokio::test]
async fn large_image_leaves_in_three_ordered_fragments() {
    let mut session = Session::open(ClientConfig::default()).await;
    let image = format!("data:image/png;base64,{}", "A".repeat(120_000 - 22));
    assert_eq!(image.len(), 120_000);

    let count = session.client.send_image(&image).expect("image sent");
    assert_eq!(count, 3);

    let frames = session.written(3).await;
    let lengths: Vec<usize> = frames
        .iter()
        .map(|frame| frame["image"].as_str().expect("image body").len())
        .collect();
    assert_eq!(lengths, vec![50_000, 50_000, 20_000]);
    for (index, frame) in frames.iter().enumerate() {
        assert_eq!(frame["type"], "image");
        assert_eq!(frame["sender"], "alice");
        assert_eq!(frame["chunkIndex"], index);
        assert_eq!(frame["chunkTotal"], 3);
    }
    let rejoined: String = frames
        .iter()
        .map(|frame| frame["image"].as_str().expect("image body"))
        .collect();
    assert_eq!(rejoined, image);

    session.finish().await;
}

#[tokio::test]
async fn text_goes_out_whole_and_trimmed() {
    let mut session = Session::open(small_chunks(4)).await;
    session.client.send_text("  a longer line than four  ").expect("text sent");
    let frame = session.peer.recv_json().await.expect("frame written");
    assert_eq!(frame["message"], "a longer line than four");
    assert!(frame.get("chunkIndex").is_none());
    assert!(matches!(session.client.send_text(" \t "), Err(ClientError::EmptyMessage)));
    session.finish().await;
}

#[tokio::test]
async fn interleaved_transfers_are_delivered_separately() {
    let session = Session::open(ClientConfig::default()).await;
    let mut delivered = collect_envelopes(&session.client);

    session.peer.send_json(&image_fragment("alice", "a0", 0, 2, 100));
    session.peer.send_json(&image_fragment("bob", "b0", 0, 2, 100));
    session.peer.send_json(&image_fragment("alice", "a1", 1, 2, 101));
    session.peer.send_json(&image_fragment("bob", "b1", 1, 2, 102));

    let first = next_envelope(&mut delivered).await;
    let second = next_envelope(&mut delivered).await;
    assert_eq!(first.sender(), Some("alice"));
    assert_eq!(first.payload().expect("payload").body(), "a0a1");
    assert_eq!(first.timestamp(), Some(101));
    assert!(first.chunk().is_none());
    assert_eq!(second.sender(), Some("bob"));
    assert_eq!(second.payload().expect("payload").body(), "b0b1");
    assert_eq!(second.payload().expect("payload").kind(), PayloadKind::Image);

    session.finish().await;
}

#[tokio::test]
async fn fragments_in_one_batch_complete_together() {
    let session = Session::open(ClientConfig::default()).await;
    let mut delivered = collect_envelopes(&session.client);

    let batch = json!([
        image_fragment("carol", "yz", 2, 3, 7),
        image_fragment("carol", "wx", 1, 3, 7),
        image_fragment("carol", "uv", 0, 3, 7),
    ]);
    session.peer.send_json(&batch);

    let envelope = next_envelope(&mut delivered).await;
    assert_eq!(envelope.payload().expect("payload").body(), "uvwxyz");
    session.finish().await;
}

#[tokio::test]
async fn duplicate_fragments_do_not_redeliver() {
    let session = Session::open(ClientConfig::default()).await;
    let mut delivered = collect_envelopes(&session.client);

    session.peer.send_json(&image_fragment("dave", "p0", 0, 2, 1));
    session.peer.send_json(&image_fragment("dave", "p1", 1, 2, 1));
    session.peer.send_json(&image_fragment("dave", "p1", 1, 2, 1));
    session.peer.send_json(&text("dave", "done"));

    let image = next_envelope(&mut delivered).await;
    assert_eq!(image.payload().expect("payload").body(), "p0p1");
    let marker = next_envelope(&mut delivered).await;
    assert_eq!(marker.kind(), EnvelopeKind::Text);
    assert_eq!(marker.payload().expect("payload").body(), "done");

    session.finish().await;
}

#[tokio::test]
async fn handler_may_reply_through_a_cloned_client() {
    let mut session = Session::open(ClientConfig::default()).await;
    let replier = session.client.clone();
    session.client.on_envelope(move |envelope| {
        if envelope.sender() != Some("alice") {
            replier.send_text("pong").expect("reply while open");
        }
    });

    session.peer.send_json(&text("bob", "ping"));
    let reply = session.peer.recv_json().await.expect("reply written");
    assert_eq!(reply["message"], "pong");

    session.finish().await;
}

#[tokio::test]
async fn malformed_frames_are_reported_and_skipped() {
    let session = Session::open(ClientConfig::default()).await;
    let mut delivered = collect_envelopes(&session.client);
    let mut events = session.client.subscribe();

    session.peer.send("{not json");
    session.peer.send_json(&json!({ "type": "image", "sender": "bob", "chunkIndex": 0 }));
    session.peer.send_json(&text("bob", "still here"));

    let envelope = next_envelope(&mut delivered).await;
    assert_eq!(envelope.payload().expect("payload").body(), "still here");
    let failures = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|event| matches!(event, ConnectionEvent::DecodeFailed { .. }))
        .count();
    assert_eq!(failures, 2);

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn stalled_transfer_is_evicted_by_the_sweep() {
    let config = ClientConfig::default()
        .with_reassembly_timeout(Duration::from_secs(60))
        .with_sweep_interval(Duration::from_secs(5));
    let session = Session::open(config).await;
    let mut delivered = collect_envelopes(&session.client);
    let mut events = session.client.subscribe();

    session.peer.send_json(&image_fragment("erin", "s0", 0, 2, 1));
    tokio::time::sleep(Duration::from_secs(70)).await;

    let discarded = std::iter::from_fn(|| events.try_recv().ok()).find_map(|event| match event {
        ConnectionEvent::TransferDiscarded(transfer) => Some(transfer),
        _ => None,
    });
    let transfer = discarded.expect("stalled transfer discarded");
    assert_eq!(transfer.received, 1);
    assert_eq!(transfer.total, 2);

    session.peer.send_json(&image_fragment("erin", "s1", 1, 2, 2));
    session.peer.send_json(&text("erin", "after"));
    let next = next_envelope(&mut delivered).await;
    assert_eq!(next.payload().expect("payload").body(), "after");

    session.finish().await;
}

#[tokio::test]
async fn close_mid_transfer_discards_and_blocks_sends() {
    let session = Session::open(small_chunks(2)).await;
    let mut events = session.client.subscribe();
    let mut delivered = collect_envelopes(&session.client);
    session.peer.send_json(&image_fragment("frank", "q0", 0, 3, 1));
    session.peer.send_json(&text("frank", "sync"));
    next_envelope(&mut delivered).await;

    session.client.close();
    assert!(matches!(
        session.client.send_image("data:abcdef"),
        Err(ClientError::NotConnected {
            state: ConnectionState::Closed
        })
    ));
    let discarded = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|event| matches!(event, ConnectionEvent::TransferDiscarded(_)))
        .count();
    assert_eq!(discarded, 1);

    session.driver.await.expect("driver task");
}
