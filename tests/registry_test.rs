//! Connection registry properties: set lifecycle, idempotent unregister,
//! backpressure pruning, and fan-out isolation. Pure in-process, no database.

use std::time::Duration;

use axum::extract::ws::Message;
use tokio::time::timeout;

use appointr_messaging::websocket::{ConnectionRegistry, OUTBOUND_BUFFER};

fn text(content: &str) -> Message {
    Message::Text(content.to_string())
}

/// Next frame as text, or None when the channel is closed.
async fn recv_text(rx: &mut tokio::sync::mpsc::Receiver<Message>) -> Option<String> {
    let frame = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("receive timed out")?;
    match frame {
        Message::Text(content) => Some(content),
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn broadcast_reaches_every_subscriber() {
    let registry = ConnectionRegistry::new();
    let (_a, mut rx_a) = registry.register(42).await;
    let (_b, mut rx_b) = registry.register(42).await;

    registry.broadcast(42, text("hi")).await;

    assert_eq!(recv_text(&mut rx_a).await.as_deref(), Some("hi"));
    assert_eq!(recv_text(&mut rx_b).await.as_deref(), Some("hi"));
}

#[tokio::test]
async fn conversation_key_exists_iff_subscribers_remain() {
    let registry = ConnectionRegistry::new();
    assert_eq!(registry.conversation_count().await, 0);

    let (a, _rx_a) = registry.register(1).await;
    let (b, _rx_b) = registry.register(1).await;
    assert_eq!(registry.conversation_count().await, 1);
    assert_eq!(registry.subscriber_count(1).await, 2);

    registry.unregister(1, a).await;
    assert_eq!(registry.conversation_count().await, 1);
    assert_eq!(registry.subscriber_count(1).await, 1);

    registry.unregister(1, b).await;
    // The key is removed the instant the set becomes empty.
    assert_eq!(registry.conversation_count().await, 0);
    assert_eq!(registry.subscriber_count(1).await, 0);
}

#[tokio::test]
async fn unregister_is_idempotent() {
    let registry = ConnectionRegistry::new();
    let (a, _rx_a) = registry.register(7).await;
    let (_b, _rx_b) = registry.register(7).await;

    registry.unregister(7, a).await;
    registry.unregister(7, a).await;

    // The second call is a no-op: the other connection is untouched.
    assert_eq!(registry.subscriber_count(7).await, 1);
}

#[tokio::test]
async fn unregister_of_unknown_connection_is_a_noop() {
    let registry = ConnectionRegistry::new();
    let (a, _rx) = registry.register(3).await;
    // A connection id aimed at a conversation that holds no such entry.
    registry.unregister(9999, a).await;
    assert_eq!(registry.subscriber_count(3).await, 1);
}

#[tokio::test]
async fn saturated_subscriber_is_dropped_without_blocking_fanout() {
    let registry = ConnectionRegistry::new();
    let (_slow, mut rx_slow) = registry.register(42).await;
    let (_live, mut rx_live) = registry.register(42).await;

    // Fill both outbound buffers to the brim; nobody is draining yet.
    for i in 0..OUTBOUND_BUFFER {
        registry.broadcast(42, text(&format!("m{i}"))).await;
    }
    assert_eq!(registry.subscriber_count(42).await, 2);

    // Drain only the live subscriber, then overflow the slow one.
    for i in 0..OUTBOUND_BUFFER {
        assert_eq!(recv_text(&mut rx_live).await, Some(format!("m{i}")));
    }
    registry.broadcast(42, text("overflow")).await;

    // Fan-out completed for the live subscriber; the saturated one is gone.
    assert_eq!(recv_text(&mut rx_live).await.as_deref(), Some("overflow"));
    assert_eq!(registry.subscriber_count(42).await, 1);

    // The dropped subscriber still drains its buffered frames, then finds a
    // closed channel; the overflow frame was never delivered to it.
    for i in 0..OUTBOUND_BUFFER {
        assert_eq!(recv_text(&mut rx_slow).await, Some(format!("m{i}")));
    }
    assert_eq!(recv_text(&mut rx_slow).await, None);
}

#[tokio::test]
async fn dead_subscriber_does_not_affect_other_conversations() {
    let registry = ConnectionRegistry::new();
    let (_dead, rx_dead) = registry.register(1).await;
    let (_live, mut rx_live) = registry.register(2).await;

    // Simulate a torn-down consumer: its receiver is gone.
    drop(rx_dead);
    registry.broadcast(1, text("lost")).await;
    registry.broadcast(2, text("delivered")).await;

    assert_eq!(recv_text(&mut rx_live).await.as_deref(), Some("delivered"));
    // The closed subscriber was pruned and its empty set removed.
    assert_eq!(registry.subscriber_count(1).await, 0);
    assert_eq!(registry.conversation_count().await, 1);
}

#[tokio::test]
async fn broadcast_to_unknown_conversation_is_a_noop() {
    let registry = ConnectionRegistry::new();
    registry.broadcast(999_999, text("nobody home")).await;
    assert_eq!(registry.conversation_count().await, 0);
}

#[tokio::test]
async fn delivery_includes_all_sessions_of_the_sender() {
    // "Broadcast to all": a user connected twice sees the frame on both
    // sessions; the registry does no sender exclusion.
    let registry = ConnectionRegistry::new();
    let (_first, mut rx_first) = registry.register(42).await;
    let (_second, mut rx_second) = registry.register(42).await;

    registry.broadcast(42, text("echo")).await;

    assert_eq!(recv_text(&mut rx_first).await.as_deref(), Some("echo"));
    assert_eq!(recv_text(&mut rx_second).await.as_deref(), Some("echo"));
}
