use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Outbound buffer per connection. A subscriber that falls this far behind
/// is dropped rather than allowed to stall fan-out to the rest of the room.
pub const OUTBOUND_BUFFER: usize = 256;

/// Process-unique handle to one registered connection. Lets the owning
/// handler unregister exactly its own entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

struct ConnectionHandle {
    id: ConnectionId,
    tx: Sender<Message>,
}

/// Single source of truth for which connections are listening to which
/// conversation, and the only entity that performs fan-out. The map is the
/// one shared mutable structure in the process; register/unregister take the
/// write lock, broadcast takes it too because pruning dead subscribers
/// happens inline. The registry only ever touches a connection's outbound
/// channel, never its transport handle.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<i64, Vec<ConnectionHandle>>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber for a conversation, creating the set if absent.
    /// Returns the connection's id and the receiving end of its outbound
    /// channel; the caller's write loop is the channel's only reader.
    pub async fn register(&self, conversation_id: i64) -> (ConnectionId, Receiver<Message>) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = channel(OUTBOUND_BUFFER);
        let mut guard = self.inner.write().await;
        guard
            .entry(conversation_id)
            .or_default()
            .push(ConnectionHandle { id, tx });
        debug!(conversation_id, connection = id.0, "connection registered");
        (id, rx)
    }

    /// Remove a subscriber. Dropping its sender closes the outbound channel;
    /// the conversation key is removed the instant its set becomes empty.
    /// Calling this for an already-removed connection is a no-op.
    pub async fn unregister(&self, conversation_id: i64, connection_id: ConnectionId) {
        let mut guard = self.inner.write().await;
        if let Some(handles) = guard.get_mut(&conversation_id) {
            handles.retain(|h| h.id != connection_id);
            if handles.is_empty() {
                guard.remove(&conversation_id);
            }
        }
        debug!(
            conversation_id,
            connection = connection_id.0,
            "connection unregistered"
        );
    }

    /// Deliver one frame to every live subscriber of a conversation,
    /// sender's own sessions included. A subscriber whose buffer is full or
    /// whose channel is closed is pruned on the spot; delivery to the rest
    /// never blocks on it.
    pub async fn broadcast(&self, conversation_id: i64, frame: Message) {
        let mut guard = self.inner.write().await;
        let Some(handles) = guard.get_mut(&conversation_id) else {
            return;
        };
        handles.retain(|handle| match handle.tx.try_send(frame.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(
                    conversation_id,
                    connection = handle.id.0,
                    "outbound buffer full, dropping slow connection"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        });
        if handles.is_empty() {
            guard.remove(&conversation_id);
        }
    }

    /// Live subscribers for one conversation.
    pub async fn subscriber_count(&self, conversation_id: i64) -> usize {
        self.inner
            .read()
            .await
            .get(&conversation_id)
            .map_or(0, Vec::len)
    }

    /// Conversations that currently have at least one subscriber.
    pub async fn conversation_count(&self) -> usize {
        self.inner.read().await.len()
    }
}
