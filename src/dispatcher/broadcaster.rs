//! Fan-out to connected players, spectators, and admins.
//!
//! Wraps each outbound message in an `Arc` so broadcasting to N connections
//! costs N pointer clones rather than N serializations, the same trade-off
//! the signaling server's broadcast module makes — without that module's
//! pre-serialized msgpack/rkyv caching, which this crate has no use for
//! since every audience here receives plain JSON text frames.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::protocol::{ConnId, ServerMessage};

pub type Outbox = tokio::sync::mpsc::UnboundedSender<Arc<ServerMessage>>;

/// Registry of live connections able to receive `ServerMessage`s. One
/// `Broadcaster` is shared across the whole process; the dispatcher and
/// admin surface both fan out through it.
#[derive(Default)]
pub struct Broadcaster {
    connections: DashMap<ConnId, Outbox>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, conn_id: ConnId, outbox: Outbox) {
        self.connections.insert(conn_id, outbox);
    }

    pub fn unregister(&self, conn_id: ConnId) {
        self.connections.remove(&conn_id);
    }

    /// Send to exactly one connection. Silently drops if the connection has
    /// already disconnected — the send task's own unregister races this
    /// harmlessly.
    pub fn send_to(&self, conn_id: ConnId, message: ServerMessage) {
        self.send_arc_to(conn_id, Arc::new(message));
    }

    pub fn send_arc_to(&self, conn_id: ConnId, message: Arc<ServerMessage>) {
        if let Some(outbox) = self.connections.get(&conn_id) {
            if outbox.send(message).is_err() {
                trace!(%conn_id, "outbox closed; connection is tearing down");
            }
        }
    }

    /// Broadcast the same message to every connection in `targets`, cloning
    /// the `Arc` rather than the message body.
    pub fn broadcast(&self, targets: impl IntoIterator<Item = ConnId>, message: ServerMessage) {
        let message = Arc::new(message);
        for conn_id in targets {
            self.send_arc_to(conn_id, message.clone());
        }
    }
}
