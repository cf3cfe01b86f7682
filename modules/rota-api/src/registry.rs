//! Connection registry: which live realtime connections belong to which
//! user.
//!
//! Connections arrive unauthenticated and sit in a holding area until the
//! in-band handshake resolves them to a user. A connection is in at most
//! one bucket at any time, and nothing here keeps a reference after
//! `deregister`.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// The connection's writer has gone away; the payload was not queued.
#[derive(Debug, PartialEq, Eq)]
pub struct ConnectionClosed;

/// Handle to one live connection: a FIFO queue drained by the connection's
/// writer task. Cloning the handle clones the sender, not the queue.
#[derive(Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    tx: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    /// A fresh handle plus the receiving end for the writer task.
    pub fn open() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }

    /// Queue a payload for delivery in FIFO order.
    pub fn send(&self, payload: &str) -> Result<(), ConnectionClosed> {
        self.tx
            .send(payload.to_string())
            .map_err(|_| ConnectionClosed)
    }
}

#[derive(Default)]
struct Buckets {
    /// Connections that have not completed the auth handshake.
    pending: HashMap<ConnectionId, ConnectionHandle>,
    /// Authenticated connections, bucketed by user.
    by_user: HashMap<String, HashMap<ConnectionId, ConnectionHandle>>,
    /// Reverse index: which user bucket a connection lives in.
    user_of: HashMap<ConnectionId, String>,
}

/// Internally synchronized; callers never lock.
#[derive(Default)]
pub struct ConnectionRegistry {
    buckets: Mutex<Buckets>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unauthenticated connection to the holding area.
    pub fn register(&self, conn: ConnectionHandle) {
        let mut buckets = self.buckets.lock().unwrap();
        buckets.pending.insert(conn.id, conn);
    }

    /// Move a connection into a user's bucket. Idempotent per connection;
    /// a repeat handshake as a different user re-homes it.
    pub fn authenticate(&self, conn_id: ConnectionId, user_id: &str) {
        let mut buckets = self.buckets.lock().unwrap();
        let Some(conn) = take_connection(&mut buckets, conn_id) else {
            return;
        };
        buckets
            .by_user
            .entry(user_id.to_string())
            .or_default()
            .insert(conn_id, conn);
        buckets.user_of.insert(conn_id, user_id.to_string());
    }

    /// Drop a connection from whichever bucket holds it. No-op if absent,
    /// so racing disconnect paths are safe.
    pub fn deregister(&self, conn_id: ConnectionId) {
        let mut buckets = self.buckets.lock().unwrap();
        take_connection(&mut buckets, conn_id);
    }

    /// Point-in-time snapshot of a user's live connections.
    pub fn connections_for(&self, user_id: &str) -> Vec<ConnectionHandle> {
        let buckets = self.buckets.lock().unwrap();
        buckets
            .by_user
            .get(user_id)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn take_connection(buckets: &mut Buckets, conn_id: ConnectionId) -> Option<ConnectionHandle> {
    if let Some(conn) = buckets.pending.remove(&conn_id) {
        return Some(conn);
    }
    let user_id = buckets.user_of.remove(&conn_id)?;
    let bucket = buckets.by_user.get_mut(&user_id)?;
    let conn = bucket.remove(&conn_id);
    if bucket.is_empty() {
        buckets.by_user.remove(&user_id);
    }
    conn
}
