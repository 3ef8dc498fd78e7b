use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedSender, RwLock};
use uuid::Uuid;

use crate::error::AppError;

pub mod chat;
pub mod message_types;
pub mod notifications;

/// Feature channel a registry instance serves. One process holds one
/// registry per topic; instances never share state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Chat,
    Notifications,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Chat => "chat",
            Topic::Notifications => "notifications",
        }
    }
}

/// Unique identifier for a registered connection
///
/// Each WebSocket connection gets a unique ID when it registers. This allows
/// for precise cleanup when connections close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("connection sink closed")]
pub struct SinkClosed;

/// Write side of one live connection. The registry holds these as non-owning
/// handles; the per-connection task owns the socket itself.
pub trait ConnectionSink: Send + Sync {
    fn send_text(&self, payload: String) -> Result<(), SinkClosed>;
}

/// Production sink: feeds the per-connection outbound queue, so a write
/// never blocks on the peer's network speed.
pub struct ChannelSink {
    tx: UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl ConnectionSink for ChannelSink {
    fn send_text(&self, payload: String) -> Result<(), SinkClosed> {
        self.tx.send(payload).map_err(|_| SinkClosed)
    }
}

#[derive(Clone)]
struct RegisteredConnection {
    id: ConnectionId,
    sink: Arc<dyn ConnectionSink>,
}

/// Connection registry for one topic
///
/// Tracks every live connection per user and fans payloads out to them.
/// A user can hold any number of concurrent connections.
#[derive(Clone)]
pub struct ConnectionRegistry {
    topic: Topic,
    // user_id -> list of live connections
    inner: Arc<RwLock<HashMap<i64, Vec<RegisteredConnection>>>>,
}

impl ConnectionRegistry {
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Register a connection for a user. The returned ID is the handle for
    /// cleanup.
    pub async fn add(&self, user_id: i64, sink: Arc<dyn ConnectionSink>) -> ConnectionId {
        let id = ConnectionId::new();
        let mut guard = self.inner.write().await;
        guard
            .entry(user_id)
            .or_default()
            .push(RegisteredConnection { id, sink });

        tracing::debug!(
            topic = self.topic.as_str(),
            user_id,
            connections = guard.get(&user_id).map(|v| v.len()).unwrap_or(0),
            "connection registered"
        );

        id
    }

    /// Deregister a connection. A no-op when the connection is not present;
    /// empty user entries are pruned.
    pub async fn remove(&self, user_id: i64, connection_id: ConnectionId) {
        let mut guard = self.inner.write().await;
        if let Some(connections) = guard.get_mut(&user_id) {
            if let Some(idx) = connections.iter().position(|c| c.id == connection_id) {
                connections.remove(idx);
                tracing::debug!(
                    topic = self.topic.as_str(),
                    user_id,
                    remaining = connections.len(),
                    "connection deregistered"
                );
            }
            if connections.is_empty() {
                guard.remove(&user_id);
            }
        }
    }

    /// Send a payload to every live connection of one user.
    ///
    /// The connection list is snapshotted under the lock and the writes
    /// happen outside it, so one stalled peer cannot block the registry.
    /// Stops at the first failing connection and returns its error; returns
    /// Ok when the user has no connections.
    pub async fn broadcast<T: serde::Serialize>(
        &self,
        user_id: i64,
        payload: &T,
    ) -> Result<(), AppError> {
        let payload = serde_json::to_string(payload).map_err(|e| {
            tracing::error!(topic = self.topic.as_str(), error = %e, "payload serialization failed");
            AppError::Internal
        })?;

        let snapshot: Vec<RegisteredConnection> = {
            let guard = self.inner.read().await;
            match guard.get(&user_id) {
                Some(connections) => connections.clone(),
                None => return Ok(()),
            }
        };

        for connection in snapshot {
            if connection.sink.send_text(payload.clone()).is_err() {
                tracing::debug!(
                    topic = self.topic.as_str(),
                    user_id,
                    connection_id = ?connection.id,
                    "broadcast write failed"
                );
                return Err(AppError::ConnectionClosed);
            }
        }

        Ok(())
    }

    /// Get the number of live connections for a user
    pub async fn connection_count(&self, user_id: i64) -> usize {
        let guard = self.inner.read().await;
        guard.get(&user_id).map(|v| v.len()).unwrap_or(0)
    }

    /// Get the number of users with at least one live connection
    pub async fn connected_users_count(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }
}
