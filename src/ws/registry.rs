//! Connection registry: the one shared mutable structure in the core.
//!
//! Maps each identity to its single active transport handle. A later connect
//! for the same identity supersedes the earlier handle; the superseded holder
//! is not notified, its handle is simply dropped. The map is never exposed —
//! all mutation goes through this narrow interface, and no operation touches
//! the network, so nothing here is held across I/O.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::ClientHandle;

/// Process-local, ephemeral record of one live connection. Never persisted.
#[derive(Debug, Clone)]
pub struct LiveConnection {
    pub handle: ClientHandle,
    pub connected_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<DashMap<String, LiveConnection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` as the sole active endpoint for `identity`,
    /// replacing and invalidating any prior handle.
    pub fn connect(&self, identity: &str, handle: ClientHandle) {
        let replaced = self.inner.insert(
            identity.to_string(),
            LiveConnection { handle, connected_at: Utc::now() },
        );
        if replaced.is_some() {
            tracing::debug!(identity, "connection superseded by newer connect");
        } else {
            tracing::debug!(identity, "connection registered");
        }
    }

    /// Idempotent removal; unknown identities are a no-op.
    pub fn disconnect(&self, identity: &str) {
        if self.inner.remove(identity).is_some() {
            tracing::debug!(identity, "connection unregistered");
        }
    }

    /// Remove the entry only if it still holds the handle with `handle_id`.
    /// A stale actor's cleanup or a failed delivery must not evict a
    /// connection that has already been superseded.
    pub fn disconnect_handle(&self, identity: &str, handle_id: Uuid) {
        let removed = self
            .inner
            .remove_if(identity, |_, conn| conn.handle.id() == handle_id);
        if removed.is_some() {
            tracing::debug!(identity, "connection unregistered");
        }
    }

    pub fn lookup(&self, identity: &str) -> Option<ClientHandle> {
        self.inner.get(identity).map(|conn| conn.handle.clone())
    }

    /// Snapshot of currently registered identities, for broadcast fan-out.
    pub fn identities(&self) -> Vec<String> {
        self.inner.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
