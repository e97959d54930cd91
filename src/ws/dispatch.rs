//! Best-effort event delivery over the connection registry.
//!
//! Delivery is advisory: callers persist first and treat the push as a
//! latency optimization. The dispatcher therefore never returns an error —
//! an offline recipient and a dead connection both come back as
//! [`Delivery::Offline`], and a dead connection is evicted on the spot.

use super::registry::ConnectionRegistry;
use super::LiveEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Recipient has no live connection (or it died during the push). The
    /// event is not queued or retried at this layer.
    Offline,
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

#[derive(Clone)]
pub struct EventDispatcher {
    registry: ConnectionRegistry,
}

impl EventDispatcher {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Push `event` to `identity` if connected. A failed push is conclusive
    /// evidence of a dead connection: the handle is evicted and the event
    /// reported undelivered.
    pub fn deliver(&self, identity: &str, event: &LiveEvent) -> Delivery {
        let Some(handle) = self.registry.lookup(identity) else {
            return Delivery::Offline;
        };
        match handle.push(event.clone()) {
            Ok(()) => Delivery::Delivered,
            Err(_) => {
                tracing::debug!(identity, "push failed, evicting dead connection");
                self.registry.disconnect_handle(identity, handle.id());
                Delivery::Offline
            }
        }
    }

    /// Deliver to every registered identity. Per-recipient failures are
    /// isolated; one dead connection never aborts the rest. Returns the
    /// number of successful pushes.
    pub fn broadcast(&self, event: &LiveEvent) -> usize {
        self.registry
            .identities()
            .iter()
            .filter(|identity| self.deliver(identity, event).is_delivered())
            .count()
    }
}
