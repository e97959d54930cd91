//! Live event delivery: transport handles, connection registry, dispatcher,
//! and the WebSocket actor that bridges real sockets onto handles.

pub mod actor;
pub mod dispatch;
pub mod registry;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Server-pushed event. Wire shape is `{"type": ..., "data": {...}}`,
/// serialized as a JSON text frame by the connection actor.
#[derive(Debug, Clone, Serialize)]
pub struct LiveEvent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: Value,
}

impl LiveEvent {
    pub fn notification(data: Value) -> Self {
        Self { kind: "notification", data }
    }

    pub fn message(data: Value) -> Self {
        Self { kind: "message", data }
    }
}

/// Handle to one live client connection: the sender half of the connection
/// actor's channel. Cloning is cheap; pushes never block. The unique id lets
/// the registry evict exactly this handle without racing a newer connection
/// for the same identity.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: Uuid,
    tx: mpsc::UnboundedSender<LiveEvent>,
}

impl ClientHandle {
    /// Create a handle plus the receiver half the connection actor drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LiveEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id: Uuid::new_v4(), tx }, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue an event for the connection. Fails only when the actor is gone,
    /// which the dispatcher treats as a conclusive disconnect signal.
    pub fn push(&self, event: LiveEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| Error::DeliveryFailed)
    }
}
