//! Durable notifications with best-effort live push.
//!
//! `notify` is a two-phase operation with a strict ordering invariant: the
//! record is persisted first, and only a successful insert is followed by a
//! live delivery attempt. If the insert fails the caller sees the error and
//! no push happens. If the push fails (recipient offline, dead handle) the
//! caller still sees success — the durable record is the source of truth and
//! remains reachable through `list`.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{collections, NotificationKind, NotificationRecord};
use crate::store::{self, DocumentStore, Filter, FindOptions};
use crate::ws::dispatch::EventDispatcher;
use crate::ws::LiveEvent;

/// Most recent notifications returned by `list`.
const LIST_LIMIT: usize = 50;

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn DocumentStore>,
    dispatcher: EventDispatcher,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DocumentStore>, dispatcher: EventDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Persist a notification (`read = false`), then push the identical
    /// serialized record to the recipient's live connection if any.
    pub async fn notify(
        &self,
        recipient: &str,
        kind: NotificationKind,
        body: impl Into<String>,
        link: Option<String>,
    ) -> Result<NotificationRecord> {
        let record = NotificationRecord::new(recipient, kind, body, link);
        let doc = store::encode(&record)?;

        self.store.insert(collections::NOTIFICATIONS, doc.clone()).await?;

        let outcome = self.dispatcher.deliver(recipient, &LiveEvent::notification(doc));
        if !outcome.is_delivered() {
            tracing::debug!(recipient, kind = ?record.kind, "notification persisted, recipient offline");
        }
        Ok(record)
    }

    /// Newest-first list of the recipient's recent notifications.
    pub async fn list(&self, recipient: &str) -> Result<Vec<NotificationRecord>> {
        let docs = self
            .store
            .find(
                collections::NOTIFICATIONS,
                &Filter::new().eq("recipient_id", recipient),
                &FindOptions::default().sort_desc("created_at").limit(LIST_LIMIT),
            )
            .await?;
        docs.into_iter().map(store::decode).collect()
    }

    /// Flip the read flag on one of the recipient's notifications.
    pub async fn mark_read(&self, recipient: &str, notification_id: &str) -> Result<()> {
        let matched = self
            .store
            .update_one(
                collections::NOTIFICATIONS,
                &Filter::new()
                    .eq("id", notification_id)
                    .eq("recipient_id", recipient),
                serde_json::json!({ "read": true }),
            )
            .await?;
        if matched {
            Ok(())
        } else {
            Err(Error::NotFound("notification"))
        }
    }
}
