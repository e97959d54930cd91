//! Identity verification seam.
//!
//! The core only needs "an opaque verified identity": services take an
//! already-verified identity, and the transport layer gates registration
//! through [`IdentityVerifier`]. The bundled implementation resolves bearer
//! session tokens against the `sessions` collection; anything heavier (JWT,
//! OAuth) lives behind the same trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::error::{Error, Result};
use crate::models::{collections, Session};
use crate::store::{DocumentStore, Filter};

/// A verified principal reference, used as the registry key and as the
/// foreign key in every owned entity.
pub type Identity = String;

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolve a credential to a verified identity, or fail with
    /// [`Error::Unauthenticated`].
    async fn verify(&self, credential: &str) -> Result<Identity>;
}

/// Session-token verifier backed by the document store.
pub struct SessionVerifier {
    store: Arc<dyn DocumentStore>,
}

impl SessionVerifier {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a session for `user_id` valid for `ttl_days` days and return
    /// its bearer token.
    pub async fn issue(&self, user_id: &str, ttl_days: i64) -> Result<String> {
        let session = Session {
            user_id: user_id.to_string(),
            token: uuid::Uuid::new_v4().to_string(),
            expires_at: Utc::now() + Duration::days(ttl_days),
            created_at: Utc::now(),
        };
        let token = session.token.clone();
        self.store
            .insert(
                collections::SESSIONS,
                serde_json::to_value(&session).map_err(|e| Error::store(e.to_string()))?,
            )
            .await?;
        Ok(token)
    }
}

#[async_trait]
impl IdentityVerifier for SessionVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity> {
        let token = credential.strip_prefix("Bearer ").unwrap_or(credential).trim();
        if token.is_empty() {
            return Err(Error::Unauthenticated);
        }

        let doc = self
            .store
            .find_one(collections::SESSIONS, &Filter::new().eq("token", token))
            .await?
            .ok_or(Error::Unauthenticated)?;
        let session: Session =
            serde_json::from_value(doc).map_err(|_| Error::Unauthenticated)?;

        if session.expires_at <= Utc::now() {
            return Err(Error::Unauthenticated);
        }

        // The session may outlive the account; a missing user is not an identity.
        self.store
            .find_one(
                collections::USERS,
                &Filter::new().eq("id", session.user_id.as_str()),
            )
            .await?
            .ok_or(Error::Unauthenticated)?;

        Ok(session.user_id)
    }
}
