//! Follow graph: directed edges between identities.
//!
//! Writes live here; the feed assembler only reads accepted edges. A
//! duplicate follow surfaces as `Conflict` (the edge is the idempotency
//! unit), while unfollow is an idempotent delete.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{collections, FollowEdge, NotificationKind, UserProfile};
use crate::notify::NotificationService;
use crate::store::{self, DocumentStore, Filter, FindOptions};
use crate::users;

#[derive(Clone)]
pub struct FollowService {
    store: Arc<dyn DocumentStore>,
    notifications: NotificationService,
}

impl FollowService {
    pub fn new(store: Arc<dyn DocumentStore>, notifications: NotificationService) -> Self {
        Self { store, notifications }
    }

    /// Create an accepted follow edge and notify the followee.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> Result<FollowEdge> {
        if follower_id == followee_id {
            return Err(Error::Conflict("cannot follow yourself"));
        }

        let follower = users::get_user(self.store.as_ref(), follower_id).await?;
        users::get_user(self.store.as_ref(), followee_id).await?;

        let existing = self
            .store
            .find_one(collections::FOLLOWS, &edge_filter(follower_id, followee_id))
            .await?;
        if existing.is_some() {
            return Err(Error::Conflict("already following"));
        }

        let edge = FollowEdge::accepted(follower_id, followee_id);
        self.store
            .insert(collections::FOLLOWS, store::encode(&edge)?)
            .await?;

        self.notifications
            .notify(
                followee_id,
                NotificationKind::Follow,
                format!("{} started following you", follower.display_name),
                Some(format!("/profile/{follower_id}")),
            )
            .await?;

        Ok(edge)
    }

    /// Remove the edge if present. Unfollowing someone you never followed
    /// is a no-op, not an error.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> Result<()> {
        self.store
            .delete_one(collections::FOLLOWS, &edge_filter(follower_id, followee_id))
            .await?;
        Ok(())
    }

    /// Profiles this user follows.
    pub async fn following(&self, user_id: &str) -> Result<Vec<UserProfile>> {
        self.edge_profiles("follower_id", user_id, |edge| edge.followee_id).await
    }

    /// Profiles following this user.
    pub async fn followers(&self, user_id: &str) -> Result<Vec<UserProfile>> {
        self.edge_profiles("followee_id", user_id, |edge| edge.follower_id).await
    }

    async fn edge_profiles(
        &self,
        key_field: &str,
        user_id: &str,
        other_end: fn(FollowEdge) -> String,
    ) -> Result<Vec<UserProfile>> {
        let docs = self
            .store
            .find(
                collections::FOLLOWS,
                &Filter::new().eq(key_field, user_id),
                &FindOptions::default(),
            )
            .await?;

        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            let edge: FollowEdge = store::decode(doc)?;
            ids.push(other_end(edge));
        }

        let mut profiles = users::load_profiles(self.store.as_ref(), &ids).await?;
        Ok(ids.iter().filter_map(|id| profiles.remove(id)).collect())
    }
}

fn edge_filter(follower_id: &str, followee_id: &str) -> Filter {
    Filter::new()
        .eq("follower_id", follower_id)
        .eq("followee_id", followee_id)
}
