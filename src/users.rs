//! Shared user lookups for the enrichment paths.
//!
//! Feed, comments, conversations, and messages all embed author/sender
//! profiles. Enrichment fetches the whole referenced identity set in one
//! `In` query and joins in memory instead of issuing per-item lookups.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{collections, User, UserProfile};
use crate::store::{self, DocumentStore, Filter, FindOptions};

/// Fetch one user or fail with `NotFound`.
pub(crate) async fn get_user(store: &dyn DocumentStore, id: &str) -> Result<User> {
    let doc = store
        .find_one(collections::USERS, &Filter::new().eq("id", id))
        .await?
        .ok_or(Error::NotFound("user"))?;
    store::decode(doc)
}

/// Batched profile lookup keyed by user id. Unknown ids are simply absent
/// from the result; callers render those references without a profile.
pub(crate) async fn load_profiles(
    store: &dyn DocumentStore,
    ids: &[String],
) -> Result<HashMap<String, UserProfile>> {
    let mut unique: Vec<Value> = Vec::new();
    for id in ids {
        let value = Value::from(id.as_str());
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    if unique.is_empty() {
        return Ok(HashMap::new());
    }

    let docs = store
        .find(
            collections::USERS,
            &Filter::new().is_in("id", unique),
            &FindOptions::default(),
        )
        .await?;

    let mut profiles = HashMap::with_capacity(docs.len());
    for doc in docs {
        let user: User = store::decode(doc)?;
        profiles.insert(user.id.clone(), UserProfile::from(&user));
    }
    Ok(profiles)
}
