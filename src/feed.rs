//! Fan-out-on-read feed assembly.
//!
//! The timeline is computed at request time by joining the follow graph, the
//! post collection, and the per-post reaction/comment aggregates. The follow
//! snapshot and the post query are two independent reads with no
//! transactional link: a follow or unfollow racing pagination can make a
//! post appear or vanish between pages. That weak consistency is the
//! documented contract — no phantom-read guarantee is made across pages.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::models::{collections, Post, Reaction, UserProfile};
use crate::store::{self, DocumentStore, Filter, FindOptions};
use crate::users;

/// Page size used when the caller passes 0.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: usize = 100;

/// One fully enriched timeline entry.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<UserProfile>,
    /// Reaction kind -> count over all identities.
    pub reaction_counts: BTreeMap<String, u64>,
    /// The viewer's own reaction, if any.
    pub user_reaction: Option<String>,
    pub comment_count: u64,
}

#[derive(Clone)]
pub struct FeedAssembler {
    store: Arc<dyn DocumentStore>,
}

impl FeedAssembler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The viewer's timeline: regular posts authored by accepted followees
    /// or the viewer themself, newest first, skip/limit paginated. Equal
    /// timestamps tie-break by insertion order (the store's stable sort), so
    /// consecutive pages under no concurrent mutation split the underlying
    /// set disjointly and contiguously.
    pub async fn feed(&self, viewer: &str, skip: usize, limit: usize) -> Result<Vec<FeedPost>> {
        let edges = self
            .store
            .find(
                collections::FOLLOWS,
                &Filter::new()
                    .eq("follower_id", viewer)
                    .eq("status", "accepted"),
                &FindOptions::default(),
            )
            .await?;

        // Self-inclusion: a viewer always sees their own posts.
        let mut authors: Vec<Value> = vec![Value::from(viewer)];
        for doc in edges {
            if let Some(followee) = doc.get("followee_id").cloned() {
                authors.push(followee);
            }
        }

        let posts = self
            .store
            .find(
                collections::POSTS,
                &Filter::new()
                    .is_in("author_id", authors)
                    .eq("kind", "regular"),
                &FindOptions::default()
                    .sort_desc("created_at")
                    .skip(skip)
                    .limit(page_size(limit)),
            )
            .await?;

        self.enrich(viewer, posts).await
    }

    /// The discovery stream: short-form posts from everyone, newest first.
    /// Same join pattern as the timeline, no follow-graph filter.
    pub async fn reels(&self, viewer: &str, skip: usize, limit: usize) -> Result<Vec<FeedPost>> {
        let posts = self
            .store
            .find(
                collections::POSTS,
                &Filter::new().eq("kind", "reel"),
                &FindOptions::default()
                    .sort_desc("created_at")
                    .skip(skip)
                    .limit(page_size(limit)),
            )
            .await?;

        self.enrich(viewer, posts).await
    }

    /// Join author profiles (one batched lookup), collapsed reaction counts,
    /// the viewer's own reaction, and the comment count onto a page of posts.
    async fn enrich(&self, viewer: &str, docs: Vec<Value>) -> Result<Vec<FeedPost>> {
        let mut posts = Vec::with_capacity(docs.len());
        for doc in docs {
            posts.push(store::decode::<Post>(doc)?);
        }

        let author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
        let profiles = users::load_profiles(self.store.as_ref(), &author_ids).await?;

        let mut page = Vec::with_capacity(posts.len());
        for post in posts {
            let reaction_docs = self
                .store
                .find(
                    collections::REACTIONS,
                    &Filter::new().eq("post_id", post.id.as_str()),
                    &FindOptions::default(),
                )
                .await?;

            let mut reaction_counts = BTreeMap::new();
            let mut user_reaction = None;
            for doc in reaction_docs {
                let reaction: Reaction = store::decode(doc)?;
                *reaction_counts.entry(reaction.kind.clone()).or_insert(0u64) += 1;
                if reaction.user_id == viewer {
                    user_reaction = Some(reaction.kind);
                }
            }

            let comment_count = self
                .store
                .count(
                    collections::COMMENTS,
                    &Filter::new().eq("post_id", post.id.as_str()),
                )
                .await?;

            let author = profiles.get(&post.author_id).cloned();
            page.push(FeedPost {
                post,
                author,
                reaction_counts,
                user_reaction,
                comment_count,
            });
        }

        Ok(page)
    }
}

fn page_size(limit: usize) -> usize {
    if limit == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        limit.min(MAX_PAGE_SIZE)
    }
}
