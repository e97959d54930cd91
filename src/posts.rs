//! Posts, reactions, and comments, plus tag/mention extraction.
//!
//! Posts are immutable once created. Reactions keep the one-per-(post, user)
//! invariant by delete-then-insert: the store offers no unique constraint, so
//! under a single writer per key the replace is exact, and the narrow
//! concurrent-first-writer race is accepted (see DESIGN.md).

use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{
    collections, Comment, NotificationKind, Post, PostKind, Reaction, UserProfile,
};
use crate::notify::NotificationService;
use crate::store::{self, DocumentStore, Filter, FindOptions};
use crate::users;

/// Tokens beginning with `#`, prefix stripped. Tokenization is plain
/// whitespace splitting; duplicates are kept.
pub fn extract_tags(body: &str) -> Vec<String> {
    extract_prefixed(body, '#')
}

/// Tokens beginning with `@`, prefix stripped.
pub fn extract_mentions(body: &str) -> Vec<String> {
    extract_prefixed(body, '@')
}

fn extract_prefixed(body: &str, prefix: char) -> Vec<String> {
    body.split_whitespace()
        .filter_map(|token| token.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
        .collect()
}

/// A post with its author's public profile joined in.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<UserProfile>,
}

/// A comment with its author's public profile joined in.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<UserProfile>,
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn DocumentStore>,
    notifications: NotificationService,
}

impl PostService {
    pub fn new(store: Arc<dyn DocumentStore>, notifications: NotificationService) -> Self {
        Self { store, notifications }
    }

    /// Persist a new post, then notify every mention that resolves to
    /// exactly one user by display name. Ambiguous or unmatched mentions are
    /// silently dropped.
    pub async fn create_post(
        &self,
        author_id: &str,
        body: &str,
        media: Vec<String>,
        kind: PostKind,
    ) -> Result<Post> {
        let author = users::get_user(self.store.as_ref(), author_id).await?;

        let tags = extract_tags(body);
        let mentions = extract_mentions(body);
        let post = Post::new(author_id, body, media, kind, tags, mentions);

        self.store
            .insert(collections::POSTS, store::encode(&post)?)
            .await?;

        for mention in &post.mentions {
            let matches = self
                .store
                .find(
                    collections::USERS,
                    &Filter::new().eq("display_name", mention.as_str()),
                    &FindOptions::default().limit(2),
                )
                .await?;
            if matches.len() != 1 {
                tracing::debug!(mention, hits = matches.len(), "mention dropped");
                continue;
            }
            let Some(doc) = matches.into_iter().next() else { continue };
            let mentioned: crate::models::User = store::decode(doc)?;
            self.notifications
                .notify(
                    &mentioned.id,
                    NotificationKind::Mention,
                    format!("{} mentioned you in a post", author.display_name),
                    Some(format!("/post/{}", post.id)),
                )
                .await?;
        }

        Ok(post)
    }

    pub async fn get_post(&self, post_id: &str) -> Result<PostView> {
        let post = self.require_post(post_id).await?;
        let mut profiles =
            users::load_profiles(self.store.as_ref(), std::slice::from_ref(&post.author_id))
                .await?;
        let author = profiles.remove(&post.author_id);
        Ok(PostView { post, author })
    }

    /// Set the user's reaction on a post, replacing any prior one. Each
    /// identity holds at most one reaction per post.
    pub async fn react(&self, user_id: &str, post_id: &str, kind: &str) -> Result<Reaction> {
        let post = self.require_post(post_id).await?;
        let user = users::get_user(self.store.as_ref(), user_id).await?;

        self.store
            .delete_one(collections::REACTIONS, &reaction_filter(post_id, user_id))
            .await?;

        let reaction = Reaction::new(post_id, user_id, kind);
        self.store
            .insert(collections::REACTIONS, store::encode(&reaction)?)
            .await?;

        if post.author_id != user_id {
            self.notifications
                .notify(
                    &post.author_id,
                    NotificationKind::Reaction,
                    format!("{} reacted {kind} to your post", user.display_name),
                    Some(format!("/post/{post_id}")),
                )
                .await?;
        }

        Ok(reaction)
    }

    /// Remove the user's reaction if present; absent is a no-op.
    pub async fn remove_reaction(&self, user_id: &str, post_id: &str) -> Result<()> {
        self.store
            .delete_one(collections::REACTIONS, &reaction_filter(post_id, user_id))
            .await?;
        Ok(())
    }

    /// Add a comment (optionally threaded one level under `parent_id`) and
    /// notify the post author.
    pub async fn add_comment(
        &self,
        author_id: &str,
        post_id: &str,
        parent_id: Option<String>,
        body: &str,
    ) -> Result<Comment> {
        let post = self.require_post(post_id).await?;
        let author = users::get_user(self.store.as_ref(), author_id).await?;

        let comment = Comment::new(post_id, parent_id, author_id, body);
        self.store
            .insert(collections::COMMENTS, store::encode(&comment)?)
            .await?;

        if post.author_id != author_id {
            self.notifications
                .notify(
                    &post.author_id,
                    NotificationKind::Comment,
                    format!("{} commented on your post", author.display_name),
                    Some(format!("/post/{post_id}")),
                )
                .await?;
        }

        Ok(comment)
    }

    /// Comments on a post, creation time ascending, authors joined in one
    /// batched lookup.
    pub async fn comments(&self, post_id: &str) -> Result<Vec<CommentView>> {
        let docs = self
            .store
            .find(
                collections::COMMENTS,
                &Filter::new().eq("post_id", post_id),
                &FindOptions::default().sort_asc("created_at"),
            )
            .await?;

        let mut comments = Vec::with_capacity(docs.len());
        for doc in docs {
            comments.push(store::decode::<Comment>(doc)?);
        }

        let author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        let profiles = users::load_profiles(self.store.as_ref(), &author_ids).await?;

        Ok(comments
            .into_iter()
            .map(|comment| {
                let author = profiles.get(&comment.author_id).cloned();
                CommentView { comment, author }
            })
            .collect())
    }

    async fn require_post(&self, post_id: &str) -> Result<Post> {
        let doc = self
            .store
            .find_one(collections::POSTS, &Filter::new().eq("id", post_id))
            .await?
            .ok_or(Error::NotFound("post"))?;
        store::decode(doc)
    }
}

fn reaction_filter(post_id: &str, user_id: &str) -> Filter {
    Filter::new().eq("post_id", post_id).eq("user_id", user_id)
}
