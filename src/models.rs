//! Persisted entity types for every collection the core touches.
//!
//! Every timestamp serializes through [`timestamp`]: RFC 3339, UTC, fixed
//! six-digit fractional seconds, `Z` suffix. The fixed width makes the
//! encoded strings lexicographically comparable, which the store's
//! sort-by-timestamp relies on. Every write path must go through these types
//! (or [`timestamp::format`]) so the contract holds identically everywhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Collection names used across the services.
pub mod collections {
    pub const USERS: &str = "users";
    pub const SESSIONS: &str = "sessions";
    pub const FOLLOWS: &str = "follows";
    pub const POSTS: &str = "posts";
    pub const REACTIONS: &str = "reactions";
    pub const COMMENTS: &str = "comments";
    pub const CONVERSATIONS: &str = "conversations";
    pub const MESSAGES: &str = "messages";
    pub const NOTIFICATIONS: &str = "notifications";
}

/// Canonical timestamp encoding: `2026-08-26T12:00:00.000000Z`.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Registered user. `email` never leaves the server; responses carry
/// [`UserProfile`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            email: email.into(),
            display_name: display_name.into(),
            avatar: None,
            bio: None,
            created_at: Utc::now(),
        }
    }
}

/// Public projection of a user, safe to embed in feed/message responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// Bearer session consumed by the session verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub token: String,
    #[serde(with = "timestamp")]
    pub expires_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    Pending,
    Accepted,
    Blocked,
}

/// Directed follow edge. Drives feed membership; the assembler only reads
/// edges with `status == Accepted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEdge {
    pub id: String,
    pub follower_id: String,
    pub followee_id: String,
    pub status: FollowStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl FollowEdge {
    pub fn accepted(follower_id: impl Into<String>, followee_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            follower_id: follower_id.into(),
            followee_id: followee_id.into(),
            status: FollowStatus::Accepted,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    /// Timeline post, filtered by the follow graph.
    Regular,
    /// Short-form post surfaced on the global discovery stream.
    Reel,
}

/// Immutable post. Tags and mentions are extracted from the body at creation
/// time and stored denormalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub body: String,
    #[serde(default)]
    pub media: Vec<String>,
    pub kind: PostKind,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        author_id: impl Into<String>,
        body: impl Into<String>,
        media: Vec<String>,
        kind: PostKind,
        tags: Vec<String>,
        mentions: Vec<String>,
    ) -> Self {
        Self {
            id: new_id(),
            author_id: author_id.into(),
            body: body.into(),
            media,
            kind,
            tags,
            mentions,
            created_at: Utc::now(),
        }
    }
}

/// One reaction record. The service maintains at most one per
/// (post, user) pair; `kind` is an open set ("like", "love", "wow", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub kind: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    pub fn new(
        post_id: impl Into<String>,
        user_id: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            post_id: post_id.into(),
            user_id: user_id.into(),
            kind: kind.into(),
            created_at: Utc::now(),
        }
    }
}

/// Comment on a post; `parent_id` gives one level of threading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub author_id: String,
    pub body: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        post_id: impl Into<String>,
        parent_id: Option<String>,
        author_id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            post_id: post_id.into(),
            parent_id,
            author_id: author_id.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Direct,
    Group,
}

/// Conversation. Direct conversations have exactly two participants and are
/// unique per unordered pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub participants: Vec<String>,
    pub kind: ConversationKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn direct(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            participants: vec![a.into(), b.into()],
            kind: ConversationKind::Direct,
            name: None,
            created_at: Utc::now(),
        }
    }

    pub fn group(participants: Vec<String>, name: Option<String>) -> Self {
        Self {
            id: new_id(),
            participants,
            kind: ConversationKind::Group,
            name,
            created_at: Utc::now(),
        }
    }
}

/// Append-only chat message. Ordered by `created_at` ascending; the store
/// breaks ties by insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    #[serde(default)]
    pub read: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        conversation_id: impl Into<String>,
        sender_id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            conversation_id: conversation_id.into(),
            sender_id: sender_id.into(),
            body: body.into(),
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Follow,
    Mention,
    Reaction,
    Comment,
}

/// Durable notification. Created once; only the `read` flag is ever mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub body: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn new(
        recipient_id: impl Into<String>,
        kind: NotificationKind,
        body: impl Into<String>,
        link: Option<String>,
    ) -> Self {
        Self {
            id: new_id(),
            recipient_id: recipient_id.into(),
            kind,
            body: body.into(),
            link,
            read: false,
            created_at: Utc::now(),
        }
    }
}
