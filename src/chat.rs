//! Conversations and messaging with live push to participants.
//!
//! Direct conversations are unique per unordered participant pair, enforced
//! by lookup-before-insert. Two concurrent first calls can slip past the
//! lookup and create two conversations — the store offers no unique
//! constraint, so this narrow race is accepted and documented rather than
//! closed (see DESIGN.md).

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{collections, Conversation, Message, UserProfile};
use crate::store::{self, DocumentStore, Filter, FindOptions};
use crate::users;
use crate::ws::dispatch::EventDispatcher;
use crate::ws::LiveEvent;

/// A conversation with participant profiles and its latest message.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub participant_profiles: Vec<UserProfile>,
    pub last_message: Option<Message>,
}

/// A message with its sender's public profile joined in.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub sender: Option<UserProfile>,
}

#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn DocumentStore>,
    dispatcher: EventDispatcher,
}

impl ConversationService {
    pub fn new(store: Arc<dyn DocumentStore>, dispatcher: EventDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Return the direct conversation between `a` and `b`, creating it on
    /// first use. Idempotent across argument order.
    pub async fn get_or_create_direct(&self, a: &str, b: &str) -> Result<Conversation> {
        if a == b {
            return Err(Error::Conflict("direct conversation needs two distinct participants"));
        }
        users::get_user(self.store.as_ref(), a).await?;
        users::get_user(self.store.as_ref(), b).await?;

        let existing = self
            .store
            .find_one(
                collections::CONVERSATIONS,
                &Filter::new()
                    .eq("kind", "direct")
                    .contains_all("participants", vec![Value::from(a), Value::from(b)]),
            )
            .await?;
        if let Some(doc) = existing {
            return store::decode(doc);
        }

        let conversation = Conversation::direct(a, b);
        self.store
            .insert(collections::CONVERSATIONS, store::encode(&conversation)?)
            .await?;
        Ok(conversation)
    }

    /// Create a group conversation. The creator is always a participant.
    pub async fn create_group(
        &self,
        creator: &str,
        mut participants: Vec<String>,
        name: Option<String>,
    ) -> Result<Conversation> {
        if !participants.iter().any(|p| p == creator) {
            participants.insert(0, creator.to_string());
        }
        let conversation = Conversation::group(participants, name);
        self.store
            .insert(collections::CONVERSATIONS, store::encode(&conversation)?)
            .await?;
        Ok(conversation)
    }

    /// The user's conversations, newest first, with participant profiles
    /// (one batched lookup) and each conversation's latest message.
    pub async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationView>> {
        let docs = self
            .store
            .find(
                collections::CONVERSATIONS,
                &Filter::new().contains("participants", user_id),
                &FindOptions::default().sort_desc("created_at"),
            )
            .await?;

        let mut conversations = Vec::with_capacity(docs.len());
        for doc in docs {
            conversations.push(store::decode::<Conversation>(doc)?);
        }

        let all_participants: Vec<String> = conversations
            .iter()
            .flat_map(|c| c.participants.iter().cloned())
            .collect();
        let profiles = users::load_profiles(self.store.as_ref(), &all_participants).await?;

        let mut views = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let participant_profiles = conversation
                .participants
                .iter()
                .filter_map(|id| profiles.get(id).cloned())
                .collect();

            let last_message = match self
                .store
                .find(
                    collections::MESSAGES,
                    &Filter::new().eq("conversation_id", conversation.id.as_str()),
                    &FindOptions::default().sort_desc("created_at").limit(1),
                )
                .await?
                .pop()
            {
                Some(doc) => Some(store::decode(doc)?),
                None => None,
            };

            views.push(ConversationView {
                conversation,
                participant_profiles,
                last_message,
            });
        }
        Ok(views)
    }

    /// Persist a message, then push it live to every participant except the
    /// sender. Per-participant delivery failures are isolated and never fail
    /// the send — the durable write is the contract.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<Message> {
        let conversation = self.require_membership(conversation_id, sender_id).await?;

        let message = Message::new(conversation_id, sender_id, body);
        let doc = store::encode(&message)?;
        self.store.insert(collections::MESSAGES, doc.clone()).await?;

        let event = LiveEvent::message(doc);
        for participant in &conversation.participants {
            if participant != sender_id {
                self.dispatcher.deliver(participant, &event);
            }
        }

        Ok(message)
    }

    /// Messages in creation order (ties by insertion order), senders joined
    /// in one batched lookup. The viewer must be a participant.
    pub async fn messages(&self, conversation_id: &str, viewer: &str) -> Result<Vec<MessageView>> {
        self.require_membership(conversation_id, viewer).await?;

        let docs = self
            .store
            .find(
                collections::MESSAGES,
                &Filter::new().eq("conversation_id", conversation_id),
                &FindOptions::default().sort_asc("created_at"),
            )
            .await?;

        let mut messages = Vec::with_capacity(docs.len());
        for doc in docs {
            messages.push(store::decode::<Message>(doc)?);
        }

        let sender_ids: Vec<String> = messages.iter().map(|m| m.sender_id.clone()).collect();
        let profiles = users::load_profiles(self.store.as_ref(), &sender_ids).await?;

        Ok(messages
            .into_iter()
            .map(|message| {
                let sender = profiles.get(&message.sender_id).cloned();
                MessageView { message, sender }
            })
            .collect())
    }

    /// Load a conversation the user belongs to. Foreign conversations are
    /// indistinguishable from missing ones.
    async fn require_membership(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Conversation> {
        let doc = self
            .store
            .find_one(
                collections::CONVERSATIONS,
                &Filter::new().eq("id", conversation_id),
            )
            .await?
            .ok_or(Error::NotFound("conversation"))?;
        let conversation: Conversation = store::decode(doc)?;
        if !conversation.participants.iter().any(|p| p == user_id) {
            return Err(Error::NotFound("conversation"));
        }
        Ok(conversation)
    }
}
