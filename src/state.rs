//! Shared application state wiring every service over one store and one
//! connection registry. The registry is the only shared mutable structure;
//! everything else is either the external store or immutable wiring.

use std::sync::Arc;

use crate::auth::{IdentityVerifier, SessionVerifier};
use crate::chat::ConversationService;
use crate::feed::FeedAssembler;
use crate::graph::FollowService;
use crate::notify::NotificationService;
use crate::posts::PostService;
use crate::store::DocumentStore;
use crate::ws::dispatch::EventDispatcher;
use crate::ws::registry::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub registry: ConnectionRegistry,
    pub dispatcher: EventDispatcher,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub notifications: NotificationService,
    pub follows: FollowService,
    pub posts: PostService,
    pub feed: FeedAssembler,
    pub conversations: ConversationService,
}

impl AppState {
    /// Wire all services over `store` with the session-token verifier.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let verifier = Arc::new(SessionVerifier::new(store.clone()));
        Self::with_verifier(store, verifier)
    }

    /// Same wiring with a caller-supplied identity verifier.
    pub fn with_verifier(
        store: Arc<dyn DocumentStore>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let registry = ConnectionRegistry::new();
        let dispatcher = EventDispatcher::new(registry.clone());
        let notifications = NotificationService::new(store.clone(), dispatcher.clone());

        Self {
            registry,
            verifier,
            follows: FollowService::new(store.clone(), notifications.clone()),
            posts: PostService::new(store.clone(), notifications.clone()),
            feed: FeedAssembler::new(store.clone()),
            conversations: ConversationService::new(store.clone(), dispatcher.clone()),
            notifications,
            dispatcher,
            store,
        }
    }
}
