//! Post creation side effects: mention resolution, reaction and comment
//! notifications, and the follow-graph write paths.

use std::sync::Arc;

use socius_server::error::Error;
use socius_server::models::{collections, NotificationKind, PostKind, User};
use socius_server::state::AppState;
use socius_server::store::MemoryStore;

fn test_state() -> AppState {
    AppState::new(Arc::new(MemoryStore::new()))
}

async fn seed_user(state: &AppState, name: &str) -> String {
    let user = User::new(format!("{}@example.com", name.to_lowercase()), name);
    let id = user.id.clone();
    state
        .store
        .insert(collections::USERS, serde_json::to_value(&user).unwrap())
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn unique_display_name_mention_notifies_that_user() {
    let state = test_state();
    let bob = seed_user(&state, "Bob").await;
    let alice = seed_user(&state, "Alice").await;

    let post = state
        .posts
        .create_post(&bob, "shoutout to @Alice", vec![], PostKind::Regular)
        .await
        .unwrap();
    assert_eq!(post.mentions, vec!["Alice"]);

    let list = state.notifications.list(&alice).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].kind, NotificationKind::Mention);
    assert_eq!(list[0].link.as_deref(), Some(format!("/post/{}", post.id).as_str()));
}

#[tokio::test]
async fn ambiguous_or_unknown_mentions_are_dropped() {
    let state = test_state();
    let bob = seed_user(&state, "Bob").await;
    let dup_a = seed_user(&state, "Dup").await;
    let dup_b = seed_user(&state, "Dup").await;

    state
        .posts
        .create_post(&bob, "hey @Dup and @Nobody", vec![], PostKind::Regular)
        .await
        .unwrap();

    for dup in [&dup_a, &dup_b] {
        assert!(
            state.notifications.list(dup).await.unwrap().is_empty(),
            "ambiguous mention must not notify anyone"
        );
    }
}

#[tokio::test]
async fn reacting_notifies_the_author_but_not_on_self_reaction() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;

    let post = state
        .posts
        .create_post(&bob, "react away", vec![], PostKind::Regular)
        .await
        .unwrap();

    state.posts.react(&alice, &post.id, "love").await.unwrap();
    let to_bob = state.notifications.list(&bob).await.unwrap();
    assert_eq!(to_bob.len(), 1);
    assert_eq!(to_bob[0].kind, NotificationKind::Reaction);

    state.posts.react(&bob, &post.id, "like").await.unwrap();
    assert_eq!(
        state.notifications.list(&bob).await.unwrap().len(),
        1,
        "self-reaction must not notify"
    );
}

#[tokio::test]
async fn commenting_notifies_the_author() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;

    let post = state
        .posts
        .create_post(&bob, "thoughts?", vec![], PostKind::Regular)
        .await
        .unwrap();
    state
        .posts
        .add_comment(&alice, &post.id, None, "great")
        .await
        .unwrap();

    let to_bob = state.notifications.list(&bob).await.unwrap();
    assert_eq!(to_bob.len(), 1);
    assert_eq!(to_bob[0].kind, NotificationKind::Comment);
}

#[tokio::test]
async fn remove_reaction_deletes_the_record_and_is_idempotent() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;

    let post = state
        .posts
        .create_post(&bob, "take it back", vec![], PostKind::Regular)
        .await
        .unwrap();
    state.posts.react(&alice, &post.id, "love").await.unwrap();

    state.posts.remove_reaction(&alice, &post.id).await.unwrap();
    let remaining = state
        .store
        .count(
            collections::REACTIONS,
            &socius_server::store::Filter::new().eq("post_id", post.id.as_str()),
        )
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    // Removing again, or removing a reaction that never existed, is a no-op.
    state.posts.remove_reaction(&alice, &post.id).await.unwrap();
    state.posts.remove_reaction(&bob, &post.id).await.unwrap();
}

#[tokio::test]
async fn get_post_joins_the_author_profile() {
    let state = test_state();
    let bob = seed_user(&state, "Bob").await;

    let post = state
        .posts
        .create_post(&bob, "read me", vec![], PostKind::Regular)
        .await
        .unwrap();

    let view = state.posts.get_post(&post.id).await.unwrap();
    assert_eq!(view.post.id, post.id);
    assert_eq!(view.post.body, "read me");
    assert_eq!(view.author.as_ref().unwrap().display_name, "Bob");

    let err = state.posts.get_post("no-such-post").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn reacting_to_a_missing_post_is_not_found() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let err = state.posts.react(&alice, "no-such-post", "wow").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn duplicate_follow_is_a_conflict_and_unfollow_is_idempotent() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;

    state.follows.follow(&alice, &bob).await.unwrap();
    let err = state.follows.follow(&alice, &bob).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // The followee was notified exactly once.
    let to_bob = state.notifications.list(&bob).await.unwrap();
    assert_eq!(to_bob.len(), 1);
    assert_eq!(to_bob[0].kind, NotificationKind::Follow);

    state.follows.unfollow(&alice, &bob).await.unwrap();
    state.follows.unfollow(&alice, &bob).await.unwrap();
    assert!(state.follows.following(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn follower_and_following_listings_return_profiles() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;
    let carol = seed_user(&state, "Carol").await;

    state.follows.follow(&alice, &bob).await.unwrap();
    state.follows.follow(&carol, &bob).await.unwrap();

    let following = state.follows.following(&alice).await.unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].display_name, "Bob");

    let followers = state.follows.followers(&bob).await.unwrap();
    let mut names: Vec<&str> = followers.iter().map(|p| p.display_name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Alice", "Carol"]);
}

#[tokio::test]
async fn self_follow_is_rejected() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let err = state.follows.follow(&alice, &alice).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}
