//! Feed assembly: follow-graph membership, enrichment joins, pagination
//! stability, and reaction replace semantics as seen through the feed.

use std::sync::Arc;
use std::time::Duration;

use socius_server::models::{collections, PostKind, User};
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

/// Timestamps carry microsecond precision; a short pause keeps creation
/// order observable in recency sorts.
async fn tick() {
    tokio::time::sleep(Duration::from_millis(2)).await;
}

#[tokio::test]
async fn followed_authors_post_shows_up_fully_enriched() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;

    state.follows.follow(&alice, &bob).await.unwrap();
    let post = state
        .posts
        .create_post(&bob, "hello #greet", vec![], PostKind::Regular)
        .await
        .unwrap();

    let page = state.feed.feed(&alice, 0, 20).await.unwrap();
    assert_eq!(page.len(), 1);

    let entry = &page[0];
    assert_eq!(entry.post.id, post.id);
    assert_eq!(entry.post.tags, vec!["greet"]);
    assert!(entry.reaction_counts.is_empty());
    assert_eq!(entry.comment_count, 0);
    assert!(entry.user_reaction.is_none());
    assert_eq!(entry.author.as_ref().unwrap().display_name, "Bob");
}

#[tokio::test]
async fn feed_includes_own_posts_and_excludes_strangers() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;
    let carol = seed_user(&state, "Carol").await;

    state.follows.follow(&alice, &bob).await.unwrap();

    let own = state
        .posts
        .create_post(&alice, "mine", vec![], PostKind::Regular)
        .await
        .unwrap();
    tick().await;
    let followed = state
        .posts
        .create_post(&bob, "from bob", vec![], PostKind::Regular)
        .await
        .unwrap();
    tick().await;
    state
        .posts
        .create_post(&carol, "from a stranger", vec![], PostKind::Regular)
        .await
        .unwrap();

    let page = state.feed.feed(&alice, 0, 20).await.unwrap();
    let ids: Vec<&str> = page.iter().map(|e| e.post.id.as_str()).collect();
    // Newest first; the stranger's post is absent.
    assert_eq!(ids, vec![followed.id.as_str(), own.id.as_str()]);
}

#[tokio::test]
async fn pagination_splits_the_set_disjointly_and_contiguously() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;
    state.follows.follow(&alice, &bob).await.unwrap();

    for i in 0..5 {
        state
            .posts
            .create_post(&bob, &format!("post {i}"), vec![], PostKind::Regular)
            .await
            .unwrap();
        tick().await;
    }

    let full: Vec<String> = state
        .feed
        .feed(&alice, 0, 20)
        .await
        .unwrap()
        .iter()
        .map(|e| e.post.id.clone())
        .collect();
    assert_eq!(full.len(), 5);

    let mut paged = Vec::new();
    for (skip, limit) in [(0, 2), (2, 2), (4, 2)] {
        for entry in state.feed.feed(&alice, skip, limit).await.unwrap() {
            paged.push(entry.post.id.clone());
        }
    }
    assert_eq!(paged, full, "pages must concatenate to the full ordered set");

    let timestamps: Vec<_> = state
        .feed
        .feed(&alice, 0, 20)
        .await
        .unwrap()
        .iter()
        .map(|e| e.post.created_at)
        .collect();
    assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn a_new_reaction_replaces_the_previous_one() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;
    state.follows.follow(&alice, &bob).await.unwrap();

    let post = state
        .posts
        .create_post(&bob, "react to me", vec![], PostKind::Regular)
        .await
        .unwrap();

    state.posts.react(&alice, &post.id, "love").await.unwrap();
    state.posts.react(&alice, &post.id, "wow").await.unwrap();

    let reactions = state
        .store
        .count(
            collections::REACTIONS,
            &socius_server::store::Filter::new().eq("post_id", post.id.as_str()),
        )
        .await
        .unwrap();
    assert_eq!(reactions, 1, "one reaction per (post, user)");

    let page = state.feed.feed(&alice, 0, 20).await.unwrap();
    assert_eq!(page[0].reaction_counts.get("wow"), Some(&1));
    assert_eq!(page[0].reaction_counts.get("love"), None);
    assert_eq!(page[0].user_reaction.as_deref(), Some("wow"));
}

#[tokio::test]
async fn reaction_counts_are_identical_for_every_viewer() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;
    state.follows.follow(&alice, &bob).await.unwrap();

    let post = state
        .posts
        .create_post(&bob, "quick take", vec![], PostKind::Regular)
        .await
        .unwrap();
    state.posts.react(&alice, &post.id, "like").await.unwrap();
    state.posts.react(&alice, &post.id, "angry").await.unwrap();

    for viewer in [&alice, &bob] {
        let page = state.feed.feed(viewer, 0, 20).await.unwrap();
        let entry = page.iter().find(|e| e.post.id == post.id).unwrap();
        assert_eq!(entry.reaction_counts.len(), 1);
        assert_eq!(entry.reaction_counts.get("angry"), Some(&1));
    }
}

#[tokio::test]
async fn reels_are_a_global_stream_and_stay_out_of_the_timeline() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;
    // Alice follows nobody.

    let reel = state
        .posts
        .create_post(&bob, "watch this", vec!["clip.mp4".into()], PostKind::Reel)
        .await
        .unwrap();
    state
        .posts
        .create_post(&bob, "regular words", vec![], PostKind::Regular)
        .await
        .unwrap();

    let reels = state.feed.reels(&alice, 0, 10).await.unwrap();
    assert_eq!(reels.len(), 1);
    assert_eq!(reels[0].post.id, reel.id);
    assert_eq!(reels[0].author.as_ref().unwrap().display_name, "Bob");

    let timeline = state.feed.feed(&alice, 0, 20).await.unwrap();
    assert!(timeline.is_empty(), "reels and strangers stay out of the timeline");
}

#[tokio::test]
async fn comment_count_reflects_the_thread() {
    let state = test_state();
    let alice = seed_user(&state, "Alice").await;
    let bob = seed_user(&state, "Bob").await;
    state.follows.follow(&alice, &bob).await.unwrap();

    let post = state
        .posts
        .create_post(&bob, "discuss", vec![], PostKind::Regular)
        .await
        .unwrap();
    let top = state
        .posts
        .add_comment(&alice, &post.id, None, "first!")
        .await
        .unwrap();
    state
        .posts
        .add_comment(&bob, &post.id, Some(top.id.clone()), "thanks")
        .await
        .unwrap();

    let page = state.feed.feed(&alice, 0, 20).await.unwrap();
    assert_eq!(page[0].comment_count, 2);

    let thread = state.posts.comments(&post.id).await.unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].comment.id, top.id);
    assert_eq!(thread[1].comment.parent_id.as_deref(), Some(top.id.as_str()));
}
