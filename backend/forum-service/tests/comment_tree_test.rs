//! Integration Tests: comment tree lifecycle
//!
//! Drives the services the way the HTTP layer does, against the in-memory
//! store, and checks that posts, comments and replies stay consistent.

mod common;

use std::sync::Arc;
use uuid::Uuid;

use forum_service::models::{Category, NewPost, NewUser};
use forum_service::services::posts::PageRequest;
use forum_service::services::{CommentTree, PostService};
use forum_service::store::{CommentStore, MemoryStore, PostStore, UserStore};
use forum_service::AppError;

async fn add_user(store: &MemoryStore, name: &str) -> Uuid {
    store
        .insert_user(NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "hash".to_string(),
        })
        .await
        .expect("insert user")
        .id
}

async fn add_post(posts: &PostService, author: Uuid, title: &str) -> Uuid {
    posts
        .create_post(
            NewPost {
                author_id: author,
                title: title.to_string(),
                content: "body".to_string(),
                category: Category::Discussion,
                tags: vec!["rust".to_string()],
            },
            Vec::new(),
        )
        .await
        .expect("create post")
        .post
        .id
}

#[tokio::test]
async fn test_reply_removed_with_its_parent() {
    let store = Arc::new(MemoryStore::new());
    let tree = CommentTree::new(store.clone());
    let posts = PostService::new(store.clone());

    let alice = add_user(&store, "alice").await;
    let bob = add_user(&store, "bob").await;
    let post_id = add_post(&posts, alice, "Post X").await;

    let comment = tree
        .create_comment(bob, post_id, "first", None)
        .await
        .unwrap()
        .comment;
    let reply = tree
        .create_comment(alice, post_id, "thanks", Some(comment.id))
        .await
        .unwrap()
        .comment;

    let thread = tree.thread(post_id).await.unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].replies.len(), 1);
    assert_eq!(thread[0].replies[0].comment.id, reply.id);
    assert_eq!(thread[0].author.username, "bob");

    let outcome = tree.delete_comment(comment.id, bob).await.unwrap();
    assert_eq!(outcome.replies_removed, 1);
    assert!(outcome.comment_removed);

    assert!(tree.thread(post_id).await.unwrap().is_empty());
    assert!(store.find_comment(reply.id).await.unwrap().is_none());
    assert_eq!(store.count_comments(post_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_comment_count_tracks_top_level_comments() {
    let store = Arc::new(MemoryStore::new());
    let tree = CommentTree::new(store.clone());
    let posts = PostService::new(store.clone());

    let alice = add_user(&store, "alice").await;
    let post_id = add_post(&posts, alice, "Counting").await;

    let first = tree
        .create_comment(alice, post_id, "one", None)
        .await
        .unwrap()
        .comment;
    tree.create_comment(alice, post_id, "two", None)
        .await
        .unwrap();
    tree.create_comment(alice, post_id, "reply", Some(first.id))
        .await
        .unwrap();

    let page = posts
        .list_posts(PageRequest::default(), Default::default())
        .await
        .unwrap();
    assert_eq!(page.total_posts, 1);
    assert_eq!(page.posts[0].comment_count, 2);
}

#[tokio::test]
async fn test_post_delete_cascades_comments() {
    let store = Arc::new(MemoryStore::new());
    let tree = CommentTree::new(store.clone());
    let posts = PostService::new(store.clone());

    let alice = add_user(&store, "alice").await;
    let bob = add_user(&store, "bob").await;
    let doomed = add_post(&posts, alice, "Doomed").await;
    let kept = add_post(&posts, alice, "Kept").await;

    let top = tree
        .create_comment(bob, doomed, "c", None)
        .await
        .unwrap()
        .comment;
    tree.create_comment(alice, doomed, "r", Some(top.id))
        .await
        .unwrap();
    let survivor = tree
        .create_comment(bob, kept, "stays", None)
        .await
        .unwrap()
        .comment;

    let err = posts.delete_post(doomed, bob).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    posts.delete_post(doomed, alice).await.unwrap();

    assert!(store.find_post(doomed).await.unwrap().is_none());
    assert!(store.find_comment(top.id).await.unwrap().is_none());
    assert!(store.find_comment(survivor.id).await.unwrap().is_some());
    assert!(matches!(
        posts.get_post(doomed).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_interrupted_post_delete_can_be_repeated() {
    let store = Arc::new(MemoryStore::new());
    let tree = CommentTree::new(store.clone());
    let posts = PostService::new(store.clone());

    let alice = add_user(&store, "alice").await;
    let post_id = add_post(&posts, alice, "Flaky").await;
    tree.create_comment(alice, post_id, "c", None)
        .await
        .unwrap();

    store.fail_next("delete_post").await;
    assert!(posts.delete_post(post_id, alice).await.is_err());

    // Comments are gone, the post is still there
    assert!(store.find_post(post_id).await.unwrap().is_some());
    assert!(tree.thread(post_id).await.unwrap().is_empty());

    posts.delete_post(post_id, alice).await.unwrap();
    assert!(store.find_post(post_id).await.unwrap().is_none());
}
