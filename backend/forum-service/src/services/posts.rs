/// Post service - creation, listing, updates, deletion and likes
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics::POSTS_DELETED_TOTAL;
use crate::middleware::permissions::check_post_ownership;
use crate::models::{
    AuthorSummary, CommentView, NewPost, NewPostFile, Post, PostChanges, PostFile, PostFilter,
    PublicUser,
};
use crate::services::comment_tree::{resolve_authors, CommentTree};
use crate::services::files::remove_stored_file;
use crate::store::{CommentStore, ForumStore, LikeStore, LikeTarget, PostStore, UserStore};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Post as it appears in listings
#[derive(Debug, Serialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorSummary,
    pub files: Vec<PostFile>,
    pub likes: i64,
    pub comment_count: i64,
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub posts: Vec<PostSummary>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_posts: i64,
}

/// Post with everything the detail page shows
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<PublicUser>,
    pub files: Vec<PostFile>,
    /// Ids of users who like the post
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentView>,
}

/// Result of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes: i64,
}

/// Page request as received; clamped by [`PageRequest::resolve`]
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageRequest {
    /// Effective (page, limit): page at least 1, limit within 1..=100
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }
}

pub struct PostService {
    store: Arc<dyn ForumStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn ForumStore>) -> Self {
        Self { store }
    }

    async fn existing_post(&self, post_id: Uuid) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".into()))
    }

    /// Create a post with attachments that are already on disk
    pub async fn create_post(&self, post: NewPost, files: Vec<NewPostFile>) -> Result<PostSummary> {
        let file_count = files.len();
        let post = self.store.insert_post(post, files).await?;
        info!(post_id = %post.id, author_id = %post.author_id, file_count, "post created");

        self.summarize(post).await
    }

    /// One page of posts, newest first
    pub async fn list_posts(
        &self,
        page: PageRequest,
        mut filter: PostFilter,
    ) -> Result<PostPage> {
        let (current_page, limit) = page.resolve();
        filter.limit = limit;
        // Pages past the end come back empty rather than overflowing
        filter.offset = (current_page - 1).saturating_mul(limit);

        let (posts, total_posts) = self.store.list_posts(&filter).await?;

        let authors = resolve_authors(self.store.as_ref(), posts.iter().map(|p| p.author_id)).await?;
        let mut summaries = Vec::with_capacity(posts.len());
        for post in posts {
            let author = authors
                .get(&post.author_id)
                .cloned()
                .unwrap_or_else(|| AuthorSummary::unknown(post.author_id));
            summaries.push(self.summary_with_author(post, author).await?);
        }

        Ok(PostPage {
            posts: summaries,
            current_page,
            total_pages: (total_posts + limit - 1) / limit,
            total_posts,
        })
    }

    /// Fetch a post for display, counting the view
    pub async fn get_post(&self, post_id: Uuid) -> Result<PostDetail> {
        // Incrementing an absent post is a no-op; the lookup reports it.
        self.store.increment_views(post_id).await?;
        let post = self.existing_post(post_id).await?;

        let author = self
            .store
            .find_user(post.author_id)
            .await?
            .map(PublicUser::from);
        let files = self.store.post_files(post_id).await?;
        let likes = self.store.likers(LikeTarget::Post(post_id)).await?;
        let comments = CommentTree::new(self.store.clone()).thread(post_id).await?;

        Ok(PostDetail {
            post,
            author,
            files,
            likes,
            comments,
        })
    }

    /// Update a post on behalf of its author
    pub async fn update_post(
        &self,
        post_id: Uuid,
        acting_user: Uuid,
        changes: PostChanges,
    ) -> Result<PostSummary> {
        let post = self.existing_post(post_id).await?;
        check_post_ownership(acting_user, &post)?;

        let updated = self
            .store
            .update_post(post_id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".into()))?;
        info!(%post_id, "post updated");

        self.summarize(updated).await
    }

    /// Delete a post, its comments and its attachments
    ///
    /// Comments go first so that a failure part-way leaves the post in place
    /// and the delete can simply be repeated.
    pub async fn delete_post(&self, post_id: Uuid, acting_user: Uuid) -> Result<()> {
        let post = self.existing_post(post_id).await?;
        check_post_ownership(acting_user, &post)?;

        let files = self.store.post_files(post_id).await?;
        let comments_removed = CommentTree::new(self.store.clone())
            .delete_post_cascade(post_id)
            .await?;

        if let Err(e) = self.store.delete_post(post_id).await {
            POSTS_DELETED_TOTAL.with_label_values(&["error"]).inc();
            return Err(e);
        }
        for file in &files {
            remove_stored_file(&file.path).await;
        }

        POSTS_DELETED_TOTAL.with_label_values(&["success"]).inc();
        info!(
            %post_id,
            comments_removed,
            files_removed = files.len(),
            "post deleted"
        );
        Ok(())
    }

    /// Like the post if the user has not, unlike it otherwise
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeState> {
        self.existing_post(post_id).await?;
        let (liked, likes) = self
            .store
            .toggle_like(LikeTarget::Post(post_id), user_id)
            .await?;
        Ok(LikeState { liked, likes })
    }

    /// Like or unlike a comment
    pub async fn toggle_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<LikeState> {
        if self.store.find_comment(comment_id).await?.is_none() {
            return Err(AppError::NotFound("Comment not found".into()));
        }
        let (liked, likes) = self
            .store
            .toggle_like(LikeTarget::Comment(comment_id), user_id)
            .await?;
        Ok(LikeState { liked, likes })
    }

    async fn summarize(&self, post: Post) -> Result<PostSummary> {
        let author = self
            .store
            .find_user(post.author_id)
            .await?
            .map(|user| AuthorSummary::from(&user))
            .unwrap_or_else(|| AuthorSummary::unknown(post.author_id));
        self.summary_with_author(post, author).await
    }

    async fn summary_with_author(&self, post: Post, author: AuthorSummary) -> Result<PostSummary> {
        let files = self.store.post_files(post.id).await?;
        let likes = self.store.like_count(LikeTarget::Post(post.id)).await?;
        let comment_count = self.store.count_comments(post.id).await?;

        Ok(PostSummary {
            post,
            author,
            files,
            likes,
            comment_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, NewUser, User};
    use crate::store::MemoryStore;

    async fn setup() -> (Arc<MemoryStore>, PostService, User, User) {
        let store = Arc::new(MemoryStore::new());
        let mut users = Vec::new();
        for name in ["alice", "bob"] {
            users.push(
                store
                    .insert_user(NewUser {
                        username: name.into(),
                        email: format!("{}@example.com", name),
                        password_hash: "hash".into(),
                    })
                    .await
                    .unwrap(),
            );
        }
        let bob = users.pop().unwrap();
        let alice = users.pop().unwrap();
        (store.clone(), PostService::new(store), alice, bob)
    }

    fn new_post(author: &User, title: &str) -> NewPost {
        NewPost {
            author_id: author.id,
            title: title.into(),
            content: "body".into(),
            category: Category::Experience,
            tags: vec!["rust".into()],
        }
    }

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::default().resolve(), (1, 10));
        let wild = PageRequest {
            page: Some(-3),
            limit: Some(1000),
        };
        assert_eq!(wild.resolve(), (1, 100));
        let zero = PageRequest {
            page: Some(2),
            limit: Some(0),
        };
        assert_eq!(zero.resolve(), (2, 1));
    }

    #[tokio::test]
    async fn test_list_posts_huge_page_is_empty() {
        let (_, service, alice, _) = setup().await;
        service
            .create_post(new_post(&alice, "only"), vec![])
            .await
            .unwrap();

        let page = service
            .list_posts(
                PageRequest {
                    page: Some(i64::MAX / 10),
                    limit: Some(100),
                },
                PostFilter::default(),
            )
            .await
            .unwrap();
        assert!(page.posts.is_empty());
        assert_eq!(page.total_posts, 1);
        assert_eq!(page.current_page, i64::MAX / 10);
    }

    #[tokio::test]
    async fn test_list_posts_pagination_metadata() {
        let (_, service, alice, _) = setup().await;
        for i in 0..3 {
            service
                .create_post(new_post(&alice, &format!("post {}", i)), vec![])
                .await
                .unwrap();
        }

        let page = service
            .list_posts(
                PageRequest {
                    page: Some(2),
                    limit: Some(2),
                },
                PostFilter::default(),
            )
            .await
            .unwrap();

        assert_eq!(page.total_posts, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].post.title, "post 0");
        assert_eq!(page.posts[0].author.username, "alice");
    }

    #[tokio::test]
    async fn test_get_post_counts_views() {
        let (_, service, alice, _) = setup().await;
        let created = service.create_post(new_post(&alice, "viewed"), vec![]).await.unwrap();

        service.get_post(created.post.id).await.unwrap();
        let detail = service.get_post(created.post.id).await.unwrap();

        assert_eq!(detail.post.views, 2);
        assert_eq!(detail.author.unwrap().email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_update_requires_author() {
        let (_, service, alice, bob) = setup().await;
        let created = service.create_post(new_post(&alice, "mine"), vec![]).await.unwrap();

        let err = service
            .update_post(
                created.post.id,
                bob.id,
                PostChanges {
                    title: Some("stolen".into()),
                    ..PostChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = service
            .update_post(
                created.post.id,
                alice.id,
                PostChanges {
                    title: Some("renamed".into()),
                    ..PostChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.post.title, "renamed");
        assert_eq!(updated.post.content, "body");
    }

    #[tokio::test]
    async fn test_delete_post_removes_comments_and_files() {
        let (store, service, alice, bob) = setup().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1-1.txt");
        tokio::fs::write(&path, b"data").await.unwrap();

        let created = service
            .create_post(
                new_post(&alice, "with file"),
                vec![NewPostFile {
                    filename: "1-1.txt".into(),
                    original_name: "data.txt".into(),
                    mimetype: "text/plain".into(),
                    size: 4,
                    path: path.to_string_lossy().into_owned(),
                }],
            )
            .await
            .unwrap();
        let tree = CommentTree::new(store.clone());
        let top = tree
            .create_comment(bob.id, created.post.id, "hi", None)
            .await
            .unwrap();
        tree.create_comment(alice.id, created.post.id, "hey", Some(top.comment.id))
            .await
            .unwrap();

        let err = service.delete_post(created.post.id, bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        service.delete_post(created.post.id, alice.id).await.unwrap();

        assert!(store.find_post(created.post.id).await.unwrap().is_none());
        assert!(store.find_comment(top.comment.id).await.unwrap().is_none());
        assert!(store.post_files(created.post.id).await.unwrap().is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let (_, service, alice, bob) = setup().await;
        let created = service.create_post(new_post(&alice, "liked"), vec![]).await.unwrap();

        let first = service.toggle_like(created.post.id, bob.id).await.unwrap();
        assert_eq!(first, LikeState { liked: true, likes: 1 });
        let second = service.toggle_like(created.post.id, bob.id).await.unwrap();
        assert_eq!(second, LikeState { liked: false, likes: 0 });

        let missing = service.toggle_like(Uuid::new_v4(), bob.id).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }
}
