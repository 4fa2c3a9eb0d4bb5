/// Record store abstraction
///
/// Services talk to storage only through these traits. Lookups return
/// `Ok(None)` for absent records and deletes of absent records succeed with a
/// zero count. No guarantee spans more than a single call.
///
/// Two implementations exist: [`PgForumStore`] for PostgreSQL and
/// [`MemoryStore`] for development and tests.
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AuthorSummary, Comment, NewComment, NewPost, NewPostFile, NewUser, Post, PostChanges,
    PostFile, PostFilter, ProfileChanges, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgForumStore;

/// Record that can carry likes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Post(Uuid),
    Comment(Uuid),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert an account; `Conflict` if the username or email is taken
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Apply profile changes; `Ok(None)` if the user does not exist
    async fn update_user_profile(&self, id: Uuid, changes: ProfileChanges)
        -> Result<Option<User>>;

    /// Resolve display summaries; unknown ids are omitted
    async fn find_authors(&self, ids: &[Uuid]) -> Result<Vec<AuthorSummary>>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a post together with its attachment records
    async fn insert_post(&self, post: NewPost, files: Vec<NewPostFile>) -> Result<Post>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;

    /// One page of posts, newest first, plus the total number of matches
    async fn list_posts(&self, filter: &PostFilter) -> Result<(Vec<Post>, i64)>;

    /// Apply changes and refresh `updated_at`; `Ok(None)` if absent
    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>>;

    async fn increment_views(&self, id: Uuid) -> Result<()>;

    /// Remove the post with its attachment records and likes.
    /// Comments are not touched.
    async fn delete_post(&self, id: Uuid) -> Result<bool>;

    async fn post_files(&self, post_id: Uuid) -> Result<Vec<PostFile>>;

    async fn find_post_file(&self, post_id: Uuid, file_id: Uuid) -> Result<Option<PostFile>>;

    async fn delete_post_file(&self, post_id: Uuid, file_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment>;

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>>;

    /// Comments of `post_id` without a parent, oldest first
    async fn top_level_comments(&self, post_id: Uuid) -> Result<Vec<Comment>>;

    /// Comments whose parent is `parent_id`, oldest first
    async fn replies(&self, parent_id: Uuid) -> Result<Vec<Comment>>;

    /// Number of top-level comments on a post
    async fn count_comments(&self, post_id: Uuid) -> Result<i64>;

    /// Delete one comment (and its likes); `false` if it was already gone
    async fn delete_comment(&self, id: Uuid) -> Result<bool>;

    /// Delete every comment whose parent is `parent_id`
    async fn delete_replies(&self, parent_id: Uuid) -> Result<u64>;

    /// Delete every comment of a post, replies included
    async fn delete_comments_by_post(&self, post_id: Uuid) -> Result<u64>;
}

#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Add the user's like if absent, remove it otherwise.
    /// Returns whether the user now likes the target and the new count.
    async fn toggle_like(&self, target: LikeTarget, user_id: Uuid) -> Result<(bool, i64)>;

    async fn like_count(&self, target: LikeTarget) -> Result<i64>;

    /// Users who like the target, in the order they liked it
    async fn likers(&self, target: LikeTarget) -> Result<Vec<Uuid>>;
}

/// Everything the service needs from storage
#[async_trait]
pub trait ForumStore: UserStore + PostStore + CommentStore + LikeStore {
    /// Cheap reachability check for the health endpoint
    async fn ping(&self) -> Result<()>;
}
