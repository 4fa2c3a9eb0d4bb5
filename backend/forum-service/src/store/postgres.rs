/// PostgreSQL store built on the `db` repositories
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CommentStore, ForumStore, LikeStore, LikeTarget, PostStore, UserStore};
use crate::db::{comment_repo, file_repo, like_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::{
    AuthorSummary, Comment, NewComment, NewPost, NewPostFile, NewUser, Post, PostChanges,
    PostFile, PostFilter, ProfileChanges, User,
};

const UNIQUE_VIOLATION: &str = "23505";

/// Translate unique-constraint violations on `users` into `Conflict`
fn map_user_conflict(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let message = match db_err.constraint() {
                Some(c) if c.contains("email") => "email already registered",
                _ => "username already taken",
            };
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::from(err)
}

#[derive(Clone)]
pub struct PgForumStore {
    pool: PgPool,
}

impl PgForumStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgForumStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        user_repo::create_user(
            &self.pool,
            Uuid::new_v4(),
            &user.username,
            &user.email,
            &user.password_hash,
        )
        .await
        .map_err(map_user_conflict)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(user_repo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(user_repo::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(user_repo::find_by_username(&self.pool, username).await?)
    }

    async fn update_user_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>> {
        user_repo::update_profile(
            &self.pool,
            id,
            changes.username.as_deref(),
            changes.bio.as_deref(),
        )
        .await
        .map_err(map_user_conflict)
    }

    async fn find_authors(&self, ids: &[Uuid]) -> Result<Vec<AuthorSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(user_repo::find_authors(&self.pool, ids).await?)
    }
}

#[async_trait]
impl PostStore for PgForumStore {
    async fn insert_post(&self, post: NewPost, files: Vec<NewPostFile>) -> Result<Post> {
        let row = post_repo::create_post(&self.pool, Uuid::new_v4(), &post, &files).await?;
        Ok(row.into())
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(post_repo::get_post_by_id(&self.pool, id)
            .await?
            .map(Post::from))
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<(Vec<Post>, i64)> {
        let total = post_repo::count_posts(&self.pool, filter).await?;
        let rows = post_repo::list_posts(&self.pool, filter).await?;
        Ok((rows.into_iter().map(Post::from).collect(), total))
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        Ok(post_repo::update_post(&self.pool, id, &changes)
            .await?
            .map(Post::from))
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        Ok(post_repo::increment_views(&self.pool, id).await?)
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        Ok(post_repo::delete_post(&self.pool, id).await? > 0)
    }

    async fn post_files(&self, post_id: Uuid) -> Result<Vec<PostFile>> {
        Ok(file_repo::get_files_by_post(&self.pool, post_id).await?)
    }

    async fn find_post_file(&self, post_id: Uuid, file_id: Uuid) -> Result<Option<PostFile>> {
        Ok(file_repo::get_file(&self.pool, post_id, file_id).await?)
    }

    async fn delete_post_file(&self, post_id: Uuid, file_id: Uuid) -> Result<bool> {
        Ok(file_repo::delete_file(&self.pool, post_id, file_id).await? > 0)
    }
}

#[async_trait]
impl CommentStore for PgForumStore {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment> {
        Ok(comment_repo::create_comment(
            &self.pool,
            Uuid::new_v4(),
            comment.post_id,
            comment.author_id,
            &comment.content,
            comment.parent_comment_id,
        )
        .await?)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(comment_repo::get_comment_by_id(&self.pool, id).await?)
    }

    async fn top_level_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        Ok(comment_repo::get_top_level_comments(&self.pool, post_id).await?)
    }

    async fn replies(&self, parent_id: Uuid) -> Result<Vec<Comment>> {
        Ok(comment_repo::get_comment_replies(&self.pool, parent_id).await?)
    }

    async fn count_comments(&self, post_id: Uuid) -> Result<i64> {
        Ok(comment_repo::count_comments_by_post(&self.pool, post_id).await?)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        Ok(comment_repo::delete_comment(&self.pool, id).await? > 0)
    }

    async fn delete_replies(&self, parent_id: Uuid) -> Result<u64> {
        Ok(comment_repo::delete_replies(&self.pool, parent_id).await?)
    }

    async fn delete_comments_by_post(&self, post_id: Uuid) -> Result<u64> {
        Ok(comment_repo::delete_comments_by_post(&self.pool, post_id).await?)
    }
}

#[async_trait]
impl LikeStore for PgForumStore {
    async fn toggle_like(&self, target: LikeTarget, user_id: Uuid) -> Result<(bool, i64)> {
        let removed = like_repo::delete_like(&self.pool, target, user_id).await?;
        if !removed {
            like_repo::create_like(&self.pool, target, user_id).await?;
        }
        let count = like_repo::count_likes(&self.pool, target).await?;
        Ok((!removed, count))
    }

    async fn like_count(&self, target: LikeTarget) -> Result<i64> {
        Ok(like_repo::count_likes(&self.pool, target).await?)
    }

    async fn likers(&self, target: LikeTarget) -> Result<Vec<Uuid>> {
        Ok(like_repo::get_likers(&self.pool, target).await?)
    }
}

#[async_trait]
impl ForumStore for PgForumStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
