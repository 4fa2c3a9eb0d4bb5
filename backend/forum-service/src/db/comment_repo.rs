use crate::models::Comment;
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new comment on a post
pub async fn create_comment(
    pool: &PgPool,
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    content: &str,
    parent_comment_id: Option<Uuid>,
) -> Result<Comment, sqlx::Error> {
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (id, post_id, author_id, content, parent_comment_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, post_id, author_id, content, parent_comment_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(post_id)
    .bind(author_id)
    .bind(content)
    .bind(parent_comment_id)
    .fetch_one(pool)
    .await?;

    Ok(comment)
}

/// Get a single comment by ID
pub async fn get_comment_by_id(
    pool: &PgPool,
    comment_id: Uuid,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, post_id, author_id, content, parent_comment_id, created_at, updated_at
        FROM comments
        WHERE id = $1
        "#,
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// Top-level comments of a post, oldest first
pub async fn get_top_level_comments(
    pool: &PgPool,
    post_id: Uuid,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, post_id, author_id, content, parent_comment_id, created_at, updated_at
        FROM comments
        WHERE post_id = $1 AND parent_comment_id IS NULL
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}

/// Get replies to a comment, oldest first
pub async fn get_comment_replies(
    pool: &PgPool,
    parent_comment_id: Uuid,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, post_id, author_id, content, parent_comment_id, created_at, updated_at
        FROM comments
        WHERE parent_comment_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(parent_comment_id)
    .fetch_all(pool)
    .await
}

/// Count top-level comments for a post
pub async fn count_comments_by_post(pool: &PgPool, post_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM comments WHERE post_id = $1 AND parent_comment_id IS NULL",
    )
    .bind(post_id)
    .fetch_one(pool)
    .await
}

/// Delete one comment; its likes go with it through the foreign key
pub async fn delete_comment(pool: &PgPool, comment_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_replies(pool: &PgPool, parent_comment_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE parent_comment_id = $1")
        .bind(parent_comment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Delete every comment of a post, regardless of nesting
pub async fn delete_comments_by_post(pool: &PgPool, post_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE post_id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
