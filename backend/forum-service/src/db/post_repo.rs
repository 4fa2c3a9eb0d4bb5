use crate::db::file_repo;
use crate::models::post::PostRow;
use crate::models::{NewPost, NewPostFile, PostChanges, PostFilter};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const POST_COLUMNS: &str =
    "id, author_id, title, content, category, tags, views, created_at, updated_at";

/// Create a post and its attachment records in one transaction
pub async fn create_post(
    pool: &PgPool,
    id: Uuid,
    post: &NewPost,
    files: &[NewPostFile],
) -> Result<PostRow, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, PostRow>(&format!(
        r#"
        INSERT INTO posts (id, author_id, title, content, category, tags)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(post.author_id)
    .bind(&post.title)
    .bind(&post.content)
    .bind(post.category.as_str())
    .bind(&post.tags)
    .fetch_one(&mut *tx)
    .await?;

    for file in files {
        file_repo::create_file(&mut tx, id, file).await?;
    }

    tx.commit().await?;
    Ok(row)
}

pub async fn get_post_by_id(pool: &PgPool, id: Uuid) -> Result<Option<PostRow>, sqlx::Error> {
    sqlx::query_as::<_, PostRow>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Escape LIKE metacharacters so user input matches literally
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    qb.push(" WHERE TRUE");

    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(tag) = &filter.tag {
        qb.push(" AND ").push_bind(tag.clone()).push(" = ANY(tags)");
    }
}

/// One page of matching posts, newest first
pub async fn list_posts(pool: &PgPool, filter: &PostFilter) -> Result<Vec<PostRow>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts"));
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    qb.build_query_as::<PostRow>().fetch_all(pool).await
}

pub async fn count_posts(pool: &PgPool, filter: &PostFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
    push_filters(&mut qb, filter);

    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Apply non-null changes and refresh `updated_at`
pub async fn update_post(
    pool: &PgPool,
    id: Uuid,
    changes: &PostChanges,
) -> Result<Option<PostRow>, sqlx::Error> {
    sqlx::query_as::<_, PostRow>(&format!(
        r#"
        UPDATE posts
        SET title = COALESCE($2, title),
            content = COALESCE($3, content),
            category = COALESCE($4, category),
            tags = COALESCE($5, tags),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.title.as_deref())
    .bind(changes.content.as_deref())
    .bind(changes.category.map(|c| c.as_str()))
    .bind(changes.tags.clone())
    .fetch_optional(pool)
    .await
}

pub async fn increment_views(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE posts SET views = views + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a post; attachment records and likes cascade
pub async fn delete_post(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
