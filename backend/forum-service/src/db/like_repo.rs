use crate::store::LikeTarget;
use sqlx::PgPool;
use uuid::Uuid;

/// Table and key column holding likes for a target kind
fn like_table(target: LikeTarget) -> (&'static str, &'static str, Uuid) {
    match target {
        LikeTarget::Post(id) => ("post_likes", "post_id", id),
        LikeTarget::Comment(id) => ("comment_likes", "comment_id", id),
    }
}

/// Remove a like; returns whether one existed
pub async fn delete_like(
    pool: &PgPool,
    target: LikeTarget,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let (table, column, id) = like_table(target);
    let result = sqlx::query(&format!(
        "DELETE FROM {table} WHERE {column} = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Record a like; a concurrent duplicate is ignored
pub async fn create_like(
    pool: &PgPool,
    target: LikeTarget,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    let (table, column, id) = like_table(target);
    sqlx::query(&format!(
        "INSERT INTO {table} ({column}, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
    ))
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn count_likes(pool: &PgPool, target: LikeTarget) -> Result<i64, sqlx::Error> {
    let (table, column, id) = like_table(target);
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table} WHERE {column} = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Get all users who liked a target, earliest first
pub async fn get_likers(pool: &PgPool, target: LikeTarget) -> Result<Vec<Uuid>, sqlx::Error> {
    let (table, column, id) = like_table(target);
    sqlx::query_scalar::<_, Uuid>(&format!(
        "SELECT user_id FROM {table} WHERE {column} = $1 ORDER BY created_at ASC"
    ))
    .bind(id)
    .fetch_all(pool)
    .await
}
