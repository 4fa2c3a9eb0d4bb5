use crate::models::{AuthorSummary, User};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password_hash, avatar, bio, created_at";

/// Insert a new account
pub async fn create_user(
    pool: &PgPool,
    id: Uuid,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, username, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Update username and/or bio; NULL arguments keep the stored value
pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    username: Option<&str>,
    bio: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET username = COALESCE($2, username),
            bio = COALESCE($3, bio)
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(username)
    .bind(bio)
    .fetch_optional(pool)
    .await
}

/// Display summaries for a set of authors
pub async fn find_authors(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<Vec<AuthorSummary>, sqlx::Error> {
    sqlx::query_as::<_, AuthorSummary>(
        "SELECT id, username, avatar FROM users WHERE id = ANY($1)",
    )
    .bind(ids.to_vec())
    .fetch_all(pool)
    .await
}
