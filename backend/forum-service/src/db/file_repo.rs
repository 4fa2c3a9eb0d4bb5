use crate::models::{NewPostFile, PostFile};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Record an attachment inside the post-creation transaction
pub async fn create_file(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    file: &NewPostFile,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO post_files (id, post_id, filename, original_name, mimetype, size, path)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(post_id)
    .bind(&file.filename)
    .bind(&file.original_name)
    .bind(&file.mimetype)
    .bind(file.size)
    .bind(&file.path)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn get_files_by_post(pool: &PgPool, post_id: Uuid) -> Result<Vec<PostFile>, sqlx::Error> {
    sqlx::query_as::<_, PostFile>(
        r#"
        SELECT id, post_id, filename, original_name, mimetype, size, path, upload_date
        FROM post_files
        WHERE post_id = $1
        ORDER BY upload_date ASC, id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}

pub async fn get_file(
    pool: &PgPool,
    post_id: Uuid,
    file_id: Uuid,
) -> Result<Option<PostFile>, sqlx::Error> {
    sqlx::query_as::<_, PostFile>(
        r#"
        SELECT id, post_id, filename, original_name, mimetype, size, path, upload_date
        FROM post_files
        WHERE id = $1 AND post_id = $2
        "#,
    )
    .bind(file_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_file(pool: &PgPool, post_id: Uuid, file_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM post_files WHERE id = $1 AND post_id = $2")
        .bind(file_id)
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
