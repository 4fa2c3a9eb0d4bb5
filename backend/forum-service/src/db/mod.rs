/// Database access layer
///
/// Free functions over a `PgPool`, one module per table group. The
/// PostgreSQL store composes these into the store traits.
pub mod comment_repo;
pub mod file_repo;
pub mod like_repo;
pub mod post_repo;
pub mod user_repo;
