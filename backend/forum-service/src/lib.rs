/// Forum Service Library
///
/// REST backend for a small knowledge-sharing forum: accounts, posts with
/// file attachments, threaded comments (one reply level) and likes.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Users, posts, comments and attachments
/// - `services`: Business logic, including the comment tree manager
/// - `store`: Storage traits with PostgreSQL and in-memory implementations
/// - `db`: PostgreSQL repositories used by the PostgreSQL store
/// - `middleware`: JWT authentication and ownership checks
/// - `routes`: Route table
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus counters
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
