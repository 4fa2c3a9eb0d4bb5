/// HTTP request handlers
pub mod auth;
pub mod comments;
pub mod files;
pub mod health;
pub mod posts;
