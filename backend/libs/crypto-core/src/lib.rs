//! Token and password primitives shared by the forum backend.
//!
//! - `jwt`: HS256 token issuance and validation with explicitly constructed keys
//! - `password`: Argon2id password hashing

pub mod jwt;
pub mod password;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("malformed subject claim: {0}")]
    Subject(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
