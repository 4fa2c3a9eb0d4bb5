/// Shared application state handed to handlers through `web::Data`
use crypto_core::jwt::JwtKeys;
use std::sync::Arc;

use crate::config::UploadConfig;
use crate::store::ForumStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ForumStore>,
    pub jwt: JwtKeys,
    pub uploads: UploadConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn ForumStore>, jwt: JwtKeys, uploads: UploadConfig) -> Self {
        Self { store, jwt, uploads }
    }
}
