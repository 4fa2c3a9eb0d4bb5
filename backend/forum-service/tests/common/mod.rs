//! Shared fixtures for forum-service integration tests

#![allow(dead_code)]

use crypto_core::jwt::JwtKeys;
use std::sync::Arc;
use tempfile::TempDir;

use forum_service::config::UploadConfig;
use forum_service::store::MemoryStore;
use forum_service::AppState;

pub const TEST_SECRET: &str = "forum-test-secret-with-at-least-32-bytes";

/// App state over an in-memory store with uploads in a temp directory
///
/// The returned `TempDir` must outlive the state.
pub fn memory_state() -> (AppState, Arc<MemoryStore>, TempDir) {
    let upload_dir = tempfile::tempdir().expect("create upload dir");
    let store = Arc::new(MemoryStore::new());
    let jwt = JwtKeys::from_secret(TEST_SECRET, 7).expect("jwt keys");
    let uploads = UploadConfig {
        dir: upload_dir.path().to_path_buf(),
        max_file_bytes: 1024 * 1024,
        max_files: 5,
    };

    let state = AppState::new(store.clone(), jwt, uploads);
    (state, store, upload_dir)
}

pub const BOUNDARY: &str = "forum-test-boundary-7f3a";

/// Minimal multipart/form-data encoder for building request bodies
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}
