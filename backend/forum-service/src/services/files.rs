/// Attachment storage
///
/// Uploaded bytes are written to the configured upload directory under a
/// generated name; the store only keeps metadata. Removing a stored file is
/// best-effort: a file that is already gone counts as removed.
use chrono::Utc;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::error::{AppError, Result};
use crate::middleware::permissions::check_post_ownership;
use crate::models::{NewPostFile, PostFile};
use crate::store::{ForumStore, PostStore};

/// MIME types accepted as attachments
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "application/zip",
    "application/x-zip-compressed",
    "application/x-rar-compressed",
    "application/vnd.rar",
    "image/jpeg",
    "image/png",
    "image/gif",
];

pub fn is_allowed_mime(mimetype: &str) -> bool {
    let essence = mimetype.split(';').next().unwrap_or_default().trim();
    ALLOWED_MIME_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

/// Strip any directory components a client put in the filename
pub fn sanitize_original_name(raw: &str) -> String {
    let name = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();
    if name.is_empty() {
        "attachment".to_string()
    } else {
        name.to_string()
    }
}

/// `<unix-millis>-<random>.<ext>`, extension taken from the original name
pub fn stored_filename(original_name: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}-{}{}", Utc::now().timestamp_millis(), suffix, ext)
}

/// Write an accepted upload to disk and describe it for the store
pub async fn save_upload(
    uploads: &UploadConfig,
    original_name: &str,
    mimetype: &str,
    bytes: &[u8],
) -> Result<NewPostFile> {
    let original_name = sanitize_original_name(original_name);
    let filename = stored_filename(&original_name);
    let path: PathBuf = uploads.dir.join(&filename);

    tokio::fs::write(&path, bytes).await?;

    Ok(NewPostFile {
        filename,
        original_name,
        mimetype: mimetype.to_string(),
        size: bytes.len() as i64,
        path: path.to_string_lossy().into_owned(),
    })
}

/// Remove a stored file, ignoring files that are already gone
pub async fn remove_stored_file(path: &str) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path, error = %e, "failed to remove stored file"),
    }
}

pub struct FileService {
    store: Arc<dyn ForumStore>,
}

impl FileService {
    pub fn new(store: Arc<dyn ForumStore>) -> Self {
        Self { store }
    }

    async fn attachment(&self, post_id: Uuid, file_id: Uuid) -> Result<PostFile> {
        self.store
            .find_post_file(post_id, file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".into()))
    }

    /// Attachment metadata and its bytes
    pub async fn download(&self, post_id: Uuid, file_id: Uuid) -> Result<(PostFile, Vec<u8>)> {
        if self.store.find_post(post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".into()));
        }
        let file = self.attachment(post_id, file_id).await?;

        let bytes = match tokio::fs::read(&file.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(%post_id, %file_id, "attachment record has no file on disk");
                return Err(AppError::NotFound("File not found on server".into()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok((file, bytes))
    }

    /// Delete one attachment on behalf of the post's author
    pub async fn delete_file(&self, post_id: Uuid, file_id: Uuid, acting_user: Uuid) -> Result<()> {
        let post = self
            .store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".into()))?;
        check_post_ownership(acting_user, &post)?;

        let file = self.attachment(post_id, file_id).await?;
        remove_stored_file(&file.path).await;
        self.store.delete_post_file(post_id, file_id).await?;

        info!(%post_id, %file_id, "attachment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, NewPost, NewUser};
    use crate::store::{MemoryStore, UserStore};

    struct Fixture {
        store: Arc<MemoryStore>,
        service: FileService,
        author: Uuid,
        other: Uuid,
        post_id: Uuid,
        file: PostFile,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadConfig {
            dir: dir.path().to_path_buf(),
            ..UploadConfig::default()
        };
        let store = Arc::new(MemoryStore::new());

        let mut ids = Vec::new();
        for name in ["alice", "bob"] {
            let user = store
                .insert_user(NewUser {
                    username: name.into(),
                    email: format!("{}@example.com", name),
                    password_hash: "hash".into(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }

        let saved = save_upload(&uploads, "notes.txt", "text/plain", b"hello")
            .await
            .unwrap();
        let post = store
            .insert_post(
                NewPost {
                    author_id: ids[0],
                    title: "with file".into(),
                    content: "body".into(),
                    category: Category::Resource,
                    tags: vec![],
                },
                vec![saved],
            )
            .await
            .unwrap();
        let file = store.post_files(post.id).await.unwrap().remove(0);

        Fixture {
            service: FileService::new(store.clone()),
            store,
            author: ids[0],
            other: ids[1],
            post_id: post.id,
            file,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_download_not_found_cases() {
        let fx = fixture().await;

        let (file, bytes) = fx.service.download(fx.post_id, fx.file.id).await.unwrap();
        assert_eq!(file.original_name, "notes.txt");
        assert_eq!(bytes, b"hello");

        assert!(matches!(
            fx.service.download(Uuid::new_v4(), fx.file.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.download(fx.post_id, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));

        tokio::fs::remove_file(&fx.file.path).await.unwrap();
        assert!(matches!(
            fx.service.download(fx.post_id, fx.file.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_file_requires_post_author() {
        let fx = fixture().await;

        let err = fx
            .service
            .delete_file(fx.post_id, fx.file.id, fx.other)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(Path::new(&fx.file.path).exists());
        assert!(fx
            .store
            .find_post_file(fx.post_id, fx.file.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_delete_file_removes_disk_file_and_record() {
        let fx = fixture().await;

        fx.service
            .delete_file(fx.post_id, fx.file.id, fx.author)
            .await
            .unwrap();
        assert!(!Path::new(&fx.file.path).exists());
        assert!(fx.store.post_files(fx.post_id).await.unwrap().is_empty());

        assert!(matches!(
            fx.service.delete_file(fx.post_id, fx.file.id, fx.author).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            fx.service
                .delete_file(Uuid::new_v4(), fx.file.id, fx.author)
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_mime_allow_list() {
        assert!(is_allowed_mime("application/pdf"));
        assert!(is_allowed_mime("text/plain; charset=utf-8"));
        assert!(is_allowed_mime("IMAGE/PNG"));
        assert!(!is_allowed_mime("application/x-msdownload"));
        assert!(!is_allowed_mime("video/mp4"));
    }

    #[test]
    fn test_stored_filename_shape() {
        let name = stored_filename("Report.Final.PDF");
        let (millis, rest) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert!(rest.ends_with(".pdf"));

        assert!(!stored_filename("README").contains('.'));
    }

    #[test]
    fn test_sanitize_original_name() {
        assert_eq!(sanitize_original_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_original_name("C:\\docs\\notes.txt"), "notes.txt");
        assert_eq!(sanitize_original_name("  "), "attachment");
    }

    #[tokio::test]
    async fn test_save_and_remove_upload() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadConfig {
            dir: dir.path().to_path_buf(),
            ..UploadConfig::default()
        };

        let saved = save_upload(&uploads, "notes.txt", "text/plain", b"hello")
            .await
            .unwrap();
        assert_eq!(saved.size, 5);
        assert_eq!(saved.original_name, "notes.txt");
        assert_eq!(tokio::fs::read(&saved.path).await.unwrap(), b"hello");

        remove_stored_file(&saved.path).await;
        assert!(!Path::new(&saved.path).exists());
        // Second removal is a no-op.
        remove_stored_file(&saved.path).await;
    }
}
