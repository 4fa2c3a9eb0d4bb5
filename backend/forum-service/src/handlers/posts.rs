/// Post handlers - HTTP endpoints for post operations
use actix_multipart::{Field, Multipart};
use actix_web::http::header::{self, ContentDisposition};
use actix_web::{web, HttpResponse};
use futures_util::stream::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::config::UploadConfig;
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::post::parse_tags;
use crate::models::{Category, NewPost, NewPostFile, PostChanges, PostFilter};
use crate::services::files::{is_allowed_mime, remove_stored_file, save_upload};
use crate::services::posts::PageRequest;
use crate::services::PostService;
use crate::state::AppState;

/// Upper bound for a non-file multipart field (title, content, ...)
const MAX_TEXT_FIELD_BYTES: usize = 256 * 1024;

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub tag: Option<String>,
}

/// Text part of the post creation form
#[derive(Debug, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200, message = "title is required (max 200 characters)"))]
    pub title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    pub category: Option<String>,
    pub tags: Option<String>,
}

/// Tags arrive either as a list or as a comma-separated string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl TagsInput {
    fn into_tags(self) -> Vec<String> {
        match self {
            TagsInput::List(list) => list
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            TagsInput::Csv(raw) => parse_tags(&raw),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(max = 200, message = "title must be at most 200 characters"))]
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<TagsInput>,
}

/// Trimmed, non-empty value or `None`
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_category(raw: Option<String>) -> Result<Option<Category>> {
    match non_blank(raw) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(AppError::Validation),
    }
}

fn post_service(state: &AppState) -> PostService {
    PostService::new(state.store.clone())
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| AppError::BadRequest(format!("Error reading upload: {}", e)))?;
        if buf.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "Field exceeds the {} byte limit",
                limit
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Read the multipart form, saving accepted files as they arrive.
///
/// Files saved before an error stay in `files` so the caller can remove them.
async fn read_post_form(
    payload: &mut Multipart,
    uploads: &UploadConfig,
    files: &mut Vec<NewPostFile>,
) -> Result<HashMap<String, String>> {
    let mut text = HashMap::new();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;

        let disposition = field
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| ContentDisposition::from_raw(value).ok());
        let Some(disposition) = disposition else {
            read_field(&mut field, MAX_TEXT_FIELD_BYTES).await?;
            continue;
        };
        let name = disposition.get_name().unwrap_or_default().to_string();

        match disposition.get_filename().map(str::to_string) {
            // Empty file inputs are sent with an empty filename
            Some(original_name) if original_name.is_empty() => {
                read_field(&mut field, uploads.max_file_bytes).await?;
            }
            Some(original_name) if name == "files" => {
                if files.len() >= uploads.max_files {
                    return Err(AppError::BadRequest(format!(
                        "At most {} files can be uploaded",
                        uploads.max_files
                    )));
                }

                let mimetype = field
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("application/octet-stream")
                    .to_string();
                if !is_allowed_mime(&mimetype) {
                    return Err(AppError::BadRequest(format!(
                        "Unsupported file type: {}",
                        mimetype
                    )));
                }

                let bytes = read_field(&mut field, uploads.max_file_bytes).await?;
                files.push(save_upload(uploads, &original_name, &mimetype, &bytes).await?);
            }
            Some(_) => {
                return Err(AppError::BadRequest(format!(
                    "Unexpected file field '{}'",
                    name
                )));
            }
            None => {
                let bytes = read_field(&mut field, MAX_TEXT_FIELD_BYTES).await?;
                let value = String::from_utf8(bytes)
                    .map_err(|_| AppError::BadRequest(format!("Field '{}' is not UTF-8", name)))?;
                text.insert(name, value);
            }
        }
    }

    Ok(text)
}

/// Turn the form into a validated post; `Err` leaves cleanup to the caller
fn build_new_post(author_id: Uuid, mut text: HashMap<String, String>) -> Result<NewPost> {
    let req = CreatePostRequest {
        title: text.remove("title").unwrap_or_default().trim().to_string(),
        content: text.remove("content").unwrap_or_default().trim().to_string(),
        category: text.remove("category"),
        tags: text.remove("tags"),
    };
    req.validate()?;

    Ok(NewPost {
        author_id,
        title: req.title,
        content: req.content,
        category: parse_category(req.category)?.unwrap_or_default(),
        tags: req.tags.as_deref().map(parse_tags).unwrap_or_default(),
    })
}

/// Create a post from a multipart form with optional attachments
pub async fn create_post(
    state: web::Data<AppState>,
    user_id: UserId,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let mut files = Vec::new();

    let post = match read_post_form(&mut payload, &state.uploads, &mut files)
        .await
        .and_then(|text| build_new_post(user_id.0, text))
    {
        Ok(post) => post,
        Err(e) => {
            for file in &files {
                remove_stored_file(&file.path).await;
            }
            return Err(e);
        }
    };

    let paths: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
    let created = match post_service(&state).create_post(post, files).await {
        Ok(created) => created,
        Err(e) => {
            for path in &paths {
                remove_stored_file(path).await;
            }
            return Err(e);
        }
    };

    Ok(HttpResponse::Created().json(json!({
        "message": "Post created",
        "post": created,
    })))
}

/// List posts with pagination and filters
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let filter = PostFilter {
        category: parse_category(query.category)?,
        search: non_blank(query.search),
        tag: non_blank(query.tag),
        ..PostFilter::default()
    };
    let page = PageRequest {
        page: query.page,
        limit: query.limit,
    };

    let page = post_service(&state).list_posts(page, filter).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Get a single post with its thread
pub async fn get_post(state: web::Data<AppState>, post_id: web::Path<Uuid>) -> Result<HttpResponse> {
    let post = post_service(&state).get_post(*post_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "post": post })))
}

/// Update a post's text fields
pub async fn update_post(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    user_id: UserId,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let req = req.into_inner();
    let title = non_blank(req.title);
    let content = non_blank(req.content);
    let category = parse_category(req.category)?;
    let tags = req
        .tags
        .map(TagsInput::into_tags)
        .filter(|tags| !tags.is_empty());

    let changes = PostChanges {
        title,
        content,
        category,
        tags,
    };
    let post = post_service(&state)
        .update_post(*post_id, user_id.0, changes)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Post updated",
        "post": post,
    })))
}

/// Delete a post with its comments and attachments
pub async fn delete_post(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    user_id: UserId,
) -> Result<HttpResponse> {
    post_service(&state).delete_post(*post_id, user_id.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Post deleted" })))
}

/// Like or unlike a post
pub async fn toggle_like(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let like = post_service(&state).toggle_like(*post_id, user_id.0).await?;
    let message = if like.liked { "Liked" } else { "Like removed" };

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "liked": like.liked,
        "likes": like.likes,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_new_post_trims_and_defaults() {
        let author = Uuid::new_v4();
        let mut text = HashMap::new();
        text.insert("title".to_string(), "  Hello  ".to_string());
        text.insert("content".to_string(), "World".to_string());
        text.insert("tags".to_string(), "a, b,,".to_string());

        let post = build_new_post(author, text).unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.category, Category::Other);
        assert_eq!(post.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_build_new_post_rejects_blank_and_long_titles() {
        let mut blank = HashMap::new();
        blank.insert("title".to_string(), "   ".to_string());
        blank.insert("content".to_string(), "body".to_string());
        assert!(matches!(
            build_new_post(Uuid::new_v4(), blank),
            Err(AppError::Validation(_))
        ));

        let mut long = HashMap::new();
        long.insert("title".to_string(), "x".repeat(201));
        long.insert("content".to_string(), "body".to_string());
        assert!(build_new_post(Uuid::new_v4(), long).is_err());

        let mut bad_category = HashMap::new();
        bad_category.insert("title".to_string(), "t".to_string());
        bad_category.insert("content".to_string(), "body".to_string());
        bad_category.insert("category".to_string(), "gossip".to_string());
        assert!(matches!(
            build_new_post(Uuid::new_v4(), bad_category),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_tags_input_shapes() {
        let list: TagsInput = serde_json::from_str(r#"[" rust ", ""]"#).unwrap();
        assert_eq!(list.into_tags(), vec!["rust"]);
        let csv: TagsInput = serde_json::from_str(r#""a,b""#).unwrap();
        assert_eq!(csv.into_tags(), vec!["a", "b"]);
    }
}
