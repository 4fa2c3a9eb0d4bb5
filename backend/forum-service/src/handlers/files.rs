/// File handlers - attachment download and removal
use actix_web::http::header::{
    Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::UserId;
use crate::services::FileService;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct FilePath {
    pub post_id: Uuid,
    pub file_id: Uuid,
}

/// `attachment` disposition with an ASCII fallback name plus the UTF-8 original
fn attachment_disposition(original_name: &str) -> ContentDisposition {
    let fallback: String = original_name
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();

    let mut parameters = vec![DispositionParam::Filename(fallback)];
    if !original_name.is_ascii() {
        parameters.push(DispositionParam::FilenameExt(ExtendedValue {
            charset: Charset::Ext("UTF-8".to_string()),
            language_tag: None,
            value: original_name.as_bytes().to_vec(),
        }));
    }

    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters,
    }
}

/// Send an attachment back under its original name
pub async fn download_file(
    state: web::Data<AppState>,
    path: web::Path<FilePath>,
) -> Result<HttpResponse> {
    let (file, bytes) = FileService::new(state.store.clone())
        .download(path.post_id, path.file_id)
        .await?;

    let disposition = attachment_disposition(&file.original_name);
    let content_type: mime::Mime = file
        .mimetype
        .parse()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(disposition)
        .body(bytes))
}

/// Remove one attachment from a post
pub async fn delete_file(
    state: web::Data<AppState>,
    path: web::Path<FilePath>,
    user_id: UserId,
) -> Result<HttpResponse> {
    FileService::new(state.store.clone())
        .delete_file(path.post_id, path.file_id, user_id.0)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "File deleted" })))
}
