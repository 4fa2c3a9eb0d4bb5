/// Comment handlers - HTTP endpoints for comment operations
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::services::{CommentTree, PostService};
use crate::state::AppState;
use crate::store::PostStore;

/// Request body for creating a comment
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 1000, message = "comment must be 1-1000 characters"))]
    pub content: String,
    pub post_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
}

fn comment_tree(state: &AppState) -> CommentTree {
    CommentTree::new(state.store.clone())
}

/// Create a comment or a reply
pub async fn create_comment(
    state: web::Data<AppState>,
    user_id: UserId,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let mut req = req.into_inner();
    req.content = req.content.trim().to_string();
    req.validate()?;

    let comment = comment_tree(&state)
        .create_comment(user_id.0, req.post_id, &req.content, req.parent_comment_id)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Comment created",
        "comment": comment,
    })))
}

/// Thread of a post: top-level comments with their replies
pub async fn get_post_comments(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    if state.store.find_post(*post_id).await?.is_none() {
        return Err(AppError::NotFound("Post not found".into()));
    }

    let comments = comment_tree(&state).thread(*post_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "comments": comments })))
}

/// Delete a comment and its replies
pub async fn delete_comment(
    state: web::Data<AppState>,
    comment_id: web::Path<Uuid>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let outcome = comment_tree(&state)
        .delete_comment(*comment_id, user_id.0)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Comment deleted",
        "replies_removed": outcome.replies_removed,
    })))
}

/// Like or unlike a comment
pub async fn toggle_like(
    state: web::Data<AppState>,
    comment_id: web::Path<Uuid>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let like = PostService::new(state.store.clone())
        .toggle_comment_like(*comment_id, user_id.0)
        .await?;
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
    fn test_comment_length_limits() {
        let request = |content: String| CreateCommentRequest {
            content,
            post_id: Uuid::new_v4(),
            parent_comment_id: None,
        };

        assert!(request("hello".into()).validate().is_ok());
        assert!(request(String::new()).validate().is_err());
        assert!(request("字".repeat(1000)).validate().is_ok());
        assert!(request("x".repeat(1001)).validate().is_err());
    }
}
