/// Auth handlers - registration, login and the caller's profile
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::Result;
use crate::middleware::UserId;
use crate::services::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 20, message = "username must be 3-20 characters"))]
    pub username: String,
    #[validate(contains(pattern = "@", message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 20, message = "username must be 3-20 characters"))]
    pub username: Option<String>,
    #[validate(length(max = 500, message = "bio must be at most 500 characters"))]
    pub bio: Option<String>,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.store.clone(), state.jwt.clone())
}

/// Register a new account
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let mut req = req.into_inner();
    req.username = req.username.trim().to_string();
    req.email = req.email.trim().to_string();
    req.validate()?;

    let session = auth_service(&state)
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Registration successful",
        "token": session.token,
        "expires_in": session.expires_in,
        "user": session.user,
    })))
}

/// Log in with email and password
pub async fn login(state: web::Data<AppState>, req: web::Json<LoginRequest>) -> Result<HttpResponse> {
    req.validate()?;

    let session = auth_service(&state).login(&req.email, &req.password).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Login successful",
        "token": session.token,
        "expires_in": session.expires_in,
        "user": session.user,
    })))
}

/// Profile of the authenticated user
pub async fn me(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let user = auth_service(&state).current_user(user_id.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

/// Change the authenticated user's username or bio
pub async fn update_profile(
    state: web::Data<AppState>,
    user_id: UserId,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let mut req = req.into_inner();
    req.username = req
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    req.validate()?;

    let user = auth_service(&state)
        .update_profile(user_id.0, req.username, req.bio)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile updated",
        "user": user,
    })))
}
