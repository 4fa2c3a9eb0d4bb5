use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::state::AppState;
use crate::store::ForumStore;

/// Liveness plus a store round-trip
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "service": "forum-service",
            "store": "ok",
        })),
        Err(e) => {
            tracing::warn!(error = %e, "health check store ping failed");
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "degraded",
                "service": "forum-service",
                "store": "unavailable",
            }))
        }
    }
}

/// JSON body for unmatched routes
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "error": "Not found: route does not exist",
        "status": 404,
    }))
}
