//! Prometheus metrics for forum-service.
//!
//! Counters for comment-tree activity and an HTTP handler for `/metrics`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Comments created, labeled by how they were linked (top_level, reply, dangling).
    pub static ref COMMENTS_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "forum_comments_created_total",
        "Comments created segmented by linkage",
        &["linkage"]
    )
    .expect("failed to register forum_comments_created_total");

    /// Comments removed, labeled by how they were removed (direct, reply_cascade, post_cascade).
    pub static ref COMMENTS_DELETED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "forum_comments_deleted_total",
        "Comments deleted segmented by removal path",
        &["kind"]
    )
    .expect("failed to register forum_comments_deleted_total");

    /// Post deletions by outcome.
    pub static ref POSTS_DELETED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "forum_posts_deleted_total",
        "Post deletions segmented by outcome",
        &["result"]
    )
    .expect("failed to register forum_posts_deleted_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
