/// Route table shared by the server binary and the HTTP tests
use actix_web::{error, web, HttpRequest};

use crate::error::AppError;
use crate::handlers::{auth, comments, files, health, posts};
use crate::metrics::serve_metrics;
use crate::middleware::JwtAuthMiddleware;

/// Report extractor failures with the JSON error body used everywhere else
fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Register every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .route("/health", web::get().to(health::health))
        .route("/metrics", web::get().to(serve_metrics))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login))
                        .service(
                            web::resource("/me")
                                .wrap(JwtAuthMiddleware::new())
                                .route(web::get().to(auth::me)),
                        )
                        .service(
                            web::resource("/profile")
                                .wrap(JwtAuthMiddleware::new())
                                .route(web::put().to(auth::update_profile)),
                        ),
                )
                .service(
                    web::scope("/posts")
                        .wrap(JwtAuthMiddleware::new())
                        .service(
                            web::resource("")
                                .route(web::get().to(posts::list_posts))
                                .route(web::post().to(posts::create_post)),
                        )
                        .service(
                            web::resource("/{post_id}")
                                .route(web::get().to(posts::get_post))
                                .route(web::put().to(posts::update_post))
                                .route(web::delete().to(posts::delete_post)),
                        )
                        .route("/{post_id}/like", web::post().to(posts::toggle_like)),
                )
                .service(
                    web::scope("/comments")
                        .wrap(JwtAuthMiddleware::new())
                        .route("", web::post().to(comments::create_comment))
                        .route(
                            "/post/{post_id}",
                            web::get().to(comments::get_post_comments),
                        )
                        .route("/{comment_id}", web::delete().to(comments::delete_comment))
                        .route("/{comment_id}/like", web::post().to(comments::toggle_like)),
                )
                .service(
                    web::scope("/files")
                        .service(
                            web::resource("/download/{post_id}/{file_id}")
                                .wrap(JwtAuthMiddleware::with_query_token())
                                .route(web::get().to(files::download_file)),
                        )
                        .service(
                            web::resource("/{post_id}/{file_id}")
                                .wrap(JwtAuthMiddleware::new())
                                .route(web::delete().to(files::delete_file)),
                        ),
                ),
        );
}
