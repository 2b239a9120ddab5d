//! # rb-api
//!
//! The web routing and orchestration layer for Rusty-Reviews.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;
use rb_core::error::AppError;

pub use error::ApiError;
pub use handlers::AppState;

/// Configures the account and post routes.
///
/// Undecodable JSON bodies answer 400 with the same `{"error": ...}` body
/// as every other failure.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError(AppError::ValidationError(err.to_string())).into()
    }))
    .service(
        web::scope("/user")
            .route("/status", web::get().to(handlers::session_status))
            .route("/register", web::post().to(handlers::register))
            .route("/login", web::post().to(handlers::login))
            .route("/logout", web::post().to(handlers::logout)),
    )
    .service(
        web::scope("/posts")
            .route("/all", web::get().to(handlers::list_posts))
            .route("/create", web::post().to(handlers::create_post))
            .route("/review/{post_id}", web::put().to(handlers::put_review)),
    );
}
