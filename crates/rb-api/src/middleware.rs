//! rusty-reviews/crates/rb-api/src/middleware.rs Middleware
//!
//! Request logging and cross-origin policy.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;

// Access log in the default format:
// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

// The browser front end lives on its own origin and sends the session cookie,
// so the origin must be explicit (credentials forbid a wildcard).
pub fn cors_policy(origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(origin)
        .allowed_methods(vec!["GET", "POST", "PUT"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    #[actix_web::test]
    async fn allowed_origin_gets_credentials_header() {
        let app = test::init_service(
            App::new()
                .wrap(cors_policy("http://localhost:3000"))
                .route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/ping")
            .insert_header((header::ORIGIN, "http://localhost:3000"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }
}
