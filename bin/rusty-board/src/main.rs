//! # Rusty-Board Binary
//!
//! The entry point that assembles the review service based on compile-time features.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use configs::ServerSettings;
use rb_api::middleware::{cors_policy, standard_middleware};
use rb_api::{configure_routes, AppState};
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

// Feature-gated imports: This is the "Compiled-to-Order" magic
#[cfg(feature = "db-sqlite")]
use rb_db_sqlite::SqliteReviewRepo;

#[cfg(feature = "auth-simple")]
use rb_auth_simple::SimpleAuthProvider;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = ServerSettings::load().context("loading server settings")?;

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteReviewRepo::new(&settings.database_url)
        .await
        .with_context(|| format!("opening {}", settings.database_url))?;

    // 2. Initialize Auth Implementation
    #[cfg(feature = "auth-simple")]
    let auth = SimpleAuthProvider::new(settings.jwt_secret.expose_secret(), settings.session_ttl_hours);

    // 3. Wrap in AppState (Using dynamic dispatch for maximum flexibility)
    let state = web::Data::new(AppState {
        repo: Box::new(repo),
        auth: Box::new(auth),
        cookie_secure: settings.cookie_secure,
    });

    tracing::info!(host = %settings.host, port = settings.port, "rusty-board starting");

    let cors_origin = settings.cors_origin.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(standard_middleware())
            .wrap(cors_policy(&cors_origin))
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind((settings.host.as_str(), settings.port))
    .with_context(|| format!("binding {}:{}", settings.host, settings.port))?
    .run()
    .await?;

    Ok(())
}
