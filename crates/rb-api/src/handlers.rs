//! # rb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use rb_core::error::AppError;
use rb_core::models::{Credentials, NewPost, PostId, ReviewSubmission, SessionStatus, UserId};
use rb_core::traits::{AuthProvider, ReviewRepo};
use rb_core::validator;
use serde_json::json;

use crate::error::ApiError;

pub const AUTH_COOKIE: &str = "authCookie";

/// State shared across all Actix-web workers.
pub struct AppState {
    pub repo: Box<dyn ReviewRepo>,
    pub auth: Box<dyn AuthProvider>,
    pub cookie_secure: bool,
}

impl AppState {
    fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(AUTH_COOKIE, token)
            .path("/")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(self.auth.session_ttl_secs()))
            .finish()
    }

    /// Resolves the caller from the session cookie.
    fn caller(&self, req: &HttpRequest) -> Result<UserId, ApiError> {
        let cookie = req.cookie(AUTH_COOKIE).ok_or_else(|| {
            AppError::Unauthorized("Authentication required. Token is missing".to_string())
        })?;
        Ok(self.auth.verify_token(cookie.value())?)
    }
}

/// `GET /user/status`. An absent or invalid cookie is simply anonymous.
pub async fn session_status(data: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let status = match data.caller(&req) {
        Ok(user) => SessionStatus::authenticated(user),
        Err(_) => SessionStatus::anonymous(),
    };
    HttpResponse::Ok().json(status)
}

pub async fn register(
    data: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let credentials = body.into_inner();
    let username = credentials.username.trim();
    if username.is_empty() || credentials.password.is_empty() {
        return Err(AppError::ValidationError("Missing username or password".to_string()).into());
    }

    let hash = data.auth.hash_password(&credentials.password).await?;
    let account = data.repo.create_user(username, &hash).await?;
    let token = data.auth.issue_token(&account.id)?;
    tracing::info!(user = %account.id, "user registered");

    Ok(HttpResponse::Created()
        .cookie(data.session_cookie(token))
        .json(json!({ "message": "User registered successfully", "userId": account.id })))
}

pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let credentials = body.into_inner();
    let invalid = || ApiError(AppError::Unauthorized("Invalid credentials".to_string()));

    let account = data
        .repo
        .find_user_by_name(credentials.username.trim())
        .await?
        .ok_or_else(invalid)?;
    if !data.auth.verify_password(&credentials.password, &account.password_hash).await {
        return Err(invalid());
    }

    let token = data.auth.issue_token(&account.id)?;
    tracing::info!(user = %account.id, "user logged in");
    Ok(HttpResponse::Ok()
        .cookie(data.session_cookie(token))
        .json(json!({ "message": "Login successful" })))
}

pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(AUTH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    HttpResponse::Ok()
        .cookie(cookie)
        .json(json!({ "message": "Logout successful" }))
}

pub async fn list_posts(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let posts = data.repo.list_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn create_post(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<NewPost>,
) -> Result<HttpResponse, ApiError> {
    let author = data.caller(&req)?;
    let mut post = body.into_inner();
    post.title = post.title.trim().to_string();
    if post.title.is_empty() {
        return Err(AppError::ValidationError("Title is required".to_string()).into());
    }

    let post_id = data.repo.create_post(&author, post).await?;
    tracing::info!(post_id, user = %author, "post created");
    Ok(HttpResponse::Created()
        .json(json!({ "message": "Post created successfully", "postId": post_id })))
}

/// `PUT /posts/review/{id}`: creates or updates the caller's review and
/// answers with the post's full aggregate.
pub async fn put_review(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<PostId>,
    body: web::Json<ReviewSubmission>,
) -> Result<HttpResponse, ApiError> {
    let user = data.caller(&req)?;
    let post_id = path.into_inner();
    let submission = body.into_inner();

    let rating = validator::validate(Some(submission.rating))
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    let content = submission.content.trim();

    let aggregate = data.repo.upsert_review(post_id, &user, rating, content).await?;
    tracing::info!(post_id, user = %user, count = aggregate.count, "review saved");
    Ok(HttpResponse::Ok().json(aggregate))
}
