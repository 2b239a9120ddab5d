//! # rb-http-client
//!
//! reqwest implementation of the client ports (`SessionGate`,
//! `ReviewBackend`) plus the account and post-creation pass-through calls.
//! The session lives in the client's cookie store.

use async_trait::async_trait;
use rb_core::error::RemoteError;
use rb_core::models::{
    Credentials, NewPost, Post, PostId, ReviewAggregate, ReviewSubmission, SessionStatus,
};
use rb_core::traits::{ReviewBackend, SessionGate};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Error bodies come as `{"error": ...}` or `{"message": ...}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreated {
    pub message: String,
    pub post_id: PostId,
}

#[derive(Debug, Deserialize)]
pub struct Acknowledged {
    pub message: String,
}

pub struct HttpClient {
    base_url: String,
    http: Client,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let parsed =
            Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        let http = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Acknowledged, RemoteError> {
        self.post_json("/user/login", credentials).await
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<Registered, RemoteError> {
        self.post_json("/user/register", credentials).await
    }

    pub async fn logout(&self) -> Result<Acknowledged, RemoteError> {
        self.post_json("/user/logout", &serde_json::json!({})).await
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<PostCreated, RemoteError> {
        self.post_json("/posts/create", post).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let response = self.http.post(&url).json(body).send().await.map_err(transport)?;
        read_json(response).await
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Transport(e.to_string())
}

/// Success bodies decode into `T`; anything else becomes `Rejected` with the
/// server's message when it sent one.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = body.error.or(body.message);
    tracing::debug!(status = status.as_u16(), ?message, "request rejected");
    Err(RemoteError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl SessionGate for HttpClient {
    async fn session_status(&self) -> Result<SessionStatus, RemoteError> {
        let response = self
            .http
            .get(self.url("/user/status"))
            .send()
            .await
            .map_err(transport)?;
        // An expired session may come back as 401; that is just "anonymous".
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(SessionStatus::anonymous());
        }
        read_json(response).await
    }
}

#[async_trait]
impl ReviewBackend for HttpClient {
    async fn fetch_posts(&self) -> Result<Vec<Post>, RemoteError> {
        let response = self
            .http
            .get(self.url("/posts/all"))
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn put_review(
        &self,
        post_id: PostId,
        review: &ReviewSubmission,
    ) -> Result<ReviewAggregate, RemoteError> {
        let response = self
            .http
            .put(self.url(&format!("/posts/review/{}", post_id)))
            .json(review)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }
}
