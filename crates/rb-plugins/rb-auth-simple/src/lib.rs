//! # rb-auth-simple
//!
//! Argon2 + JWT implementation of `AuthProvider`.
//! Hashes account passwords and issues the HS256 session tokens carried in
//! the `authCookie` cookie.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rb_core::error::{AppError, Result};
use rb_core::models::UserId;
use rb_core::traits::AuthProvider;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: String,
    exp: i64,
}

pub struct SimpleAuthProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    session_ttl: Duration,
}

impl SimpleAuthProvider {
    /// Accepts the signing secret (e.g., from an environment variable) and
    /// how long a session stays valid.
    pub fn new(secret: &str, session_ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    async fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_token(&self, user: &UserId) -> Result<String> {
        let claims = Claims {
            user_id: user.to_string(),
            exp: (Utc::now() + self.session_ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {}", e)))
    }

    fn verify_token(&self, token: &str) -> Result<UserId> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
            tracing::debug!(error = %e, "rejected session token");
            AppError::Unauthorized("Authentication failed. Invalid token".to_string())
        })?;
        if data.claims.user_id.is_empty() {
            return Err(AppError::Unauthorized("Invalid token format".to_string()));
        }
        Ok(UserId::new(data.claims.user_id))
    }

    fn session_ttl_secs(&self) -> i64 {
        self.session_ttl.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn password_round_trip() {
        let auth = SimpleAuthProvider::new("secret", 6);
        let hash = auth.hash_password("hunter2").await.unwrap();
        assert!(auth.verify_password("hunter2", &hash).await);
        assert!(!auth.verify_password("hunter3", &hash).await);
        assert!(!auth.verify_password("hunter2", "not-a-hash").await);
    }

    #[test]
    fn token_resolves_to_its_user() {
        let auth = SimpleAuthProvider::new("secret", 6);
        let token = auth.issue_token(&UserId::new("42")).unwrap();
        assert_eq!(auth.verify_token(&token).unwrap(), UserId::new("42"));
        assert_eq!(auth.session_ttl_secs(), 6 * 3600);
    }

    #[test]
    fn foreign_and_expired_tokens_are_unauthorized() {
        let ours = SimpleAuthProvider::new("secret", 6);
        let theirs = SimpleAuthProvider::new("other-secret", 6);
        let forged = theirs.issue_token(&UserId::new("1")).unwrap();
        assert!(matches!(ours.verify_token(&forged), Err(AppError::Unauthorized(_))));

        let expired = SimpleAuthProvider::new("secret", -1)
            .issue_token(&UserId::new("1"))
            .unwrap();
        assert!(matches!(ours.verify_token(&expired), Err(AppError::Unauthorized(_))));
        assert!(matches!(ours.verify_token("garbage"), Err(AppError::Unauthorized(_))));
    }
}
