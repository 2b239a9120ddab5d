//! # rb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `rb-core` domain models.

use async_trait::async_trait;
use chrono::Utc;
use rb_core::aggregate;
use rb_core::error::{AppError, Result};
use rb_core::models::{NewPost, Post, PostId, Review, ReviewAggregate, UserAccount, UserId};
use rb_core::traits::ReviewRepo;
use rb_core::validator::Rating;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::HashMap;
use std::str::FromStr;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        location TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id INTEGER NOT NULL REFERENCES posts(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
        content TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        UNIQUE (post_id, user_id)
    )",
];

const SELECT_REVIEWS: &str = "SELECT r.id, r.post_id, r.user_id, u.username, r.rating, r.content, r.created_at
     FROM reviews r JOIN users u ON u.id = r.user_id";

pub struct SqliteReviewRepo {
    pool: SqlitePool,
}

impl SqliteReviewRepo {
    /// Opens (creating if needed) the database and applies the schema.
    ///
    /// A single long-lived connection keeps `sqlite::memory:` databases
    /// shared across queries and serializes writers.
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await.map_err(db_err)?;
        }
        tracing::info!(url, "sqlite review store ready");
        Ok(Self { pool })
    }
}

fn db_err(e: sqlx::Error) -> AppError {
    tracing::error!(error = %e, "database error");
    AppError::Internal(e.to_string())
}

/// User ids are SQLite row ids rendered as strings.
fn user_key(user: &UserId) -> Result<i64> {
    user.as_str()
        .parse()
        .map_err(|_| AppError::Unauthorized(format!("unknown user {}", user)))
}

fn row_to_review(row: &SqliteRow) -> Review {
    Review {
        id: row.get("id"),
        user_id: UserId::from(row.get::<i64, _>("user_id")),
        username: row.get("username"),
        rating: row.get("rating"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ReviewRepo for SqliteReviewRepo {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserAccount> {
        let inserted = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(done) => Ok(UserAccount {
                id: UserId::from(done.last_insert_rowid()),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Conflict("Username already exists".to_string()))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn find_user_by_name(&self, username: &str) -> Result<Option<UserAccount>> {
        let row = sqlx::query("SELECT id, username, password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(|row| UserAccount {
            id: UserId::from(row.get::<i64, _>("id")),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
        }))
    }

    async fn create_post(&self, author: &UserId, post: NewPost) -> Result<PostId> {
        let done = sqlx::query(
            "INSERT INTO posts (user_id, title, description, location, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_key(author)?)
        .bind(post.title)
        .bind(post.description)
        .bind(post.location)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(done.last_insert_rowid())
    }

    /// Loads every post and attaches its aggregate, built from one pass over
    /// the reviews table.
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let post_rows = sqlx::query(
            "SELECT p.id, p.user_id, u.username, p.title, p.description, p.location, p.created_at
             FROM posts p JOIN users u ON u.id = p.user_id
             ORDER BY p.id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let review_rows = sqlx::query(&format!("{} ORDER BY r.id ASC", SELECT_REVIEWS))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut by_post: HashMap<PostId, Vec<Review>> = HashMap::new();
        for row in &review_rows {
            by_post
                .entry(row.get("post_id"))
                .or_default()
                .push(row_to_review(row));
        }

        Ok(post_rows
            .into_iter()
            .map(|row| {
                let id: PostId = row.get("id");
                let reviews = by_post.remove(&id).unwrap_or_default();
                Post {
                    id,
                    title: row.get("title"),
                    description: row.get("description"),
                    location: row.get("location"),
                    author_username: row.get("username"),
                    author_user_id: UserId::from(row.get::<i64, _>("user_id")),
                    created_at: row.get("created_at"),
                    reviews: aggregate::compute(&reviews),
                }
            })
            .collect())
    }

    /// Creates or updates the user's review and returns the fresh aggregate.
    ///
    /// # Developer Note
    /// The `UNIQUE (post_id, user_id)` constraint drives the upsert, so an
    /// update keeps the row id and original `created_at`. Concurrent writes
    /// for the same pair are last-write-wins.
    async fn upsert_review(
        &self,
        post_id: PostId,
        user: &UserId,
        rating: Rating,
        content: &str,
    ) -> Result<ReviewAggregate> {
        let user_id = user_key(user)?;
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let exists = sqlx::query("SELECT 1 FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        if exists.is_none() {
            return Err(AppError::NotFound("Post".to_string(), post_id.to_string()));
        }

        sqlx::query(
            "INSERT INTO reviews (post_id, user_id, rating, content, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (post_id, user_id) DO UPDATE
             SET rating = excluded.rating, content = excluded.content",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(rating.get())
        .bind(content)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let reviews: Vec<Review> = sqlx::query(&format!("{} WHERE r.post_id = ? ORDER BY r.id ASC", SELECT_REVIEWS))
            .bind(post_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err)?
            .iter()
            .map(row_to_review)
            .collect();

        tx.commit().await.map_err(db_err)?;
        Ok(aggregate::compute(&reviews))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo_with_post() -> (SqliteReviewRepo, UserAccount, UserAccount, PostId) {
        let repo = SqliteReviewRepo::new("sqlite::memory:").await.unwrap();
        let author = repo.create_user("author", "hash-a").await.unwrap();
        let reader = repo.create_user("reader", "hash-r").await.unwrap();
        let post_id = repo
            .create_post(
                &author.id,
                NewPost {
                    title: "Tide pools".into(),
                    description: "Low tide at noon".into(),
                    location: "North beach".into(),
                },
            )
            .await
            .unwrap();
        (repo, author, reader, post_id)
    }

    fn rating(r: i64) -> Rating {
        Rating::try_from(r).unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let repo = SqliteReviewRepo::new("sqlite::memory:").await.unwrap();
        repo.create_user("sam", "x").await.unwrap();
        let err = repo.create_user("sam", "y").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let found = repo.find_user_by_name("sam").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "x");
        assert!(repo.find_user_by_name("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_review_per_user() {
        let (repo, author, reader, post_id) = repo_with_post().await;

        let first = repo.upsert_review(post_id, &reader.id, rating(4), "good").await.unwrap();
        let mine = first.review_by(&reader.id).unwrap().clone();
        assert_eq!(first.count, 1);

        let second = repo.upsert_review(post_id, &reader.id, rating(2), "changed my mind").await.unwrap();
        assert_eq!(second.count, 1);
        let updated = second.review_by(&reader.id).unwrap();
        assert_eq!(updated.id, mine.id);
        assert_eq!(updated.created_at, mine.created_at);
        assert_eq!(updated.content, "changed my mind");

        let third = repo.upsert_review(post_id, &author.id, rating(5), "").await.unwrap();
        assert_eq!(third.count, 2);
        assert_eq!(third.average, Some(3.5));
        assert!(third.is_consistent());
    }

    #[tokio::test]
    async fn test_list_posts_attaches_aggregates() {
        let (repo, author, reader, post_id) = repo_with_post().await;
        let empty_post = repo
            .create_post(&author.id, NewPost { title: "Quiet".into(), description: String::new(), location: String::new() })
            .await
            .unwrap();
        repo.upsert_review(post_id, &reader.id, rating(3), "ok").await.unwrap();

        let posts = repo.list_posts().await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, post_id);
        assert_eq!(posts[0].author_username, "author");
        assert_eq!(posts[0].reviews.count, 1);
        assert_eq!(posts[0].reviews.ratings[0].username, "reader");
        assert_eq!(posts[1].id, empty_post);
        assert!(posts[1].reviews.is_empty());
    }

    #[tokio::test]
    async fn test_review_on_missing_post() {
        let (repo, _author, reader, _post_id) = repo_with_post().await;
        let err = repo.upsert_review(999, &reader.id, rating(3), "").await.unwrap_err();
        assert_eq!(err, AppError::NotFound("Post".into(), "999".into()));
    }

    #[tokio::test]
    async fn test_non_numeric_user_is_rejected() {
        let (repo, _author, _reader, post_id) = repo_with_post().await;
        let err = repo
            .upsert_review(post_id, &UserId::new("mallory"), rating(3), "")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
