/// Durable storage for account-action tokens
use crate::{
    error::{AppError, AppResult},
    tokens::{Token, TokenPurpose},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Storage contract for token records.
///
/// All cross-request coordination for the token lifecycle lives behind
/// this trait; callers never hold locks of their own.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert a new record. Fails with DuplicateToken if the value
    /// collides with a live record.
    async fn put(&self, token: &Token) -> AppResult<()>;

    /// Look up a record by value without consuming it.
    async fn get(&self, value: &str) -> AppResult<Option<Token>>;

    /// Atomically consume a live record: verify the purpose matches and
    /// the record has not expired as of `now`, and delete it in the
    /// same step. At most one concurrent caller can receive the record;
    /// the rest observe TokenNotFound or TokenExpired.
    async fn consume_if_valid(
        &self,
        value: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<Token>;

    /// Remove every record whose lifetime has elapsed. Returns the
    /// number of records removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// SQLite-backed token store
pub struct SqliteTokenStore {
    db: SqlitePool,
}

impl SqliteTokenStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn put(&self, token: &Token) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO auth_token (token, user_id, purpose, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&token.token)
        .bind(&token.user_id)
        .bind(token.purpose)
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateToken
            }
            _ => AppError::Database(e),
        })?;

        Ok(())
    }

    async fn get(&self, value: &str) -> AppResult<Option<Token>> {
        let record = sqlx::query_as::<_, Token>(
            "SELECT token, user_id, purpose, created_at, expires_at
             FROM auth_token WHERE token = ?1",
        )
        .bind(value)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?;

        Ok(record)
    }

    async fn consume_if_valid(
        &self,
        value: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<Token> {
        // Happy path: one statement checks purpose and expiry and
        // deletes the row. Under concurrent calls for the same value
        // the row can only be returned once.
        let consumed = sqlx::query_as::<_, Token>(
            "DELETE FROM auth_token
             WHERE token = ?1 AND purpose = ?2 AND expires_at >= ?3
             RETURNING token, user_id, purpose, created_at, expires_at",
        )
        .bind(value)
        .bind(purpose)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?;

        if let Some(token) = consumed {
            return Ok(token);
        }

        // The record is absent, expired, or held under another purpose.
        // An expired record is removed here; its removal racing another
        // consume or the sweep is a harmless delete-absent.
        let expired = sqlx::query_scalar::<_, String>(
            "DELETE FROM auth_token
             WHERE token = ?1 AND purpose = ?2 AND expires_at < ?3
             RETURNING token",
        )
        .bind(value)
        .bind(purpose)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?;

        if expired.is_some() {
            return Err(AppError::TokenExpired);
        }

        // A record under a different purpose stays untouched and remains
        // consumable by a correctly-purposed call.
        let other_purpose =
            sqlx::query_scalar::<_, String>("SELECT purpose FROM auth_token WHERE token = ?1")
                .bind(value)
                .fetch_optional(&self.db)
                .await
                .map_err(AppError::Database)?;

        match other_purpose {
            Some(_) => Err(AppError::TokenPurposeMismatch),
            None => Err(AppError::TokenNotFound),
        }
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM auth_token WHERE expires_at < ?1")
            .bind(now)
            .execute(&self.db)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}
