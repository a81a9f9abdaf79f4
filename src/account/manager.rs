/// Account manager implementation using runtime queries
use crate::{
    db::account::Account,
    error::{AppError, AppResult},
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a new account
    ///
    /// Accounts start unverified and inactive; both flags flip together
    /// when the verification link is consumed.
    pub async fn create_account(&self, username: &str, email: &str) -> AppResult<Account> {
        self.validate_username(username)?;
        self.validate_email(email)?;

        if self.username_exists(username).await? {
            return Err(AppError::Conflict(format!(
                "Username {} already taken",
                username
            )));
        }

        if self.email_exists(email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO account (user_id, username, email, email_verified, email_verified_at, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&user_id)
        .bind(username)
        .bind(email)
        .bind(false)
        .bind(Option::<chrono::DateTime<Utc>>::None)
        .bind(false)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(AppError::Database)?;

        Ok(Account {
            user_id,
            username: username.to_string(),
            email: email.to_string(),
            email_verified: false,
            email_verified_at: None,
            is_active: false,
            created_at: now,
        })
    }

    /// Get account by user id
    pub async fn get_account(&self, user_id: &str) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(
            "SELECT user_id, username, email, email_verified, email_verified_at, is_active, created_at
             FROM account WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    /// Get account by email
    pub async fn get_account_by_email(&self, email: &str) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(
            "SELECT user_id, username, email, email_verified, email_verified_at, is_active, created_at
             FROM account WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    /// Apply the verification transition: unverified -> verified.
    ///
    /// Sets email_verified and is_active together. The transition is
    /// terminal; re-applying it to a verified account is a no-op.
    pub async fn mark_email_verified(&self, user_id: &str) -> AppResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE account
             SET email_verified = TRUE, email_verified_at = ?1, is_active = TRUE
             WHERE user_id = ?2",
        )
        .bind(now)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Account not found".to_string()));
        }

        tracing::info!("Email verified for user: {}", user_id);

        Ok(())
    }

    /// Check if username exists
    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM account WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::Database)?;

        Ok(count > 0)
    }

    /// Check if email exists
    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM account WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::Database)?;

        Ok(count > 0)
    }

    /// Validate username format
    fn validate_username(&self, username: &str) -> AppResult<()> {
        if username.len() < 3 {
            return Err(AppError::Validation(
                "Username must be at least 3 characters".to_string(),
            ));
        }

        if username.len() > 64 {
            return Err(AppError::Validation("Username too long".to_string()));
        }

        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(AppError::Validation(
                "Username contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate email format
    fn validate_email(&self, email: &str) -> AppResult<()> {
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_manager() -> AccountManager {
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE account (
                user_id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                email_verified BOOLEAN NOT NULL DEFAULT 0,
                email_verified_at DATETIME,
                is_active BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        AccountManager::new(db)
    }

    #[tokio::test]
    async fn test_create_account_starts_unverified() {
        let manager = create_test_manager().await;

        let account = manager
            .create_account("fern-fan", "fern@example.com")
            .await
            .unwrap();

        assert!(!account.email_verified);
        assert!(!account.is_active);
        assert!(account.email_verified_at.is_none());

        let fetched = manager.get_account(&account.user_id).await.unwrap();
        assert_eq!(fetched.username, "fern-fan");
        assert_eq!(fetched.email, "fern@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let manager = create_test_manager().await;

        manager
            .create_account("mossy", "mossy@example.com")
            .await
            .unwrap();

        let result = manager.create_account("mossy", "other@example.com").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let manager = create_test_manager().await;

        manager
            .create_account("mossy", "shared@example.com")
            .await
            .unwrap();

        let result = manager.create_account("lichen", "shared@example.com").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_mark_email_verified_sets_both_flags() {
        let manager = create_test_manager().await;

        let account = manager
            .create_account("willow", "willow@example.com")
            .await
            .unwrap();

        manager.mark_email_verified(&account.user_id).await.unwrap();

        let verified = manager.get_account(&account.user_id).await.unwrap();
        assert!(verified.email_verified);
        assert!(verified.is_active);
        assert!(verified.email_verified_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_email_verified_is_terminal() {
        let manager = create_test_manager().await;

        let account = manager
            .create_account("willow", "willow@example.com")
            .await
            .unwrap();

        manager.mark_email_verified(&account.user_id).await.unwrap();
        // A second application is a no-op, not an error
        manager.mark_email_verified(&account.user_id).await.unwrap();

        let verified = manager.get_account(&account.user_id).await.unwrap();
        assert!(verified.email_verified);
        assert!(verified.is_active);
    }

    #[tokio::test]
    async fn test_mark_email_verified_unknown_user() {
        let manager = create_test_manager().await;

        let result = manager.mark_email_verified("no-such-user").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_username_validation() {
        let manager = create_test_manager().await;

        assert!(manager.create_account("ab", "a@example.com").await.is_err());
        assert!(manager
            .create_account("bad name!", "b@example.com")
            .await
            .is_err());
        assert!(manager
            .create_account("ok_name.1", "c@example.com")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_email_validation() {
        let manager = create_test_manager().await;

        let result = manager.create_account("valid-name", "not-an-email").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
