/// Token issuance
use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    mailer::Mailer,
    tokens::{Token, TokenPurpose, TokenStore},
};
use std::sync::Arc;

/// Bound on re-draws after a token value collision. A collision needs
/// two identical 190-bit draws, so a second attempt already means the
/// RNG is broken.
const MAX_PUT_ATTEMPTS: u32 = 3;

/// Creates and persists account-action tokens, and dispatches the
/// matching notification email without blocking the caller.
pub struct TokenIssuer {
    store: Arc<dyn TokenStore>,
    mailer: Arc<Mailer>,
    config: Arc<AppConfig>,
}

impl TokenIssuer {
    pub fn new(store: Arc<dyn TokenStore>, mailer: Arc<Mailer>, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    /// Create and persist a token for a user and purpose.
    ///
    /// The caller is responsible for having checked that `user_id`
    /// refers to an existing account. A storage failure means no token
    /// exists and no notification is attempted.
    pub async fn issue(&self, user_id: &str, purpose: TokenPurpose) -> AppResult<Token> {
        let ttl = self.config.tokens.ttl(purpose);

        for _ in 0..MAX_PUT_ATTEMPTS {
            let token = Token::new(user_id, purpose, ttl);
            match self.store.put(&token).await {
                Ok(()) => {
                    tracing::debug!("Issued {} token for user {}", purpose, user_id);
                    return Ok(token);
                }
                Err(AppError::DuplicateToken) => {
                    tracing::warn!("token value collision, re-drawing");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Internal(
            "token value collisions persisted across retries".to_string(),
        ))
    }

    /// Issue an email-verification token and send the verification link.
    /// Returns the token value.
    pub async fn issue_email_verification(
        &self,
        user_id: &str,
        email: &str,
        base_url: &str,
    ) -> AppResult<String> {
        let token = self.issue(user_id, TokenPurpose::EmailVerification).await?;
        self.dispatch_notification(TokenPurpose::EmailVerification, email, &token.token, base_url);
        Ok(token.token)
    }

    /// Issue a password-reset token and send the reset link.
    /// Returns the token value.
    pub async fn issue_password_reset(
        &self,
        user_id: &str,
        email: &str,
        base_url: &str,
    ) -> AppResult<String> {
        let token = self.issue(user_id, TokenPurpose::PasswordReset).await?;
        self.dispatch_notification(TokenPurpose::PasswordReset, email, &token.token, base_url);
        Ok(token.token)
    }

    /// Fire-and-forget email dispatch. Delivery latency and failure are
    /// decoupled from issuance; failures are logged, never surfaced.
    fn dispatch_notification(
        &self,
        purpose: TokenPurpose,
        email: &str,
        token_value: &str,
        base_url: &str,
    ) {
        let mailer = Arc::clone(&self.mailer);
        let ttl_hours = self.config.tokens.ttl(purpose).num_hours();
        let email = email.to_string();
        let token_value = token_value.to_string();
        let base_url = base_url.to_string();

        tokio::spawn(async move {
            let result = match purpose {
                TokenPurpose::EmailVerification => {
                    mailer
                        .send_verification_email(&email, &token_value, &base_url, ttl_hours)
                        .await
                }
                TokenPurpose::PasswordReset => {
                    mailer
                        .send_password_reset_email(&email, &token_value, &base_url, ttl_hours)
                        .await
                }
            };

            if let Err(e) = result {
                tracing::warn!("Failed to send {} email to {}: {}", purpose, email, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AppConfig, LoggingConfig, ServiceConfig, StorageConfig, TokenConfig,
    };
    use crate::tokens::store::tests::create_test_pool;
    use crate::tokens::SqliteTokenStore;
    use chrono::Duration;
    use std::path::PathBuf;

    fn test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            service: ServiceConfig {
                app_name: "Floralog".to_string(),
                hostname: "localhost".to_string(),
                port: 8080,
                api_prefix: "/api/v1".to_string(),
                public_url: None,
            },
            storage: StorageConfig {
                data_directory: PathBuf::from("./data"),
                database: PathBuf::from(":memory:"),
            },
            email: None,
            tokens: TokenConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        })
    }

    async fn create_test_issuer() -> (TokenIssuer, Arc<SqliteTokenStore>) {
        let store = Arc::new(SqliteTokenStore::new(create_test_pool().await));
        let config = test_config();
        let mailer = Arc::new(Mailer::new(&config).unwrap());
        let issuer = TokenIssuer::new(store.clone(), mailer, config);
        (issuer, store)
    }

    #[tokio::test]
    async fn test_issue_persists_token() {
        let (issuer, store) = create_test_issuer().await;

        let token = issuer
            .issue("u1", TokenPurpose::EmailVerification)
            .await
            .unwrap();

        let stored = store.get(&token.token).await.unwrap().unwrap();
        assert_eq!(stored.user_id, "u1");
        assert_eq!(stored.purpose, TokenPurpose::EmailVerification);
    }

    #[tokio::test]
    async fn test_verification_ttl_is_48_hours() {
        let (issuer, _store) = create_test_issuer().await;

        let token = issuer
            .issue("u1", TokenPurpose::EmailVerification)
            .await
            .unwrap();

        assert_eq!(token.expires_at - token.created_at, Duration::hours(48));
    }

    #[tokio::test]
    async fn test_reset_ttl_is_24_hours() {
        let (issuer, _store) = create_test_issuer().await;

        let token = issuer
            .issue("u1", TokenPurpose::PasswordReset)
            .await
            .unwrap();

        assert_eq!(token.expires_at - token.created_at, Duration::hours(24));
    }

    #[tokio::test]
    async fn test_issued_values_are_distinct() {
        let (issuer, _store) = create_test_issuer().await;

        let a = issuer
            .issue("u1", TokenPurpose::EmailVerification)
            .await
            .unwrap();
        let b = issuer
            .issue("u1", TokenPurpose::EmailVerification)
            .await
            .unwrap();

        // Re-issue does not invalidate earlier tokens; both live
        assert_ne!(a.token, b.token);
    }

    #[tokio::test]
    async fn test_issue_succeeds_without_mailer() {
        let (issuer, _store) = create_test_issuer().await;

        // Mailer is unconfigured; issuance must still return the value
        let value = issuer
            .issue_email_verification("u1", "u1@example.com", "http://localhost:8080")
            .await
            .unwrap();
        assert_eq!(value.len(), 32);
    }
}
