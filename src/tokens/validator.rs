/// Token consumption
use crate::{
    account::AccountManager,
    error::AppResult,
    tokens::{TokenPurpose, TokenStore},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Consumes account-action tokens and applies the account transition
/// that a successful email verification triggers.
///
/// All coordination between concurrent calls lives in the store's
/// atomic consume; the validator itself holds no locks.
pub struct TokenValidator {
    store: Arc<dyn TokenStore>,
    accounts: Arc<AccountManager>,
}

impl TokenValidator {
    pub fn new(store: Arc<dyn TokenStore>, accounts: Arc<AccountManager>) -> Self {
        Self { store, accounts }
    }

    /// Consume a token, enforcing purpose and expiry. Returns the user
    /// the token was issued for.
    ///
    /// A value can succeed here at most once: the store deletes the
    /// record in the same atomic step that validates it, so a repeat
    /// call (or a concurrent rival) observes TokenNotFound.
    pub async fn validate(
        &self,
        value: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        let token = self.store.consume_if_valid(value, purpose, now).await?;
        Ok(token.user_id)
    }

    /// Consume an email-verification token and mark the account
    /// verified and active.
    pub async fn consume_email_verification(&self, value: &str) -> AppResult<String> {
        let user_id = self
            .validate(value, TokenPurpose::EmailVerification, Utc::now())
            .await?;

        self.accounts.mark_email_verified(&user_id).await?;

        Ok(user_id)
    }

    /// Consume a password-reset token. Returns the user authorized to
    /// set a new password; the credential update itself belongs to the
    /// credential service.
    pub async fn consume_password_reset(&self, value: &str) -> AppResult<String> {
        self.validate(value, TokenPurpose::PasswordReset, Utc::now())
            .await
    }
}
