/// Single-use account-action tokens
///
/// A token authorizes exactly one sensitive account action: confirming
/// an email address or resetting a password. Tokens are issued with a
/// purpose-specific lifetime, stored until consumed, and destroyed by
/// the act of consumption.

mod issuer;
mod store;
mod validator;

pub use issuer::TokenIssuer;
pub use store::{SqliteTokenStore, TokenStore};
pub use validator::TokenValidator;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default lifetime of an email-verification token, in hours
pub const EMAIL_VERIFICATION_TTL_HOURS: i64 = 48;

/// Default lifetime of a password-reset token, in hours
pub const PASSWORD_RESET_TTL_HOURS: i64 = 24;

/// Length of a generated token value. 32 characters over a 62-character
/// alphabet is ~190 bits of entropy.
const TOKEN_VALUE_LEN: usize = 32;

/// The account action a token authorizes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

impl TokenPurpose {
    /// Stable string form, also the stored column value
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "email_verification",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }
}

impl std::fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending authorization record.
///
/// Never mutated after creation; it either expires or is deleted by
/// consumption.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
    pub user_id: String,
    pub purpose: TokenPurpose,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Create a fresh token for a user and purpose with the given lifetime
    pub fn new(user_id: &str, purpose: TokenPurpose, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            token: generate_token_value(),
            user_id: user_id.to_string(),
            purpose,
            created_at: now,
            expires_at: now + ttl,
        }
    }
}

/// Generate a random token value from a CSPRNG
fn generate_token_value() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                             abcdefghijklmnopqrstuvwxyz\
                             0123456789";
    let mut rng = rand::thread_rng();
    (0..TOKEN_VALUE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_value_shape() {
        let value = generate_token_value();
        assert_eq!(value.len(), 32);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_token_values_are_unique() {
        let mut values = HashSet::new();
        for _ in 0..1000 {
            values.insert(generate_token_value());
        }
        assert_eq!(values.len(), 1000);
    }

    #[test]
    fn test_expiry_follows_ttl() {
        let token = Token::new("u1", TokenPurpose::EmailVerification, Duration::hours(48));
        assert_eq!(token.expires_at - token.created_at, Duration::hours(48));
        assert!(token.expires_at > token.created_at);

        let token = Token::new("u1", TokenPurpose::PasswordReset, Duration::hours(24));
        assert_eq!(token.expires_at - token.created_at, Duration::hours(24));
    }

    #[test]
    fn test_purpose_round_trips_through_serde() {
        let json = serde_json::to_string(&TokenPurpose::EmailVerification).unwrap();
        assert_eq!(json, "\"email_verification\"");

        let parsed: TokenPurpose = serde_json::from_str("\"password_reset\"").unwrap();
        assert_eq!(parsed, TokenPurpose::PasswordReset);
    }
}
