/// Configuration management for the floralog backend
use crate::error::{AppError, AppResult};
use crate::tokens::{EMAIL_VERIFICATION_TTL_HOURS, PASSWORD_RESET_TTL_HOURS};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub email: Option<EmailConfig>,
    pub tokens: TokenConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub app_name: String,
    pub hostname: String,
    pub port: u16,
    /// Path prefix all API routes are nested under, e.g. "/api/v1"
    pub api_prefix: String,
    /// Externally reachable URL used in emailed links; falls back to
    /// http://{hostname}:{port} when unset
    pub public_url: Option<String>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Lifetimes for account-action tokens, in hours
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub email_verification_ttl_hours: i64,
    pub password_reset_ttl_hours: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            email_verification_ttl_hours: EMAIL_VERIFICATION_TTL_HOURS,
            password_reset_ttl_hours: PASSWORD_RESET_TTL_HOURS,
        }
    }
}

impl TokenConfig {
    /// Lifetime for tokens of the given purpose
    pub fn ttl(&self, purpose: crate::tokens::TokenPurpose) -> chrono::Duration {
        match purpose {
            crate::tokens::TokenPurpose::EmailVerification => {
                chrono::Duration::hours(self.email_verification_ttl_hours)
            }
            crate::tokens::TokenPurpose::PasswordReset => {
                chrono::Duration::hours(self.password_reset_ttl_hours)
            }
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let app_name =
            env::var("FLORALOG_APP_NAME").unwrap_or_else(|_| "Floralog".to_string());
        let hostname =
            env::var("FLORALOG_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("FLORALOG_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| AppError::Validation("Invalid port number".to_string()))?;
        let api_prefix =
            env::var("FLORALOG_API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string());
        let public_url = env::var("FLORALOG_PUBLIC_URL").ok();

        let data_directory: PathBuf = env::var("FLORALOG_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("FLORALOG_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("floralog.sqlite"));

        let email = if let Ok(smtp_url) = env::var("FLORALOG_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("FLORALOG_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        let tokens = TokenConfig {
            email_verification_ttl_hours: env::var("FLORALOG_VERIFICATION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(EMAIL_VERIFICATION_TTL_HOURS),
            password_reset_ttl_hours: env::var("FLORALOG_RESET_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(PASSWORD_RESET_TTL_HOURS),
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(AppConfig {
            service: ServiceConfig {
                app_name,
                hostname,
                port,
                api_prefix,
                public_url,
            },
            storage: StorageConfig {
                data_directory,
                database,
            },
            email,
            tokens,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if !self.service.api_prefix.starts_with('/') {
            return Err(AppError::Validation(
                "API prefix must start with '/'".to_string(),
            ));
        }

        if self.tokens.email_verification_ttl_hours <= 0
            || self.tokens.password_reset_ttl_hours <= 0
        {
            return Err(AppError::Validation(
                "Token lifetimes must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Externally reachable base URL for emailed links
    pub fn base_url(&self) -> String {
        self.service.public_url.clone().unwrap_or_else(|| {
            format!("http://{}:{}", self.service.hostname, self.service.port)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenPurpose;

    fn test_config() -> AppConfig {
        AppConfig {
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
        }
    }

    #[test]
    fn default_ttls_match_constants() {
        let config = test_config();
        assert_eq!(
            config.tokens.ttl(TokenPurpose::EmailVerification),
            chrono::Duration::hours(48)
        );
        assert_eq!(
            config.tokens.ttl(TokenPurpose::PasswordReset),
            chrono::Duration::hours(24)
        );
    }

    #[test]
    fn validate_rejects_bad_prefix() {
        let mut config = test_config();
        config.service.api_prefix = "api/v1".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_nonpositive_ttl() {
        let mut config = test_config();
        config.tokens.password_reset_ttl_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn base_url_prefers_public_url() {
        let mut config = test_config();
        assert_eq!(config.base_url(), "http://localhost:8080");

        config.service.public_url = Some("https://floralog.example".to_string());
        assert_eq!(config.base_url(), "https://floralog.example");
    }
}
