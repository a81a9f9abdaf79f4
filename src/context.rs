/// Application context and dependency injection
use crate::{
    account::AccountManager,
    config::AppConfig,
    db,
    error::AppResult,
    mailer::Mailer,
    tokens::{SqliteTokenStore, TokenIssuer, TokenStore, TokenValidator},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub token_store: Arc<dyn TokenStore>,
    pub token_issuer: Arc<TokenIssuer>,
    pub token_validator: Arc<TokenValidator>,
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        // Validate configuration
        config.validate()?;

        // Initialize database
        let pool = db::create_pool(&config.storage.database, db::DatabaseOptions::default())
            .await?;

        // Run migrations
        db::run_migrations(&pool).await?;

        // Test connection
        db::test_connection(&pool).await?;

        let config = Arc::new(config);

        // Initialize mailer
        let mailer = Arc::new(Mailer::new(&config)?);

        // Initialize account manager and the token pipeline
        let account_manager = Arc::new(AccountManager::new(pool.clone()));
        let token_store: Arc<dyn TokenStore> = Arc::new(SqliteTokenStore::new(pool.clone()));
        let token_issuer = Arc::new(TokenIssuer::new(
            Arc::clone(&token_store),
            Arc::clone(&mailer),
            Arc::clone(&config),
        ));
        let token_validator = Arc::new(TokenValidator::new(
            Arc::clone(&token_store),
            Arc::clone(&account_manager),
        ));

        Ok(Self {
            config,
            db: pool,
            account_manager,
            token_store,
            token_issuer,
            token_validator,
            mailer,
        })
    }

    /// Externally reachable service URL used in emailed links
    pub fn service_url(&self) -> String {
        self.config.base_url()
    }
}
