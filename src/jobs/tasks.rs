/// Background task implementations
use crate::{context::AppContext, error::AppResult, tokens::TokenStore};
use chrono::Utc;

/// Remove tokens whose lifetime has elapsed.
///
/// Racing a concurrent consume is harmless: deleting an already-deleted
/// row is a no-op, and consumption always re-checks expiry itself.
pub async fn sweep_expired_tokens(ctx: &AppContext) -> AppResult<u64> {
    ctx.token_store.delete_expired(Utc::now()).await
}

/// Health check - verify the database is reachable
pub async fn health_check(ctx: &AppContext) -> AppResult<()> {
    sqlx::query("SELECT 1").fetch_one(&ctx.db).await?;

    Ok(())
}
