/// Login-adjacent endpoints: the password-reset flow
use crate::{
    account::RequestPasswordResetRequest,
    context::AppContext,
    error::AppResult,
};
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};

/// Build login routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/login/request-password-reset", post(request_password_reset))
        .route("/login/reset-password/:token", post(reset_password))
}

/// Request a password reset link (public endpoint, no auth required)
///
/// Always returns the same response so the endpoint cannot be used to
/// enumerate registered addresses.
async fn request_password_reset(
    State(ctx): State<AppContext>,
    Json(req): Json<RequestPasswordResetRequest>,
) -> AppResult<Json<serde_json::Value>> {
    match ctx.account_manager.get_account_by_email(&req.email).await {
        Ok(account) => {
            ctx.token_issuer
                .issue_password_reset(&account.user_id, &account.email, &ctx.service_url())
                .await?;
        }
        Err(_) => {
            tracing::debug!("request_password_reset: no account for submitted email");
        }
    }

    Ok(Json(serde_json::json!({
        "message": "If the address belongs to an account, a reset email has been sent"
    })))
}

/// Consume a reset token from the emailed link.
///
/// A success authorizes exactly one credential update, which the
/// credential service performs; the token is gone either way.
async fn reset_password(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = ctx.token_validator.consume_password_reset(&token).await?;

    tracing::info!("Password reset authorized for user: {}", user_id);

    Ok(Json(serde_json::json!({
        "message": "Password reset authorized"
    })))
}
