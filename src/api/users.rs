/// User account endpoints: registration and email verification
use crate::{
    account::{RegisterRequest, RegisterResponse, RequestVerificationRequest},
    context::AppContext,
    error::AppResult,
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

/// Build user routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/users", post(register))
        .route("/users/request-verification", post(request_verification))
        .route("/users/verify-email/:token", get(verify_email))
}

/// Register a new account and send the verification link
async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    tracing::info!("register: creating account for username: {}", req.username);

    let account = ctx
        .account_manager
        .create_account(&req.username, &req.email)
        .await?;

    // Dispatch is fire-and-forget inside the issuer; a slow or failing
    // mail relay cannot fail registration
    ctx.token_issuer
        .issue_email_verification(&account.user_id, &account.email, &ctx.service_url())
        .await?;

    Ok(Json(RegisterResponse {
        user_id: account.user_id,
        username: account.username,
        email: account.email,
    }))
}

/// Re-send a verification link
///
/// The response is identical whether or not the email belongs to an
/// account, so the endpoint cannot be used to enumerate users.
async fn request_verification(
    State(ctx): State<AppContext>,
    Json(req): Json<RequestVerificationRequest>,
) -> AppResult<Json<serde_json::Value>> {
    match ctx.account_manager.get_account_by_email(&req.email).await {
        Ok(account) => {
            if account.email_verified {
                tracing::debug!("request_verification: {} already verified", account.user_id);
            } else {
                ctx.token_issuer
                    .issue_email_verification(&account.user_id, &account.email, &ctx.service_url())
                    .await?;
            }
        }
        Err(_) => {
            tracing::debug!("request_verification: no account for submitted email");
        }
    }

    Ok(Json(serde_json::json!({
        "message": "If the address belongs to an account, a verification email has been sent"
    })))
}

/// Consume a verification token from the emailed link
async fn verify_email(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    ctx.token_validator
        .consume_email_verification(&token)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Email verified"
    })))
}
