/// Account management
///
/// Handles registration and the verification state transition applied
/// when an email-verification token is consumed.

mod manager;

pub use manager::AccountManager;

use serde::{Deserialize, Serialize};

/// Account registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
}

/// Account registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

/// Request to re-send a verification link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestVerificationRequest {
    pub email: String,
}

/// Request to start a password reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPasswordResetRequest {
    pub email: String,
}
