/// Account database model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account record in the database.
///
/// This is the slice of the account this service owns: identity plus
/// verification/activation state. Credential material lives with the
/// credential service and never appears here.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
