/// API routes and handlers
pub mod login;
pub mod users;

use crate::context::AppContext;
use axum::Router;

/// Build API routes, nested under the configured prefix by the server
pub fn routes() -> Router<AppContext> {
    Router::new().merge(users::routes()).merge(login::routes())
}
