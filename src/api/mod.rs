/// API routes and handlers
pub mod auth;
pub mod extract;
pub mod files;
pub mod middleware;

use crate::context::AppContext;
use axum::Router;

/// Build API routes, mounted under `/api` by the server
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(auth::routes())
        .merge(files::routes())
}
