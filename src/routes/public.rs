use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers. Does not touch the document store.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/logout
        // Expires the session cookie. Works with or without a valid session.
        .route("/api/auth/logout", post(handlers::logout))
}
