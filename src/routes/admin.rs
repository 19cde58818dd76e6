use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Oversight endpoints, nested under `/api/admin`. `create_router` wraps this
/// router in `admin_middleware`, which rejects any session without the `admin`
/// role with a 401 before path or body parsing.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/PUT /api/admin/profile
        .route(
            "/profile",
            get(handlers::get_admin_profile).put(handlers::update_admin_profile),
        )
        // GET /api/admin/colleges
        // Every registered college, for the review dashboard.
        .route("/colleges", get(handlers::list_colleges))
        // GET /api/admin/colleges/{id}/audit
        // A single college's audit submission.
        .route("/colleges/{id}/audit", get(handlers::get_audit_for_college))
}
