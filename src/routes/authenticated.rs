use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Authenticated Router Module
///
/// Routes for any caller holding a valid session token. The session layer in
/// `create_router` rejects everything else with a 401 before these handlers run;
/// the college handlers additionally require the `college` role.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/auth/verify
        // Returns the identity decoded from the token, for any role.
        .route("/api/auth/verify", get(handlers::verify_session))
        // GET /api/college/profile
        // The signed-in college's own record, password excluded.
        .route("/api/college/profile", get(handlers::get_college_profile))
        // GET /api/college/audit
        // The signed-in college's audit, empty until the first section is saved.
        .route("/api/college/audit", get(handlers::get_college_audit))
        // PUT /api/college/audit/{section}
        // Replaces one section. The section key must be one of the 17 audit sections.
        .route(
            "/api/college/audit/{section}",
            put(handlers::save_audit_section),
        )
}
