use crate::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    error::ApiError,
    models::{
        Admin, AuditDocument, AuditSection, College, MessageResponse, Role, UpdateAdminRequest,
        VerifyResponse,
    },
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::Value;
use uuid::Uuid;

// --- Session ---

/// verify_session
///
/// [Authenticated Route] Echoes the identity carried by the caller's session token.
/// Any role is accepted; the store is not consulted.
#[utoipa::path(
    get,
    path = "/api/auth/verify",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse)
    )
)]
pub async fn verify_session(user: AuthUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        user: user.session_user(),
    })
}

/// logout
///
/// [Public Route] Clears the session cookie. Idempotent.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(
    State(config): State<AppConfig>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    // Always emit the expiring cookie, even if the request carried none.
    let mut cookie = Cookie::new(config.cookie_name, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.make_removal();
    (
        jar.add(cookie),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

// --- College ---

/// get_college_profile
///
/// [College Route] Returns the signed-in college's record, password excluded.
#[utoipa::path(
    get,
    path = "/api/college/profile",
    responses(
        (status = 200, description = "College profile", body = College),
        (status = 401, description = "Not a college session", body = MessageResponse),
        (status = 404, description = "College not found", body = MessageResponse)
    )
)]
pub async fn get_college_profile(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<College>, ApiError> {
    user.require_role(Role::College)?;

    state
        .repo
        .get_college(user.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("College not found".to_string()))
}

/// get_college_audit
///
/// [College Route] Returns the signed-in college's audit. A college that has not
/// saved anything yet gets an empty document, so the form falls back to defaults.
#[utoipa::path(
    get,
    path = "/api/college/audit",
    responses(
        (status = 200, description = "Audit document", body = AuditDocument),
        (status = 404, description = "College not found", body = MessageResponse)
    )
)]
pub async fn get_college_audit(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AuditDocument>, ApiError> {
    user.require_role(Role::College)?;
    ensure_college_exists(&state, user.id).await?;

    let audit = state
        .repo
        .get_audit(user.id)
        .await?
        .unwrap_or_else(|| AuditDocument::empty(user.id));
    Ok(Json(audit))
}

/// save_audit_section
///
/// [College Route] Replaces one section of the signed-in college's audit.
///
/// The section id must be one of the fixed `AuditSection` keys and the body must be
/// a JSON object; anything else is a 400. Other sections are left untouched.
#[utoipa::path(
    put,
    path = "/api/college/audit/{section}",
    params(("section" = String, Path, description = "Audit section key")),
    responses(
        (status = 200, description = "Saved", body = AuditDocument),
        (status = 400, description = "Unknown section or malformed body", body = MessageResponse),
        (status = 404, description = "College not found", body = MessageResponse)
    )
)]
pub async fn save_audit_section(
    user: AuthUser,
    State(state): State<AppState>,
    Path(section): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AuditDocument>, ApiError> {
    user.require_role(Role::College)?;

    let section = section
        .parse::<AuditSection>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let Value::Object(data) = body else {
        return Err(ApiError::BadRequest(
            "Section data must be a JSON object".to_string(),
        ));
    };

    ensure_college_exists(&state, user.id).await?;

    let audit = state.repo.save_audit_section(user.id, section, data).await?;
    tracing::info!(college_id = %user.id, %section, "audit section saved");
    Ok(Json(audit))
}

// --- Admin ---

/// get_admin_profile
///
/// [Admin Route] Returns the signed-in admin's record, password excluded.
#[utoipa::path(
    get,
    path = "/api/admin/profile",
    responses(
        (status = 200, description = "Admin profile", body = Admin),
        (status = 401, description = "Not an admin session", body = MessageResponse),
        (status = 404, description = "Admin not found", body = MessageResponse)
    )
)]
pub async fn get_admin_profile(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Admin>, ApiError> {
    user.require_role(Role::Admin)?;

    state
        .repo
        .get_admin(user.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))
}

/// update_admin_profile
///
/// [Admin Route] Partial update of the signed-in admin's own record.
#[utoipa::path(
    put,
    path = "/api/admin/profile",
    request_body = UpdateAdminRequest,
    responses(
        (status = 200, description = "Updated", body = Admin),
        (status = 400, description = "Invalid name", body = MessageResponse),
        (status = 404, description = "Admin not found", body = MessageResponse)
    )
)]
pub async fn update_admin_profile(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<UpdateAdminRequest>, JsonRejection>,
) -> Result<Json<Admin>, ApiError> {
    user.require_role(Role::Admin)?;
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    if payload.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
    }

    state
        .repo
        .update_admin(user.id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))
}

/// list_colleges
///
/// [Admin Route] Lists every registered college, ordered by name.
#[utoipa::path(
    get,
    path = "/api/admin/colleges",
    responses((status = 200, description = "All colleges", body = [College]))
)]
pub async fn list_colleges(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<College>>, ApiError> {
    user.require_role(Role::Admin)?;
    Ok(Json(state.repo.list_colleges().await?))
}

/// get_audit_for_college
///
/// [Admin Route] Reads any college's audit for review.
#[utoipa::path(
    get,
    path = "/api/admin/colleges/{id}/audit",
    params(("id" = Uuid, Path, description = "College ID")),
    responses(
        (status = 200, description = "Audit document", body = AuditDocument),
        (status = 404, description = "College or audit not found", body = MessageResponse)
    )
)]
pub async fn get_audit_for_college(
    user: AuthUser,
    State(state): State<AppState>,
    college_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AuditDocument>, ApiError> {
    user.require_role(Role::Admin)?;
    let Path(college_id) =
        college_id.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    ensure_college_exists(&state, college_id).await?;

    state
        .repo
        .get_audit(college_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Audit not found".to_string()))
}

async fn ensure_college_exists(state: &AppState, college_id: Uuid) -> Result<(), ApiError> {
    match state.repo.get_college(college_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("College not found".to_string())),
    }
}
