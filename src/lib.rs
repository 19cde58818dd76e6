use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod form_state;
pub mod handlers;
pub mod models;
pub mod repository;

// Routing segregated by access level (Public, Authenticated, Admin).
pub mod routes;
use auth::{Credential, TokenVerifier};
use models::Role;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::verify_session, handlers::logout, handlers::get_college_profile,
        handlers::get_college_audit, handlers::save_audit_section, handlers::get_admin_profile,
        handlers::update_admin_profile, handlers::list_colleges, handlers::get_audit_for_college
    ),
    components(
        schemas(
            models::Role, models::Admin, models::College, models::UpdateAdminRequest,
            models::AuditSection, models::AuditDocument, models::MessageResponse,
            models::SessionUser, models::VerifyResponse,
        )
    ),
    tags(
        (name = "audit-portal", description = "Academic Audit Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable container for everything a request needs: the document store
/// handle, the token verifier and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub verifier: TokenVerifier,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state around an already-initialised store, deriving the verifier
    /// from the configured secret.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            repo,
            verifier: TokenVerifier::new(&config.jwt_secret),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenVerifier {
    fn from_ref(app_state: &AppState) -> TokenVerifier {
        app_state.verifier.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for the authenticated router. The credential is verified before any
/// handler extractor runs, so a request without a valid session never reaches
/// path or body parsing.
async fn auth_middleware(
    State(verifier): State<TokenVerifier>,
    credential: Credential,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    credential.authenticate(&verifier)?;
    Ok(next.run(request).await)
}

/// admin_middleware
///
/// Gate for the `/api/admin` router: a valid session with any role other than
/// `admin` is answered with a 401 before the route's extractors run.
async fn admin_middleware(
    State(verifier): State<TokenVerifier>,
    credential: Credential,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    credential
        .authenticate(&verifier)?
        .require_role(Role::Admin)?;
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles the routing tree, applies scoped and global middleware and registers
/// the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/api/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                admin_middleware,
            )),
        )
        .with_state(state);

    // Outermost layers: request id, tracing span, id propagation.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: every log line of a request carries its
/// `x-request-id` alongside method and URI.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
