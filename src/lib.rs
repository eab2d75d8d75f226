use axum::{
    Router,
    extract::{FromRef, Request},
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

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod permissions;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser; // The resolved authenticated user identity.
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use error::ApiError;
pub use mailer::{LogMailer, MailerState, MockMailer};
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas decorated with the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // List all public handler functions here for documentation generation.
    paths(
        handlers::auth::signup, handlers::auth::get_token,
        handlers::users::get_me, handlers::users::patch_me, handlers::users::list_users,
        handlers::users::create_user, handlers::users::get_user, handlers::users::patch_user,
        handlers::users::delete_user,
        handlers::catalog::list_categories, handlers::catalog::create_category,
        handlers::catalog::delete_category, handlers::catalog::list_genres,
        handlers::catalog::create_genre, handlers::catalog::delete_genre,
        handlers::catalog::list_titles, handlers::catalog::get_title,
        handlers::catalog::create_title, handlers::catalog::patch_title,
        handlers::catalog::delete_title,
        handlers::feedback::list_reviews, handlers::feedback::get_review,
        handlers::feedback::create_review, handlers::feedback::patch_review,
        handlers::feedback::delete_review, handlers::feedback::list_comments,
        handlers::feedback::get_comment, handlers::feedback::create_comment,
        handlers::feedback::patch_comment, handlers::feedback::delete_comment
    ),
    // List all models (schemas) used in the request/response bodies.
    components(
        schemas(
            models::UserRole, models::UserProfile, models::SignupRequest, models::TokenRequest,
            models::TokenResponse, models::CreateUserRequest, models::UpdateUserRequest,
            models::UpdateProfileRequest, models::Category, models::CreateCategoryRequest,
            models::Genre, models::TitleRead, models::TitleWrite, models::TitlePatch,
            models::Review, models::CreateReviewRequest, models::UpdateReviewRequest,
            models::Comment, models::CreateCommentRequest, models::UpdateCommentRequest,
        )
    ),
    tags(
        (name = "revu", description = "Creation Review Platform API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe,
/// and immutable container holding all essential application services and
/// configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Mail Layer: Abstracts delivery of signup confirmation codes.
    pub mailer: MailerState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers to selectively pull components from the
// shared AppState instead of receiving the whole container.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for MailerState {
    fn from_ref(app_state: &AppState) -> MailerState {
        app_state.mailer.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the `authenticated_routes`.
///
/// *Mechanism*: It attempts to extract `AuthUser` from the request. Since
/// `AuthUser` implements `FromRequestParts`, if authentication (JWT
/// validation, DB lookup) fails, the extractor immediately rejects the
/// request with a 401 Unauthorized status, preventing execution of the
/// handler. If successful, the request proceeds.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: Protected by the `auth_middleware`.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Admin Routes: Merged at the root so catalog writes share their
        // read paths. The admin/superuser role checks run *inside* the
        // handlers, which produce the correct 401 vs. 403 distinction.
        .merge(admin::admin_routes())
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in
                // a tracing span correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: returns x-request-id to the
                // client and injects it into subsequent service calls.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation. It extracts the
/// `x-request-id` header (if present) and includes it in the structured
/// logging metadata alongside the HTTP method and URI, so every log line for
/// a single request is correlated by a unique ID.
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
