use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints accessible to any client, anonymous or logged-in: the signup
/// and token-exchange gateway plus every read-only view of the catalog and
/// feedback stores. The permission policies treat GET/HEAD/OPTIONS as safe,
/// so no extractor or middleware is involved here.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness check for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/signup
        // Issues (or re-issues) an emailed confirmation code.
        .route("/auth/signup", post(handlers::auth::signup))
        // POST /auth/token
        // Exchanges a confirmation code for an access token.
        .route("/auth/token", post(handlers::auth::get_token))
        // GET /categories?search= and GET /genres?search=
        .route("/categories", get(handlers::catalog::list_categories))
        .route("/genres", get(handlers::catalog::list_genres))
        // GET /titles?name=&category=&genre=&year=
        // Listing with filters; every entry carries the computed rating.
        .route("/titles", get(handlers::catalog::list_titles))
        .route("/titles/{title_id}", get(handlers::catalog::get_title))
        // Reviews and comments are world-readable.
        .route(
            "/titles/{title_id}/reviews",
            get(handlers::feedback::list_reviews),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            get(handlers::feedback::get_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            get(handlers::feedback::list_comments),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
            get(handlers::feedback::get_comment),
        )
}
