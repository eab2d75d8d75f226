use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Routes for any user who passed the authentication layer: self-service
/// profile access and all feedback writes. Object-level rights (author vs.
/// moderator vs. admin) are decided inside the handlers by the Permission
/// Evaluator; this layer only guarantees a resolved `AuthUser`.
///
/// No PUT is registered anywhere on this API; partial updates are PATCH by
/// design.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/PATCH /users/me
        // Own profile; role changes are dropped for non-admins inside the
        // handler rather than rejected.
        .route(
            "/users/me",
            get(handlers::users::get_me).patch(handlers::users::patch_me),
        )
        // POST /titles/{title_id}/reviews
        // One review per (title, author); duplicates rejected.
        .route(
            "/titles/{title_id}/reviews",
            post(handlers::feedback::create_review),
        )
        // PATCH/DELETE /titles/{title_id}/reviews/{review_id}
        // Author-or-moderator rule enforced object-level.
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            patch(handlers::feedback::patch_review).delete(handlers::feedback::delete_review),
        )
        // Comment writes under a review, same permission rule.
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            post(handlers::feedback::create_comment),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
            patch(handlers::feedback::patch_comment).delete(handlers::feedback::delete_comment),
        )
}
