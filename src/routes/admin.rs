use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

/// Admin Router Module
///
/// Catalog mutation and the /users directory. These routes are not gated by
/// a middleware layer; each handler extracts `AuthUser` itself and runs the
/// admin-or-readonly / admin-or-superuser policy so that failures surface as
/// 401 vs. 403 exactly like the object-level checks elsewhere.
pub fn admin_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // Category and genre writes. Reads live in the public router.
        .route("/categories", post(handlers::catalog::create_category))
        .route(
            "/categories/{slug}",
            delete(handlers::catalog::delete_category),
        )
        .route("/genres", post(handlers::catalog::create_genre))
        .route("/genres/{slug}", delete(handlers::catalog::delete_genre))
        // Title writes.
        .route("/titles", post(handlers::catalog::create_title))
        .route(
            "/titles/{title_id}",
            patch(handlers::catalog::patch_title).delete(handlers::catalog::delete_title),
        )
        // User directory, admin or superuser only.
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/{username}",
            get(handlers::users::get_user)
                .patch(handlers::users::patch_user)
                .delete(handlers::users::delete_user),
        )
}
