use axum::{
    Json,
    extract::{Path, State},
    http::{Method, StatusCode},
};

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        self, Comment, CreateCommentRequest, CreateReviewRequest, Review, UpdateCommentRequest,
        UpdateReviewRequest,
    },
    permissions::{Policy, owns},
};

const FEEDBACK_POLICY: Policy = Policy::AdminModeratorAuthorOrReadOnly;

fn title_not_found() -> ApiError {
    ApiError::not_found("Title not found.")
}

fn review_not_found() -> ApiError {
    ApiError::not_found("Review not found.")
}

fn comment_not_found() -> ApiError {
    ApiError::not_found("Comment not found.")
}

fn require_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        Err(ApiError::validation("Text must not be empty."))
    } else {
        Ok(())
    }
}

/// Confirms the title exists before touching its nested resources.
async fn ensure_title(state: &AppState, title_id: i64) -> Result<(), ApiError> {
    state
        .repo
        .get_title(title_id)
        .await?
        .map(|_| ())
        .ok_or_else(title_not_found)
}

/// Resolves a review while verifying the full nesting chain: a review id
/// under the wrong title is a 404, not a leak of someone else's review.
async fn ensure_review(
    state: &AppState,
    title_id: i64,
    review_id: i64,
) -> Result<Review, ApiError> {
    ensure_title(state, title_id).await?;
    state
        .repo
        .get_review(title_id, review_id)
        .await?
        .ok_or_else(review_not_found)
}

// --- Reviews ---

/// list_reviews
///
/// [Public Route] All reviews for a title, oldest first.
#[utoipa::path(
    get,
    path = "/titles/{title_id}/reviews",
    params(("title_id" = i64, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Reviews", body = [Review]),
        (status = 404, description = "Title Not Found")
    )
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
) -> Result<Json<Vec<Review>>, ApiError> {
    ensure_title(&state, title_id).await?;
    Ok(Json(state.repo.list_reviews(title_id).await?))
}

/// get_review
///
/// [Public Route] A single review under a title.
#[utoipa::path(
    get,
    path = "/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Found", body = Review),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> Result<Json<Review>, ApiError> {
    let review = ensure_review(&state, title_id, review_id).await?;
    Ok(Json(review))
}

/// create_review
///
/// [Authenticated Route] Posts a review. At most one review per
/// (title, author): the repository pre-checks and the storage constraint
/// backs it up against concurrent submissions.
#[utoipa::path(
    post,
    path = "/titles/{title_id}/reviews",
    params(("title_id" = i64, Path, description = "Title ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Created", body = Review),
        (status = 400, description = "Duplicate review or bad score"),
        (status = 404, description = "Title Not Found")
    )
)]
pub async fn create_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    FEEDBACK_POLICY.check(&Method::POST, Some(&auth_user))?;
    require_text(&payload.text)?;
    models::validate_score(payload.score)?;
    ensure_title(&state, title_id).await?;

    let review = state
        .repo
        .create_review(title_id, auth_user.id, payload.text, payload.score)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// patch_review
///
/// [Authenticated Route] Partial review update, allowed for the author or
/// any moderator/admin.
#[utoipa::path(
    patch,
    path = "/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Updated", body = Review),
        (status = 403, description = "Not author nor moderator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn patch_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let review = ensure_review(&state, title_id, review_id).await?;
    FEEDBACK_POLICY.check_object(
        &Method::PATCH,
        Some(&auth_user),
        owns(&auth_user, review.author_id),
    )?;
    if let Some(text) = &payload.text {
        require_text(text)?;
    }
    if let Some(score) = payload.score {
        models::validate_score(score)?;
    }

    state
        .repo
        .update_review(title_id, review_id, payload.text, payload.score)
        .await?
        .map(Json)
        .ok_or_else(review_not_found)
}

/// delete_review
///
/// [Authenticated Route] Removes a review (author, moderator or admin).
#[utoipa::path(
    delete,
    path = "/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not author nor moderator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let review = ensure_review(&state, title_id, review_id).await?;
    FEEDBACK_POLICY.check_object(
        &Method::DELETE,
        Some(&auth_user),
        owns(&auth_user, review.author_id),
    )?;
    if state.repo.delete_review(title_id, review_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(review_not_found())
    }
}

// --- Comments ---

/// list_comments
///
/// [Public Route] All comments on a review, oldest first.
#[utoipa::path(
    get,
    path = "/titles/{title_id}/reviews/{review_id}/comments",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Comments", body = [Comment]),
        (status = 404, description = "Not Found")
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    ensure_review(&state, title_id, review_id).await?;
    Ok(Json(state.repo.list_comments(review_id).await?))
}

/// get_comment
///
/// [Public Route] A single comment under a review.
#[utoipa::path(
    get,
    path = "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Found", body = Comment),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> Result<Json<Comment>, ApiError> {
    ensure_review(&state, title_id, review_id).await?;
    state
        .repo
        .get_comment(review_id, comment_id)
        .await?
        .map(Json)
        .ok_or_else(comment_not_found)
}

/// create_comment
///
/// [Authenticated Route] Posts a comment on a review.
#[utoipa::path(
    post,
    path = "/titles/{title_id}/reviews/{review_id}/comments",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Created", body = Comment),
        (status = 404, description = "Not Found")
    )
)]
pub async fn create_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    FEEDBACK_POLICY.check(&Method::POST, Some(&auth_user))?;
    require_text(&payload.text)?;
    ensure_review(&state, title_id, review_id).await?;

    let comment = state
        .repo
        .create_comment(review_id, auth_user.id, payload.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// patch_comment
///
/// [Authenticated Route] Edits a comment (author, moderator or admin).
#[utoipa::path(
    patch,
    path = "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 403, description = "Not author nor moderator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn patch_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    ensure_review(&state, title_id, review_id).await?;
    let comment = state
        .repo
        .get_comment(review_id, comment_id)
        .await?
        .ok_or_else(comment_not_found)?;
    FEEDBACK_POLICY.check_object(
        &Method::PATCH,
        Some(&auth_user),
        owns(&auth_user, comment.author_id),
    )?;

    let text = match payload.text {
        Some(text) => {
            require_text(&text)?;
            text
        }
        // Nothing to change; echo the current state.
        None => return Ok(Json(comment)),
    };

    state
        .repo
        .update_comment(review_id, comment_id, text)
        .await?
        .map(Json)
        .ok_or_else(comment_not_found)
}

/// delete_comment
///
/// [Authenticated Route] Removes a comment. A requester who is neither the
/// author nor a moderator/admin is refused by the evaluator.
#[utoipa::path(
    delete,
    path = "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = i64, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not author nor moderator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> Result<StatusCode, ApiError> {
    ensure_review(&state, title_id, review_id).await?;
    let comment = state
        .repo
        .get_comment(review_id, comment_id)
        .await?
        .ok_or_else(comment_not_found)?;
    FEEDBACK_POLICY.check_object(
        &Method::DELETE,
        Some(&auth_user),
        owns(&auth_user, comment.author_id),
    )?;

    if state.repo.delete_comment(review_id, comment_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(comment_not_found())
    }
}
