use axum::{
    Json,
    extract::{Path, Query, State},
    http::{Method, StatusCode},
};
use uuid::Uuid;

use super::SearchFilter;
use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        self, CreateUserRequest, UpdateProfileRequest, UpdateUserRequest, User, UserProfile,
    },
    permissions::Policy,
};

const USERS_POLICY: Policy = Policy::AdminOrSuperuser;

fn unknown_user(username: &str) -> ApiError {
    ApiError::not_found(format!("The user named '{username}' does not exist."))
}

/// get_me
///
/// [Authenticated Route] The requester's own profile, fetched fresh so a
/// concurrent admin edit is reflected immediately.
#[utoipa::path(
    get,
    path = "/users/me",
    responses((status = 200, description = "Own profile", body = UserProfile))
)]
pub async fn get_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .repo
        .get_user_by_id(auth_user.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists."))?;
    Ok(Json(UserProfile::from(&user)))
}

/// patch_me
///
/// [Authenticated Route] Self-service profile update. Username and email
/// are never changeable here, and a `role` field in the payload is silently
/// discarded unless the requester is an admin.
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated profile", body = UserProfile))
)]
pub async fn patch_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let role = if auth_user.role.is_admin() {
        payload.role
    } else {
        // Non-admins cannot promote themselves; the field is dropped, not
        // rejected, matching the original contract.
        None
    };

    let updated = state
        .repo
        .update_user(
            auth_user.id,
            UpdateUserRequest {
                email: None,
                first_name: payload.first_name,
                last_name: payload.last_name,
                bio: payload.bio,
                role,
            },
        )
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists."))?;

    Ok(Json(UserProfile::from(&updated)))
}

/// list_users
///
/// [Admin Route] Directory listing with username search. The strict policy
/// gates reads as well: this endpoint exposes every account.
#[utoipa::path(
    get,
    path = "/users",
    params(SearchFilter),
    responses((status = 200, description = "All users", body = [UserProfile]))
)]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<SearchFilter>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    USERS_POLICY.check(&Method::GET, Some(&auth_user))?;
    let users = state.repo.list_users(filter.search).await?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

/// create_user
///
/// [Admin Route] Direct account creation. Accounts made this way are
/// confirmed immediately; the signup/confirmation dance is for self-service.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = UserProfile),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    USERS_POLICY.check(&Method::POST, Some(&auth_user))?;
    models::validate_username(&payload.username)?;
    models::validate_email(&payload.email)?;

    let created = state
        .repo
        .create_user(User {
            id: Uuid::new_v4(),
            username: payload.username,
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            bio: payload.bio,
            role: payload.role.unwrap_or_default(),
            email_confirmed: true,
            ..User::default()
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserProfile::from(&created))))
}

/// get_user
///
/// [Admin Route] A single account by username.
#[utoipa::path(
    get,
    path = "/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    responses(
        (status = 200, description = "Found", body = UserProfile),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    USERS_POLICY.check(&Method::GET, Some(&auth_user))?;
    let user = state
        .repo
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| unknown_user(&username))?;
    Ok(Json(UserProfile::from(&user)))
}

/// patch_user
///
/// [Admin Route] Partial update of any account, with one carve-out:
/// superuser accounts cannot be modified through this path at all.
#[utoipa::path(
    patch,
    path = "/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserProfile),
        (status = 400, description = "Superuser account or bad payload"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn patch_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    USERS_POLICY.check(&Method::PATCH, Some(&auth_user))?;

    let target = state
        .repo
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| unknown_user(&username))?;

    if target.is_superuser {
        return Err(ApiError::validation(format!(
            "You do not have permission to modify user data: {username}"
        )));
    }
    if let Some(email) = &payload.email {
        models::validate_email(email)?;
    }

    let updated = state
        .repo
        .update_user(target.id, payload)
        .await?
        .ok_or_else(|| unknown_user(&username))?;

    Ok(Json(UserProfile::from(&updated)))
}

/// delete_user
///
/// [Admin Route] Removes an account (cascading to its reviews and
/// comments). Superuser accounts are off-limits here as well.
#[utoipa::path(
    delete,
    path = "/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Superuser account"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    USERS_POLICY.check(&Method::DELETE, Some(&auth_user))?;

    let target = state
        .repo
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| unknown_user(&username))?;

    if target.is_superuser {
        return Err(ApiError::validation(format!(
            "You do not have permission to modify user data: {username}"
        )));
    }

    if state.repo.delete_user(&username).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(unknown_user(&username))
    }
}
