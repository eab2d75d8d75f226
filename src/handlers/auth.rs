use axum::{Json, extract::State};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{
        CONFIRMATION_CODE_LEN, create_token, generate_confirmation_code, hash_confirmation_code,
        verify_confirmation_code,
    },
    error::ApiError,
    models::{self, SignupRequest, TokenRequest, TokenResponse, User},
};

/// signup
///
/// [Public Route] Registers an account (or re-issues a code for a pending
/// one) and emails a one-time confirmation code. There are no passwords:
/// the code is the only shared secret in the system.
///
/// Reuse policy: a (username, email) pair matching an *unconfirmed* account
/// re-issues a fresh code on that account. Any collision with a confirmed
/// account, or a partial collision with some other account, is a 400.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Confirmation code issued", body = SignupRequest),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<SignupRequest>, ApiError> {
    models::validate_username(&payload.username)?;
    models::validate_email(&payload.email)?;

    let by_username = state.repo.get_user_by_username(&payload.username).await?;
    let by_email = state.repo.get_user_by_email(&payload.email).await?;

    // The plaintext code exists only in this scope and in the outgoing mail;
    // the store keeps nothing but the salted hash.
    let code = generate_confirmation_code();
    let code_hash = hash_confirmation_code(&code)?;

    let user = match (by_username, by_email) {
        // Exact re-signup of a pending account: refresh the code.
        (Some(u), Some(e)) if u.id == e.id && !u.email_confirmed => {
            state.repo.set_confirmation_hash(u.id, &code_hash).await?;
            u
        }
        (Some(u), _) if u.email_confirmed => {
            return Err(ApiError::validation(format!(
                "User named '{}' already exists.",
                payload.username
            )));
        }
        (_, Some(e)) if e.email_confirmed => {
            return Err(ApiError::validation(format!(
                "Another user is already using mail: {}.",
                payload.email
            )));
        }
        (None, None) => {
            state
                .repo
                .create_user(User {
                    id: Uuid::new_v4(),
                    username: payload.username.clone(),
                    email: payload.email.clone(),
                    confirmation_code_hash: Some(code_hash),
                    ..User::default()
                })
                .await?
        }
        // Username or email is held by a *different* pending account;
        // refusing avoids silently hijacking someone else's signup.
        _ => {
            return Err(ApiError::validation(
                "Username or email is already taken by another pending signup.",
            ));
        }
    };

    state
        .mailer
        .send_confirmation_code(&user.email, &user.username, &code)
        .await?;

    tracing::info!(username = %user.username, "confirmation code issued");
    Ok(Json(payload))
}

/// get_token
///
/// [Public Route] Exchanges a confirmation code for an access token.
/// Unknown username is a 404; a wrong code is a 400 that does not reveal
/// anything beyond "incorrect". Success marks the account confirmed.
#[utoipa::path(
    post,
    path = "/auth/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Access token", body = TokenResponse),
        (status = 400, description = "Incorrect confirmation code"),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn get_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if payload.confirmation_code.len() < CONFIRMATION_CODE_LEN {
        return Err(ApiError::validation(format!(
            "Ensure that confirmation code contains {CONFIRMATION_CODE_LEN} characters."
        )));
    }

    let user = state
        .repo
        .get_user_by_username(&payload.username)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!(
                "The user named '{}' does not exist.",
                payload.username
            ))
        })?;

    // Accounts created by admins (or that never signed up) have no hash;
    // for the caller that is indistinguishable from a wrong code.
    let stored_hash = user
        .confirmation_code_hash
        .as_deref()
        .ok_or_else(|| ApiError::validation("Confirmation code is incorrect."))?;

    if !verify_confirmation_code(&payload.confirmation_code, stored_hash)? {
        return Err(ApiError::validation("Confirmation code is incorrect."));
    }

    state.repo.confirm_user(user.id).await?;
    let access_token = create_token(user.id, &state.config)?;

    tracing::info!(username = %user.username, "access token issued");
    Ok(Json(TokenResponse { access_token }))
}
