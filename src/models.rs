use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

// --- Field bounds (mirrored in the database schema) ---

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const NAME_MAX_LEN: usize = 256;
pub const SLUG_MAX_LEN: usize = 50;
pub const SCORE_MIN: i16 = 1;
pub const SCORE_MAX: i16 = 10;

// --- Core Application Schemas (Mapped to Database) ---

/// UserRole
///
/// The closed three-tier role enumeration backing all permission checks.
/// Stored as the `user_role` Postgres enum; kept as a tagged Rust enum so a
/// typo'd role string cannot compile, let alone reach the evaluator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum UserRole {
    #[default]
    User,
    Moderator,
    Admin,
}

impl UserRole {
    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }

    /// Moderators and admins may edit or remove other authors' feedback.
    pub fn can_moderate(self) -> bool {
        matches!(self, Self::Admin | Self::Moderator)
    }
}

/// User
///
/// Canonical identity record from the `users` table. The confirmation-code
/// hash never leaves the server: it is excluded from serialization entirely
/// and only compared inside the auth module.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: UserRole,
    // Out-of-band flag granting full access regardless of role.
    pub is_superuser: bool,
    // Set once the confirmation code has been exchanged for a token.
    pub email_confirmed: bool,
    #[serde(skip)]
    #[ts(skip)]
    #[schema(ignore)]
    pub confirmation_code_hash: Option<String>,
}

/// UserProfile
///
/// The outward projection of a user record used by every `/users` endpoint.
/// Matches the original API contract: no id, no superuser flag, no
/// confirmation state.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: UserRole,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone(),
            role: user.role,
        }
    }
}

/// Category
///
/// A slug-keyed grouping a title belongs to (one per title).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Genre
///
/// A slug-keyed tag; titles carry any number of them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Title
///
/// Raw database row for a reviewable work. Handlers never return this
/// directly; reads go through [`TitleRead`] which embeds the category,
/// genres and the computed rating.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Title {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    // Nullable: deleting a category detaches its titles instead of cascading.
    pub category_id: Option<i64>,
}

/// TitleRead
///
/// Read projection of a title: embedded category/genre objects plus the
/// rating, which is the mean of all review scores recomputed at read time.
/// A title with no reviews has `rating: null`, not zero.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TitleRead {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub genre: Vec<Genre>,
    pub category: Option<Category>,
}

/// Review
///
/// A review row joined with its author's username for serialization. The
/// `author_id` stays present for ownership checks but the wire format shows
/// the username, matching the original contract.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Review {
    pub id: i64,
    pub title_id: i64,
    #[serde(skip)]
    #[ts(skip)]
    #[schema(ignore)]
    pub author_id: Uuid,
    // Loaded via a JOIN with users.
    pub author: String,
    pub text: String,
    pub score: i16,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
}

/// Comment
///
/// A comment on a review, joined with its author's username.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub review_id: i64,
    #[serde(skip)]
    #[ts(skip)]
    #[schema(ignore)]
    pub author_id: Uuid,
    pub author: String,
    pub text: String,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// SignupRequest
///
/// Input for POST /auth/signup. No password anywhere in the system: the
/// emailed confirmation code is the only shared secret.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
}

/// TokenRequest
///
/// Input for POST /auth/token: exchanges the emailed code for an access token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenRequest {
    pub username: String,
    pub confirmation_code: String,
}

/// TokenResponse
///
/// Output of a successful token exchange.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
}

/// CreateUserRequest
///
/// Admin-only user creation (POST /users). Accounts created this way are
/// confirmed immediately; the signup/confirmation dance is for self-service.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

/// UpdateUserRequest
///
/// Admin patch for any account (PATCH /users/{username}). All fields
/// optional; only provided fields change. An explicit JSON `null` is
/// indistinguishable from an absent field and keeps the stored value;
/// fields cannot be cleared through PATCH.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

/// UpdateProfileRequest
///
/// Self-service patch (PATCH /users/me). A `role` field is accepted in the
/// payload but silently discarded unless the caller is an admin; username
/// and email are never changeable here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

/// CreateCategoryRequest
///
/// Shared input shape for POST /categories and POST /genres.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
}

/// TitleWrite
///
/// Write projection for POST /titles: category and genres arrive as slugs
/// and are resolved against the catalog before insertion.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TitleWrite {
    pub name: String,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub genre: Vec<String>,
    pub category: String,
}

/// TitlePatch
///
/// Partial update for PATCH /titles/{id}. A present `genre` list replaces
/// the full genre set. As with the other patch payloads, `null` reads as
/// absent: a field keeps its stored value and cannot be cleared here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TitlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// CreateReviewRequest
///
/// Input for POST /titles/{id}/reviews.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateReviewRequest {
    pub text: String,
    pub score: i16,
}

/// UpdateReviewRequest
///
/// Partial update for PATCH /titles/{id}/reviews/{rid}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i16>,
}

/// CreateCommentRequest
///
/// Input for POST .../comments.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// UpdateCommentRequest
///
/// Partial update for PATCH .../comments/{cid}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCommentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// --- Validation Helpers ---

/// Rejects empty, overlong or malformed usernames and the reserved name
/// `me` (case-insensitive), which would collide with the /users/me route.
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::validation("Username must not be empty."));
    }
    if username.len() > USERNAME_MAX_LEN {
        return Err(ApiError::validation(format!(
            "Username must not exceed {USERNAME_MAX_LEN} characters."
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return Err(ApiError::validation(
            "Username may only contain letters, digits and @/./+/-/_ characters.",
        ));
    }
    if username.eq_ignore_ascii_case("me") {
        return Err(ApiError::validation("The name 'me' is not allowed."));
    }
    Ok(())
}

/// Very light structural email check; real deliverability is proven by the
/// confirmation-code exchange, not by parsing.
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() || email.len() > EMAIL_MAX_LEN {
        return Err(ApiError::validation(format!(
            "Email must be 1..={EMAIL_MAX_LEN} characters."
        )));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ApiError::validation("Enter a valid email address."));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::validation("Enter a valid email address."));
    }
    Ok(())
}

pub fn validate_score(score: i16) -> Result<(), ApiError> {
    if !(SCORE_MIN..=SCORE_MAX).contains(&score) {
        return Err(ApiError::validation(format!(
            "Rate the creation from {SCORE_MIN} to {SCORE_MAX}."
        )));
    }
    Ok(())
}

/// Release years may not lie in the future.
pub fn validate_year(year: i32) -> Result<(), ApiError> {
    let current = Utc::now().year();
    if year > current {
        return Err(ApiError::validation(format!(
            "Release year must not exceed {current}."
        )));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), ApiError> {
    if slug.is_empty() || slug.len() > SLUG_MAX_LEN {
        return Err(ApiError::validation(format!(
            "Slug must be 1..={SLUG_MAX_LEN} characters."
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::validation(
            "Slug may only contain letters, digits, hyphens and underscores.",
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > NAME_MAX_LEN {
        return Err(ApiError::validation(format!(
            "Name must be 1..={NAME_MAX_LEN} characters."
        )));
    }
    Ok(())
}

/// Arithmetic mean of review scores. No reviews means no rating at all,
/// never a rating of zero.
pub fn mean_score(scores: &[i16]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: i64 = scores.iter().map(|s| i64::from(*s)).sum();
    Some(sum as f64 / scores.len() as f64)
}
