use axum::{
    Json,
    extract::{Path, Query, State},
    http::{Method, StatusCode},
};
use serde::Deserialize;

use super::SearchFilter;
use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{self, Category, CreateCategoryRequest, Genre, TitlePatch, TitleRead, TitleWrite},
    permissions::Policy,
};

const CATALOG_POLICY: Policy = Policy::AdminOrReadOnly;

/// TitleFilter
///
/// Accepted query parameters for GET /titles. Category and genre filter by
/// slug, matching the slug-based write projection.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct TitleFilter {
    /// Substring match on the title name.
    pub name: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Genre slug.
    pub genre: Option<String>,
    /// Exact release year.
    pub year: Option<i32>,
}

// --- Categories ---

/// list_categories
///
/// [Public Route] All categories, optionally filtered by name search.
#[utoipa::path(
    get,
    path = "/categories",
    params(SearchFilter),
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(filter): Query<SearchFilter>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.repo.list_categories(filter.search).await?))
}

/// create_category
///
/// [Admin Route] Adds a category. Slug uniqueness is enforced by the store.
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    CATALOG_POLICY.check(&Method::POST, Some(&auth_user))?;
    models::validate_name(&payload.name)?;
    models::validate_slug(&payload.slug)?;
    let category = state.repo.create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// delete_category
///
/// [Admin Route] Removes a category by slug; titles referencing it keep
/// existing with a null category.
#[utoipa::path(
    delete,
    path = "/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    CATALOG_POLICY.check(&Method::DELETE, Some(&auth_user))?;
    if state.repo.delete_category(&slug).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Category '{slug}' not found.")))
    }
}

// --- Genres ---

/// list_genres
///
/// [Public Route] All genres, optionally filtered by name search.
#[utoipa::path(
    get,
    path = "/genres",
    params(SearchFilter),
    responses((status = 200, description = "Genres", body = [Genre]))
)]
pub async fn list_genres(
    State(state): State<AppState>,
    Query(filter): Query<SearchFilter>,
) -> Result<Json<Vec<Genre>>, ApiError> {
    Ok(Json(state.repo.list_genres(filter.search).await?))
}

/// create_genre
///
/// [Admin Route] Adds a genre.
#[utoipa::path(
    post,
    path = "/genres",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = Genre),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_genre(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Genre>), ApiError> {
    CATALOG_POLICY.check(&Method::POST, Some(&auth_user))?;
    models::validate_name(&payload.name)?;
    models::validate_slug(&payload.slug)?;
    let genre = state.repo.create_genre(payload).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// delete_genre
///
/// [Admin Route] Removes a genre by slug and its title associations.
#[utoipa::path(
    delete,
    path = "/genres/{slug}",
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_genre(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    CATALOG_POLICY.check(&Method::DELETE, Some(&auth_user))?;
    if state.repo.delete_genre(&slug).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Genre '{slug}' not found.")))
    }
}

// --- Titles ---

/// list_titles
///
/// [Public Route] Lists titles with name/category/genre/year filters. Each
/// entry carries the rating recomputed from current review scores.
#[utoipa::path(
    get,
    path = "/titles",
    params(TitleFilter),
    responses((status = 200, description = "Titles", body = [TitleRead]))
)]
pub async fn list_titles(
    State(state): State<AppState>,
    Query(filter): Query<TitleFilter>,
) -> Result<Json<Vec<TitleRead>>, ApiError> {
    let titles = state
        .repo
        .list_titles(filter.name, filter.category, filter.genre, filter.year)
        .await?;
    Ok(Json(titles))
}

/// get_title
///
/// [Public Route] A single title with embedded category, genres and rating.
#[utoipa::path(
    get,
    path = "/titles/{title_id}",
    params(("title_id" = i64, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Found", body = TitleRead),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_title(
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
) -> Result<Json<TitleRead>, ApiError> {
    state
        .repo
        .get_title(title_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Title not found."))
}

/// create_title
///
/// [Admin Route] Adds a title; category and genres are provided as slugs
/// and resolved against the catalog.
#[utoipa::path(
    post,
    path = "/titles",
    request_body = TitleWrite,
    responses(
        (status = 201, description = "Created", body = TitleRead),
        (status = 400, description = "Validation failure or unknown slug")
    )
)]
pub async fn create_title(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<TitleWrite>,
) -> Result<(StatusCode, Json<TitleRead>), ApiError> {
    CATALOG_POLICY.check(&Method::POST, Some(&auth_user))?;
    models::validate_name(&payload.name)?;
    models::validate_year(payload.year)?;
    let title = state.repo.create_title(payload).await?;
    Ok((StatusCode::CREATED, Json(title)))
}

/// patch_title
///
/// [Admin Route] Partial update; a provided genre list replaces the set.
#[utoipa::path(
    patch,
    path = "/titles/{title_id}",
    params(("title_id" = i64, Path, description = "Title ID")),
    request_body = TitlePatch,
    responses(
        (status = 200, description = "Updated", body = TitleRead),
        (status = 404, description = "Not Found")
    )
)]
pub async fn patch_title(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
    Json(payload): Json<TitlePatch>,
) -> Result<Json<TitleRead>, ApiError> {
    CATALOG_POLICY.check(&Method::PATCH, Some(&auth_user))?;
    if let Some(name) = &payload.name {
        models::validate_name(name)?;
    }
    if let Some(year) = payload.year {
        models::validate_year(year)?;
    }
    state
        .repo
        .update_title(title_id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Title not found."))
}

/// delete_title
///
/// [Admin Route] Removes a title and, via cascade, its reviews and comments.
#[utoipa::path(
    delete,
    path = "/titles/{title_id}",
    params(("title_id" = i64, Path, description = "Title ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_title(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    CATALOG_POLICY.check(&Method::DELETE, Some(&auth_user))?;
    if state.repo.delete_title(title_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Title not found."))
    }
}
