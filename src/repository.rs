use crate::error::ApiError;
use crate::models::{
    Category, Comment, CreateCategoryRequest, Genre, Review, TitlePatch, TitleRead, TitleWrite,
    UpdateUserRequest, User,
};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool, query_builder::QueryBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const DUPLICATE_REVIEW_MSG: &str = "You can only leave one review for this creation.";

/// Repository Trait
///
/// Abstract contract for all persistence operations, so handlers talk to the
/// data layer without knowing the implementation (Postgres in production, an
/// in-memory mock in tests).
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Repository>`)
/// safely shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- User Directory ---
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    // Admin listing with username search.
    async fn list_users(&self, search: Option<String>) -> Result<Vec<User>, ApiError>;
    // Inserts the fully-assembled row; username/email uniqueness is enforced
    // by the schema and surfaces as a validation error.
    async fn create_user(&self, user: User) -> Result<User, ApiError>;
    // COALESCE-based partial update; returns None if the account is gone.
    async fn update_user(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, ApiError>;
    // Stores a fresh confirmation-code hash (signup re-issue path).
    async fn set_confirmation_hash(&self, id: Uuid, code_hash: &str) -> Result<(), ApiError>;
    // Marks the account confirmed after a successful token exchange.
    async fn confirm_user(&self, id: Uuid) -> Result<(), ApiError>;
    async fn delete_user(&self, username: &str) -> Result<bool, ApiError>;

    // --- Catalog: categories & genres ---
    async fn list_categories(&self, search: Option<String>) -> Result<Vec<Category>, ApiError>;
    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, ApiError>;
    async fn delete_category(&self, slug: &str) -> Result<bool, ApiError>;
    async fn list_genres(&self, search: Option<String>) -> Result<Vec<Genre>, ApiError>;
    async fn create_genre(&self, req: CreateCategoryRequest) -> Result<Genre, ApiError>;
    async fn delete_genre(&self, slug: &str) -> Result<bool, ApiError>;

    // --- Catalog: titles ---
    // Filtering by name substring, category slug, genre slug and year.
    // Rating is recomputed at read time; no reviews yields None.
    async fn list_titles(
        &self,
        name: Option<String>,
        category: Option<String>,
        genre: Option<String>,
        year: Option<i32>,
    ) -> Result<Vec<TitleRead>, ApiError>;
    async fn get_title(&self, id: i64) -> Result<Option<TitleRead>, ApiError>;
    // Write projection: category and genres arrive as slugs; an unknown slug
    // is a validation error.
    async fn create_title(&self, req: TitleWrite) -> Result<TitleRead, ApiError>;
    async fn update_title(&self, id: i64, req: TitlePatch) -> Result<Option<TitleRead>, ApiError>;
    async fn delete_title(&self, id: i64) -> Result<bool, ApiError>;

    // --- Feedback: reviews ---
    async fn list_reviews(&self, title_id: i64) -> Result<Vec<Review>, ApiError>;
    async fn get_review(&self, title_id: i64, review_id: i64) -> Result<Option<Review>, ApiError>;
    // Rejects a second review by the same author on the same title; the DB
    // uniqueness constraint backs up the pre-check against races.
    async fn create_review(
        &self,
        title_id: i64,
        author_id: Uuid,
        text: String,
        score: i16,
    ) -> Result<Review, ApiError>;
    async fn update_review(
        &self,
        title_id: i64,
        review_id: i64,
        text: Option<String>,
        score: Option<i16>,
    ) -> Result<Option<Review>, ApiError>;
    async fn delete_review(&self, title_id: i64, review_id: i64) -> Result<bool, ApiError>;

    // --- Feedback: comments ---
    async fn list_comments(&self, review_id: i64) -> Result<Vec<Comment>, ApiError>;
    async fn get_comment(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, ApiError>;
    async fn create_comment(
        &self,
        review_id: i64,
        author_id: Uuid,
        text: String,
    ) -> Result<Comment, ApiError>;
    async fn update_comment(
        &self,
        review_id: i64,
        comment_id: i64,
        text: String,
    ) -> Result<Option<Comment>, ApiError>;
    async fn delete_comment(&self, review_id: i64, comment_id: i64) -> Result<bool, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by
/// PostgreSQL. All queries are runtime-checked so the crate builds without a
/// live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Intermediate row for the title read projection before category/genres are
// attached.
#[derive(Debug, FromRow)]
struct TitleRatingRow {
    id: i64,
    name: String,
    year: i32,
    description: Option<String>,
    category_id: Option<i64>,
    rating: Option<f64>,
}

#[derive(Debug, FromRow)]
struct TitleGenreRow {
    title_id: i64,
    id: i64,
    name: String,
    slug: String,
}

const USER_COLS: &str = "id, username, email, first_name, last_name, bio, role, \
     is_superuser, email_confirmed, confirmation_code_hash";

const REVIEW_SELECT: &str = "SELECT r.id, r.title_id, r.author_id, u.username AS author, \
     r.text, r.score, r.pub_date FROM reviews r JOIN users u ON u.id = r.author_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.review_id, c.author_id, u.username AS author, \
     c.text, c.pub_date FROM comments c JOIN users u ON u.id = c.author_id";

impl PostgresRepository {
    /// Attaches categories and genres to a batch of title rows in two
    /// queries instead of one per title.
    async fn assemble_titles(
        &self,
        rows: Vec<TitleRatingRow>,
    ) -> Result<Vec<TitleRead>, ApiError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let title_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let category_ids: Vec<i64> = rows.iter().filter_map(|r| r.category_id).collect();

        let categories: Vec<Category> = if category_ids.is_empty() {
            vec![]
        } else {
            sqlx::query_as::<_, Category>(
                "SELECT id, name, slug FROM categories WHERE id = ANY($1)",
            )
            .bind(&category_ids)
            .fetch_all(&self.pool)
            .await?
        };
        let categories_by_id: HashMap<i64, Category> =
            categories.into_iter().map(|c| (c.id, c)).collect();

        let genre_rows: Vec<TitleGenreRow> = sqlx::query_as::<_, TitleGenreRow>(
            "SELECT tg.title_id, g.id, g.name, g.slug \
             FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
             WHERE tg.title_id = ANY($1) ORDER BY g.name, g.slug",
        )
        .bind(&title_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut genres_by_title: HashMap<i64, Vec<Genre>> = HashMap::new();
        for row in genre_rows {
            genres_by_title.entry(row.title_id).or_default().push(Genre {
                id: row.id,
                name: row.name,
                slug: row.slug,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| TitleRead {
                id: row.id,
                name: row.name,
                year: row.year,
                rating: row.rating,
                description: row.description,
                genre: genres_by_title.remove(&row.id).unwrap_or_default(),
                category: row
                    .category_id
                    .and_then(|cid| categories_by_id.get(&cid).cloned()),
            })
            .collect())
    }

    /// Resolves genre slugs to ids, preserving input order. Unknown slugs
    /// are a validation error, matching the slug-related write projection.
    async fn resolve_genre_slugs(&self, slugs: &[String]) -> Result<Vec<i64>, ApiError> {
        let mut ids = Vec::with_capacity(slugs.len());
        for slug in slugs {
            let id: Option<i64> = sqlx::query_scalar("SELECT id FROM genres WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
            ids.push(id.ok_or_else(|| {
                ApiError::validation(format!("Unknown genre slug: '{slug}'."))
            })?);
        }
        Ok(ids)
    }

    async fn resolve_category_slug(&self, slug: &str) -> Result<i64, ApiError> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::validation(format!("Unknown category slug: '{slug}'.")))
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- User Directory ---

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// list_users
    ///
    /// Administrative listing with an optional case-insensitive username
    /// search, parameterized through QueryBuilder.
    async fn list_users(&self, search: Option<String>) -> Result<Vec<User>, ApiError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLS} FROM users"));

        if let Some(s) = search {
            builder.push(" WHERE username ILIKE ");
            builder.push_bind(format!("%{s}%"));
        }
        builder.push(" ORDER BY username");

        let users = builder.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn create_user(&self, user: User) -> Result<User, ApiError> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, first_name, last_name, bio, role, \
                                is_superuser, email_confirmed, confirmation_code_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {USER_COLS}"
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.bio)
        .bind(user.role)
        .bind(user.is_superuser)
        .bind(user.email_confirmed)
        .bind(&user.confirmation_code_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            ApiError::from_sqlx_with_conflict(e, "A user with this username or email already exists.")
        })?;
        Ok(created)
    }

    /// update_user
    ///
    /// Partial update using COALESCE so only provided fields change.
    async fn update_user(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, ApiError> {
        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                email = COALESCE($2, email), \
                first_name = COALESCE($3, first_name), \
                last_name = COALESCE($4, last_name), \
                bio = COALESCE($5, bio), \
                role = COALESCE($6, role) \
             WHERE id = $1 \
             RETURNING {USER_COLS}"
        ))
        .bind(id)
        .bind(&req.email)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.bio)
        .bind(req.role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            ApiError::from_sqlx_with_conflict(e, "Another user is already using this email.")
        })?;
        Ok(updated)
    }

    async fn set_confirmation_hash(&self, id: Uuid, code_hash: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET confirmation_code_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(code_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn confirm_user(&self, id: Uuid) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET email_confirmed = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Catalog: categories & genres ---

    async fn list_categories(&self, search: Option<String>) -> Result<Vec<Category>, ApiError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT id, name, slug FROM categories");
        if let Some(s) = search {
            builder.push(" WHERE name ILIKE ");
            builder.push_bind(format!("%{s}%"));
        }
        builder.push(" ORDER BY name, slug");
        let categories = builder
            .build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, ApiError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(&req.name)
        .bind(&req.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            ApiError::from_sqlx_with_conflict(e, "A category with this slug already exists.")
        })?;
        Ok(category)
    }

    async fn delete_category(&self, slug: &str) -> Result<bool, ApiError> {
        // Titles keep existing with a null category (ON DELETE SET NULL).
        let result = sqlx::query("DELETE FROM categories WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_genres(&self, search: Option<String>) -> Result<Vec<Genre>, ApiError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT id, name, slug FROM genres");
        if let Some(s) = search {
            builder.push(" WHERE name ILIKE ");
            builder.push_bind(format!("%{s}%"));
        }
        builder.push(" ORDER BY name, slug");
        let genres = builder
            .build_query_as::<Genre>()
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn create_genre(&self, req: CreateCategoryRequest) -> Result<Genre, ApiError> {
        let genre = sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(&req.name)
        .bind(&req.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            ApiError::from_sqlx_with_conflict(e, "A genre with this slug already exists.")
        })?;
        Ok(genre)
    }

    async fn delete_genre(&self, slug: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM genres WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Catalog: titles ---

    /// list_titles
    ///
    /// Flexible filtering via QueryBuilder with safe parameterization. The
    /// slug filters use EXISTS subqueries so joining genres cannot duplicate
    /// review rows and skew the AVG.
    async fn list_titles(
        &self,
        name: Option<String>,
        category: Option<String>,
        genre: Option<String>,
        year: Option<i32>,
    ) -> Result<Vec<TitleRead>, ApiError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT t.id, t.name, t.year, t.description, t.category_id, \
                    AVG(r.score)::float8 AS rating \
             FROM titles t \
             LEFT JOIN reviews r ON r.title_id = t.id \
             WHERE true ",
        );

        if let Some(n) = name {
            builder.push(" AND t.name ILIKE ");
            builder.push_bind(format!("%{n}%"));
        }
        if let Some(y) = year {
            builder.push(" AND t.year = ");
            builder.push_bind(y);
        }
        if let Some(c) = category {
            builder.push(
                " AND EXISTS (SELECT 1 FROM categories c \
                   WHERE c.id = t.category_id AND c.slug = ",
            );
            builder.push_bind(c);
            builder.push(")");
        }
        if let Some(g) = genre {
            builder.push(
                " AND EXISTS (SELECT 1 FROM title_genres tg \
                   JOIN genres g ON g.id = tg.genre_id \
                   WHERE tg.title_id = t.id AND g.slug = ",
            );
            builder.push_bind(g);
            builder.push(")");
        }

        builder.push(" GROUP BY t.id ORDER BY t.name");

        let rows = builder
            .build_query_as::<TitleRatingRow>()
            .fetch_all(&self.pool)
            .await?;
        self.assemble_titles(rows).await
    }

    async fn get_title(&self, id: i64) -> Result<Option<TitleRead>, ApiError> {
        let row = sqlx::query_as::<_, TitleRatingRow>(
            "SELECT t.id, t.name, t.year, t.description, t.category_id, \
                    AVG(r.score)::float8 AS rating \
             FROM titles t \
             LEFT JOIN reviews r ON r.title_id = t.id \
             WHERE t.id = $1 \
             GROUP BY t.id",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.assemble_titles(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn create_title(&self, req: TitleWrite) -> Result<TitleRead, ApiError> {
        let category_id = self.resolve_category_slug(&req.category).await?;
        let genre_ids = self.resolve_genre_slugs(&req.genre).await?;

        let mut tx = self.pool.begin().await?;

        let title_id: i64 = sqlx::query_scalar(
            "INSERT INTO titles (name, year, description, category_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&req.name)
        .bind(req.year)
        .bind(&req.description)
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await?;

        for genre_id in genre_ids {
            sqlx::query(
                "INSERT INTO title_genres (title_id, genre_id) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(title_id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_title(title_id)
            .await?
            .ok_or_else(|| ApiError::internal("freshly created title vanished"))
    }

    async fn update_title(&self, id: i64, req: TitlePatch) -> Result<Option<TitleRead>, ApiError> {
        let category_id = match &req.category {
            Some(slug) => Some(self.resolve_category_slug(slug).await?),
            None => None,
        };
        let genre_ids = match &req.genre {
            Some(slugs) => Some(self.resolve_genre_slugs(slugs).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE titles SET \
                name = COALESCE($2, name), \
                year = COALESCE($3, year), \
                description = COALESCE($4, description), \
                category_id = COALESCE($5, category_id) \
             WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(&req.name)
        .bind(req.year)
        .bind(&req.description)
        .bind(category_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(title_id) = updated else {
            return Ok(None);
        };

        // A provided genre list replaces the full set.
        if let Some(genre_ids) = genre_ids {
            sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
                .bind(title_id)
                .execute(&mut *tx)
                .await?;
            for genre_id in genre_ids {
                sqlx::query(
                    "INSERT INTO title_genres (title_id, genre_id) \
                     VALUES ($1, $2) ON CONFLICT DO NOTHING",
                )
                .bind(title_id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        self.get_title(title_id).await
    }

    async fn delete_title(&self, id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Feedback: reviews ---

    async fn list_reviews(&self, title_id: i64) -> Result<Vec<Review>, ApiError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.title_id = $1 ORDER BY r.pub_date"
        ))
        .bind(title_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn get_review(&self, title_id: i64, review_id: i64) -> Result<Option<Review>, ApiError> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.title_id = $1 AND r.id = $2"
        ))
        .bind(title_id)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    /// create_review
    ///
    /// Application-level duplicate pre-check plus the schema-level
    /// UNIQUE (title_id, author_id) constraint. The constraint closes the
    /// race between two concurrent submissions by the same author; a
    /// violation surfaces as the same validation message as the pre-check.
    async fn create_review(
        &self,
        title_id: i64,
        author_id: Uuid,
        text: String,
        score: i16,
    ) -> Result<Review, ApiError> {
        let already_reviewed: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE title_id = $1 AND author_id = $2)",
        )
        .bind(title_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        if already_reviewed {
            return Err(ApiError::validation(DUPLICATE_REVIEW_MSG));
        }

        let review = sqlx::query_as::<_, Review>(
            "WITH inserted AS ( \
                INSERT INTO reviews (title_id, author_id, text, score) \
                VALUES ($1, $2, $3, $4) \
                RETURNING id, title_id, author_id, text, score, pub_date \
             ) \
             SELECT i.id, i.title_id, i.author_id, u.username AS author, \
                    i.text, i.score, i.pub_date \
             FROM inserted i JOIN users u ON u.id = i.author_id",
        )
        .bind(title_id)
        .bind(author_id)
        .bind(&text)
        .bind(score)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ApiError::from_sqlx_with_conflict(e, DUPLICATE_REVIEW_MSG))?;
        Ok(review)
    }

    async fn update_review(
        &self,
        title_id: i64,
        review_id: i64,
        text: Option<String>,
        score: Option<i16>,
    ) -> Result<Option<Review>, ApiError> {
        let review = sqlx::query_as::<_, Review>(
            "WITH updated AS ( \
                UPDATE reviews SET \
                    text = COALESCE($3, text), \
                    score = COALESCE($4, score) \
                WHERE title_id = $1 AND id = $2 \
                RETURNING id, title_id, author_id, text, score, pub_date \
             ) \
             SELECT u2.id, u2.title_id, u2.author_id, u.username AS author, \
                    u2.text, u2.score, u2.pub_date \
             FROM updated u2 JOIN users u ON u.id = u2.author_id",
        )
        .bind(title_id)
        .bind(review_id)
        .bind(&text)
        .bind(score)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    async fn delete_review(&self, title_id: i64, review_id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM reviews WHERE title_id = $1 AND id = $2")
            .bind(title_id)
            .bind(review_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Feedback: comments ---

    async fn list_comments(&self, review_id: i64) -> Result<Vec<Comment>, ApiError> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.review_id = $1 ORDER BY c.pub_date"
        ))
        .bind(review_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn get_comment(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, ApiError> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.review_id = $1 AND c.id = $2"
        ))
        .bind(review_id)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn create_comment(
        &self,
        review_id: i64,
        author_id: Uuid,
        text: String,
    ) -> Result<Comment, ApiError> {
        let comment = sqlx::query_as::<_, Comment>(
            "WITH inserted AS ( \
                INSERT INTO comments (review_id, author_id, text) \
                VALUES ($1, $2, $3) \
                RETURNING id, review_id, author_id, text, pub_date \
             ) \
             SELECT i.id, i.review_id, i.author_id, u.username AS author, \
                    i.text, i.pub_date \
             FROM inserted i JOIN users u ON u.id = i.author_id",
        )
        .bind(review_id)
        .bind(author_id)
        .bind(&text)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn update_comment(
        &self,
        review_id: i64,
        comment_id: i64,
        text: String,
    ) -> Result<Option<Comment>, ApiError> {
        let comment = sqlx::query_as::<_, Comment>(
            "WITH updated AS ( \
                UPDATE comments SET text = $3 \
                WHERE review_id = $1 AND id = $2 \
                RETURNING id, review_id, author_id, text, pub_date \
             ) \
             SELECT u2.id, u2.review_id, u2.author_id, u.username AS author, \
                    u2.text, u2.pub_date \
             FROM updated u2 JOIN users u ON u.id = u2.author_id",
        )
        .bind(review_id)
        .bind(comment_id)
        .bind(&text)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn delete_comment(&self, review_id: i64, comment_id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM comments WHERE review_id = $1 AND id = $2")
            .bind(review_id)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
