use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use revu::{
    AppConfig, AppState, create_router,
    error::ApiError,
    mailer::MockMailer,
    models::{
        Category, Comment, CreateCategoryRequest, Genre, Review, TitlePatch, TitleRead,
        TitleWrite, UpdateUserRequest, User, UserRole,
    },
    repository::{Repository, RepositoryState},
};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

// --- SEEDED MOCK REPOSITORY ---

// Router-level tests drive the whole stack (routing, middleware, extractors,
// handlers) against a repository seeded with a few fixed accounts. The
// x-user-id development bypass (active under the default Local config)
// stands in for a bearer token.
struct SeedRepo {
    users: Vec<User>,
}

const READER_ID: Uuid = Uuid::from_u128(1);
const ADMIN_ID: Uuid = Uuid::from_u128(2);

impl SeedRepo {
    fn new() -> Self {
        SeedRepo {
            users: vec![
                User {
                    id: READER_ID,
                    username: "reader".to_string(),
                    email: "reader@example.com".to_string(),
                    email_confirmed: true,
                    ..User::default()
                },
                User {
                    id: ADMIN_ID,
                    username: "boss".to_string(),
                    email: "boss@example.com".to_string(),
                    role: UserRole::Admin,
                    email_confirmed: true,
                    ..User::default()
                },
            ],
        }
    }
}

#[async_trait]
impl Repository for SeedRepo {
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self.users.iter().find(|u| u.email == email).cloned())
    }
    async fn list_users(&self, _search: Option<String>) -> Result<Vec<User>, ApiError> {
        Ok(self.users.clone())
    }
    async fn create_user(&self, user: User) -> Result<User, ApiError> {
        Ok(user)
    }
    async fn update_user(
        &self,
        id: Uuid,
        _req: UpdateUserRequest,
    ) -> Result<Option<User>, ApiError> {
        self.get_user_by_id(id).await
    }
    async fn set_confirmation_hash(&self, _id: Uuid, _code_hash: &str) -> Result<(), ApiError> {
        Ok(())
    }
    async fn confirm_user(&self, _id: Uuid) -> Result<(), ApiError> {
        Ok(())
    }
    async fn delete_user(&self, _username: &str) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn list_categories(&self, _search: Option<String>) -> Result<Vec<Category>, ApiError> {
        Ok(vec![])
    }
    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, ApiError> {
        Ok(Category {
            id: 1,
            name: req.name,
            slug: req.slug,
        })
    }
    async fn delete_category(&self, _slug: &str) -> Result<bool, ApiError> {
        Ok(true)
    }
    async fn list_genres(&self, _search: Option<String>) -> Result<Vec<Genre>, ApiError> {
        Ok(vec![])
    }
    async fn create_genre(&self, req: CreateCategoryRequest) -> Result<Genre, ApiError> {
        Ok(Genre {
            id: 1,
            name: req.name,
            slug: req.slug,
        })
    }
    async fn delete_genre(&self, _slug: &str) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn list_titles(
        &self,
        _name: Option<String>,
        _category: Option<String>,
        _genre: Option<String>,
        _year: Option<i32>,
    ) -> Result<Vec<TitleRead>, ApiError> {
        Ok(vec![])
    }
    async fn get_title(&self, _id: i64) -> Result<Option<TitleRead>, ApiError> {
        Ok(None)
    }
    async fn create_title(&self, req: TitleWrite) -> Result<TitleRead, ApiError> {
        Ok(TitleRead {
            id: 1,
            name: req.name,
            year: req.year,
            ..TitleRead::default()
        })
    }
    async fn update_title(
        &self,
        _id: i64,
        _req: TitlePatch,
    ) -> Result<Option<TitleRead>, ApiError> {
        Ok(None)
    }
    async fn delete_title(&self, _id: i64) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn list_reviews(&self, _title_id: i64) -> Result<Vec<Review>, ApiError> {
        Ok(vec![])
    }
    async fn get_review(
        &self,
        _title_id: i64,
        _review_id: i64,
    ) -> Result<Option<Review>, ApiError> {
        Ok(None)
    }
    async fn create_review(
        &self,
        title_id: i64,
        author_id: Uuid,
        text: String,
        score: i16,
    ) -> Result<Review, ApiError> {
        Ok(Review {
            id: 1,
            title_id,
            author_id,
            text,
            score,
            ..Review::default()
        })
    }
    async fn update_review(
        &self,
        _title_id: i64,
        _review_id: i64,
        _text: Option<String>,
        _score: Option<i16>,
    ) -> Result<Option<Review>, ApiError> {
        Ok(None)
    }
    async fn delete_review(&self, _title_id: i64, _review_id: i64) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn list_comments(&self, _review_id: i64) -> Result<Vec<Comment>, ApiError> {
        Ok(vec![])
    }
    async fn get_comment(
        &self,
        _review_id: i64,
        _comment_id: i64,
    ) -> Result<Option<Comment>, ApiError> {
        Ok(None)
    }
    async fn create_comment(
        &self,
        review_id: i64,
        author_id: Uuid,
        text: String,
    ) -> Result<Comment, ApiError> {
        Ok(Comment {
            id: 1,
            review_id,
            author_id,
            text,
            ..Comment::default()
        })
    }
    async fn update_comment(
        &self,
        _review_id: i64,
        _comment_id: i64,
        _text: String,
    ) -> Result<Option<Comment>, ApiError> {
        Ok(None)
    }
    async fn delete_comment(&self, _review_id: i64, _comment_id: i64) -> Result<bool, ApiError> {
        Ok(true)
    }
}

// --- TEST UTILITIES ---

fn test_router() -> axum::Router {
    let state = AppState {
        repo: Arc::new(SeedRepo::new()) as RepositoryState,
        mailer: Arc::new(MockMailer::new()),
        config: AppConfig::default(),
    };
    create_router(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

// --- TESTS ---

#[tokio::test]
async fn test_health_check() {
    let response = test_router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signup_round_trip() {
    let request = json_request(
        "POST",
        "/auth/signup",
        serde_json::json!({ "username": "newcomer", "email": "newcomer@example.com" }),
    );
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let echoed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(echoed["username"], "newcomer");
}

#[tokio::test]
async fn test_signup_reserved_username_is_bad_request() {
    let request = json_request(
        "POST",
        "/auth/signup",
        serde_json::json!({ "username": "me", "email": "me@example.com" }),
    );
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_reads_are_public() {
    for uri in ["/categories", "/genres", "/titles"] {
        let response = test_router()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri} should be open");
    }
}

#[tokio::test]
async fn test_catalog_write_without_credentials_is_unauthorized() {
    let request = json_request(
        "POST",
        "/categories",
        serde_json::json!({ "name": "Films", "slug": "films" }),
    );
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_catalog_write_as_plain_user_is_forbidden() {
    let mut request = json_request(
        "POST",
        "/categories",
        serde_json::json!({ "name": "Films", "slug": "films" }),
    );
    request
        .headers_mut()
        .insert("x-user-id", READER_ID.to_string().parse().unwrap());

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_catalog_write_as_admin_is_created() {
    let mut request = json_request(
        "POST",
        "/categories",
        serde_json::json!({ "name": "Films", "slug": "films" }),
    );
    request
        .headers_mut()
        .insert("x-user-id", ADMIN_ID.to_string().parse().unwrap());

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_users_me_requires_authentication() {
    let response = test_router()
        .oneshot(Request::get("/users/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_users_me_with_bypass_header() {
    let mut request = Request::get("/users/me").body(Body::empty()).unwrap();
    request
        .headers_mut()
        .insert("x-user-id", READER_ID.to_string().parse().unwrap());

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let profile: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(profile["username"], "reader");
}

#[tokio::test]
async fn test_user_directory_forbidden_for_plain_user() {
    let mut request = Request::get("/users").body(Body::empty()).unwrap();
    request
        .headers_mut()
        .insert("x-user-id", READER_ID.to_string().parse().unwrap());

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_title_is_not_found() {
    let response = test_router()
        .oneshot(Request::get("/titles/9999").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_error_body_shape_on_validation_failure() {
    let request = json_request(
        "POST",
        "/auth/token",
        serde_json::json!({ "username": "reader", "confirmation_code": "short" }),
    );
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "VALIDATION");
    assert!(body["message"].as_str().unwrap().contains("32"));
}
