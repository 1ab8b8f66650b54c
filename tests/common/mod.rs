#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use studio_timeline::domain::catalog::{Resource, SportswearBrand};
use studio_timeline::domain::user::Identity;
use studio_timeline::infra::storage::MemoryMediaStore;
use studio_timeline::store::{Catalog, MemoryStore};
use studio_timeline::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// Test-only key, 32 bytes.
const TEST_PASETO_ACCESS_KEY: [u8; 32] = *b"0123456789abcdef0123456789abcdef";
pub const TEST_IMAGE_MAX_BYTES: usize = 64 * 1024;
pub const TEST_BODY_LIMIT_BYTES: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// TestApp: one isolated in-memory instance per test
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub media: Arc<MemoryMediaStore>,
    pub catalog: Arc<SwitchableCatalog>,
    next_user_id: AtomicI64,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["message"].as_str().unwrap_or("").to_string()
    }
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub access_token: String,
}

// ---------------------------------------------------------------------------
// Catalog that can be switched into a failing state mid-test
// ---------------------------------------------------------------------------

pub struct SwitchableCatalog {
    store: Arc<MemoryStore>,
    failing: AtomicBool,
}

impl SwitchableCatalog {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("catalog unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for SwitchableCatalog {
    async fn find_resource(&self, resource_id: i64) -> anyhow::Result<Option<Resource>> {
        self.check()?;
        self.store.find_resource(resource_id).await
    }

    async fn find_sportswear(&self, brand_id: i64) -> anyhow::Result<Option<SportswearBrand>> {
        self.check()?;
        self.store.find_sportswear(brand_id).await
    }
}

pub fn app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let media = Arc::new(MemoryMediaStore::new());
    let catalog = Arc::new(SwitchableCatalog {
        store: store.clone(),
        failing: AtomicBool::new(false),
    });

    let state = AppState {
        store: store.clone(),
        users: store.clone(),
        catalog: catalog.clone(),
        media: media.clone(),
        paseto_access_key: TEST_PASETO_ACCESS_KEY,
        access_ttl_minutes: 15,
        image_max_bytes: TEST_IMAGE_MAX_BYTES,
        request_body_limit_bytes: TEST_BODY_LIMIT_BYTES,
    };

    TestApp {
        router: studio_timeline::http::router(state.clone()),
        state,
        store,
        media,
        catalog,
        next_user_id: AtomicI64::new(1),
    }
}

impl TestApp {
    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for &(key, value) in headers {
            builder = builder.header(key, value);
        }

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::GET, path, None, &headers).await
    }

    pub async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::POST, path, Some(body), &headers).await
    }

    /// POST without a body (like, delete).
    pub async fn post_empty(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::POST, path, None, &headers).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    pub async fn create_user(&self, username: &str) -> TestUser {
        self.create_identity(username, false, false).await
    }

    pub async fn create_staff_user(&self, username: &str) -> TestUser {
        self.create_identity(username, true, false).await
    }

    pub async fn create_superuser(&self, username: &str) -> TestUser {
        self.create_identity(username, false, true).await
    }

    async fn create_identity(&self, username: &str, is_staff: bool, is_superuser: bool) -> TestUser {
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        self.store
            .insert_user(Identity {
                id,
                username: username.to_string(),
                is_staff,
                is_superuser,
            })
            .await;

        let token = self
            .state
            .auth_service()
            .issue_access_token(id)
            .expect("issue_access_token failed");

        TestUser {
            id,
            username: username.to_string(),
            access_token: token.token,
        }
    }

    pub async fn create_resource(&self, id: i64, title: &str, youtube_url: &str) {
        self.store
            .insert_resource(Resource {
                id,
                title: title.to_string(),
                youtube_url: youtube_url.to_string(),
                thumbnail_url: None,
            })
            .await;
    }

    pub async fn create_sportswear(&self, id: i64, brand_name: &str, link: &str, logo: &str) {
        self.store
            .insert_sportswear(SportswearBrand {
                id,
                brand_name: brand_name.to_string(),
                link: link.to_string(),
                thumbnail_url: Some(logo.to_string()),
            })
            .await;
    }

    /// Creates a post through the API and returns its id.
    pub async fn create_post(&self, user: &TestUser, text: &str) -> i64 {
        let resp = self
            .post_json(
                "/timeline/api/create_post/",
                serde_json::json!({ "text": text }),
                Some(&user.access_token),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "create_post failed: {:?}", resp.json());
        resp.json()["data"]["id"].as_i64().expect("post id")
    }

    /// Adds a comment through the API and returns its id.
    pub async fn create_comment(&self, user: &TestUser, post_id: i64, content: &str) -> i64 {
        let resp = self
            .post_json(
                &format!("/timeline/api/post/{}/comment/", post_id),
                serde_json::json!({ "content": content }),
                Some(&user.access_token),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "add_comment failed: {:?}", resp.json());
        resp.json()["data"]["id"].as_i64().expect("comment id")
    }

    /// Fetches one feed page as JSON.
    pub async fn feed(&self, page: Option<&str>, token: Option<&str>) -> Value {
        let path = match page {
            Some(page) => format!("/timeline/api/timeline/?page={}", page),
            None => "/timeline/api/timeline/".to_string(),
        };
        let resp = self.get(&path, token).await;
        assert_eq!(resp.status, StatusCode::OK);
        resp.json()
    }

    pub async fn feed_item(&self, post_id: i64, token: Option<&str>) -> Option<Value> {
        let resp = self
            .get(&format!("/timeline/api/post/{}/", post_id), token)
            .await;
        (resp.status == StatusCode::OK).then(|| resp.json())
    }
}
