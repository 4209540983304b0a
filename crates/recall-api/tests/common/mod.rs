use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use recall_api::{config::SchedulerConfig, router, state::ApiState};
use recall_db::MemoryReviewStore;
use serde::Deserialize;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

/// Test state builder backed by the in-memory store
pub struct TestStateBuilder {
    config: SchedulerConfig,
    store: MemoryReviewStore,
}

impl TestStateBuilder {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::DEFAULT,
            store: MemoryReviewStore::new(),
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ApiState<MemoryReviewStore> {
        ApiState::new(self.store, self.config)
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to make requests to the test app
pub struct TestClient {
    router: Router,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Client over the full app (layers included) for `state`
    pub fn for_state(state: ApiState<MemoryReviewStore>) -> Self {
        Self::new(router::app(state))
    }

    /// Send a request and get the response
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse {
            status,
            body: body_bytes.to_vec(),
            headers,
        }
    }

    /// Send a GET request
    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.request(request).await
    }

    /// Send a DELETE request
    pub async fn delete(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.request(request).await
    }

    /// Send a POST request with JSON body
    pub async fn post_json<T: serde::Serialize>(&self, uri: &str, body: &T) -> TestResponse {
        let json_body = serde_json::to_string(body).expect("Failed to serialize body");

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json_body))
            .expect("Failed to build request");

        self.request(request).await
    }

    /// Assign a fresh item to `owner_id` and return its id
    pub async fn assign_item(&self, owner_id: Uuid, prompt: &str) -> Uuid {
        let item_id = Uuid::new_v4();
        let response = self
            .post_json(
                &format!("/v1/learners/{owner_id}/items"),
                &json!({
                    "item_id": item_id,
                    "prompt": prompt,
                    "answer": format!("answer to {prompt}"),
                    "hint": "think",
                    "tags": ["test"],
                }),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        item_id
    }

    /// Submit a review with the given quality
    pub async fn review(&self, owner_id: Uuid, item_id: Uuid, quality: i64) -> TestResponse {
        self.post_json(
            &format!("/v1/learners/{owner_id}/items/{item_id}/reviews"),
            &json!({
                "quality": quality,
                "response_time_seconds": 3.2,
                "hints_used": 0,
            }),
        )
        .await
    }
}

/// Test response wrapper
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub headers: axum::http::HeaderMap,
}

impl TestResponse {
    /// Get response body as string
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Response body is not valid UTF-8")
    }

    /// Parse response body as JSON
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Assert status code
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
    }

    /// Assert the JSON error code of an error response
    pub fn assert_error(&self, expected: StatusCode, code: &str) {
        self.assert_status(expected);
        let body: serde_json::Value = self.json();
        assert_eq!(body["error"], code, "Body: {}", self.text());
    }
}
