//! Black-box helpers for exercising the palengke REST API in-process.
//!
//! Each [`TestApp`] owns a fresh SQLite database in a temp directory and
//! drives the real router through `tower::ServiceExt::oneshot`, so tests
//! cover routing, extraction, auth, and the store together.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use palengke_server::{router, AppState, Store};

/// Low bcrypt cost keeps the suites fast; the hashes are throwaway.
const TEST_BCRYPT_COST: u32 = 4;

pub struct TestApp {
    router: Router,
    pub store: Store,
    _dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("palengke.db");
        let store = Store::connect(db_path.to_str().expect("utf-8 temp path"))
            .await
            .expect("open test database");
        let state = AppState::new(store.clone(), "integration-test-secret", TEST_BCRYPT_COST);
        TestApp {
            router: router(state),
            store,
            _dir: dir,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router never fails");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response is JSON")
        };
        (status, value)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, path, token, Some(body)).await
    }

    pub async fn patch(
        &self,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(Method::PATCH, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, path, token, None).await
    }

    // ─── Account fixtures ────────────────────────────────────────────────

    /// Register a customer and return their token.
    pub async fn customer(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "full_name": "Test Customer",
                    "email": email,
                    "password": "secret1",
                    "confirm_password": "secret1",
                    "barangay": "San Isidro",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "customer register: {body}");
        body["token"].as_str().expect("token in response").to_owned()
    }

    /// Bootstrap the first admin and return their token.
    pub async fn first_admin(&self) -> String {
        let (status, body) = self
            .post(
                "/api/auth/create-first-admin",
                None,
                json!({
                    "full_name": "Root Admin",
                    "email": "admin@palengke.test",
                    "password": "adminsecret",
                    "confirm_password": "adminsecret",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "admin bootstrap: {body}");
        body["token"].as_str().expect("token in response").to_owned()
    }

    /// Register a customer, convert them to a farmer, and verify the farm
    /// with the given admin token. Returns (farmer token, farmer_id).
    pub async fn verified_farmer(&self, email: &str, admin_token: &str) -> (String, i64) {
        let token = self.customer(email).await;
        let (status, body) = self
            .post(
                "/api/auth/register-farmer",
                Some(&token),
                json!({ "farm_name": "Harvest Hill", "barangay": "San Roque" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "farmer register: {body}");
        let farmer_id = body["farmer"]["farmer_id"].as_i64().expect("farmer_id");
        let (status, body) = self
            .patch(
                &format!("/api/admin/farmers/{farmer_id}/verify"),
                Some(admin_token),
                json!({ "verified": true }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "farmer verify: {body}");
        // Re-login so the token carries the FARMER role.
        let (status, body) = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": email, "password": "secret1" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "farmer re-login: {body}");
        let token = body["token"].as_str().expect("token").to_owned();
        (token, farmer_id)
    }

    /// Create a product for a verified farmer; returns the product id.
    pub async fn product(&self, farmer_token: &str, name: &str, price: f64, quantity: i64) -> i64 {
        let (status, body) = self
            .post(
                "/api/products",
                Some(farmer_token),
                json!({
                    "product_name": name,
                    "category": "Vegetables",
                    "price": price,
                    "quantity": quantity,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create product: {body}");
        body["product"]["product_id"].as_i64().expect("product_id")
    }
}
