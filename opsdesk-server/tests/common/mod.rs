//! Shared harness: in-memory database with demo data, router driven via oneshot

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use opsdesk_server::{AppState, api, db, seed};
use serde_json::{Value, json};
use shared::util::now_millis;
use sqlx::SqlitePool;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret";

pub const MANAGER: &str = "management@example.com";
pub const SUPERVISOR: &str = "supervisor@example.com";
pub const OPERATOR_1: &str = "op1@example.com";
pub const OPERATOR_2: &str = "op2@example.com";

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    /// Fresh database seeded with the demo data set
    pub async fn seeded() -> Self {
        let pool = db::connect_in_memory().await.unwrap();
        seed::seed_demo_data(&pool, now_millis()).await.unwrap();
        let state = AppState::with_pool(pool.clone(), JWT_SECRET, 24);
        Self {
            app: api::build_app(state),
            pool,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request("PATCH", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request("DELETE", uri, Some(token), None).await
    }

    /// Log in a demo account and return its token
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": seed::DEMO_PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }

    /// User id of a demo account
    pub async fn user_id(&self, email: &str) -> i64 {
        db::users::find_by_email(&self.pool, email)
            .await
            .unwrap()
            .unwrap()
            .id
    }
}
